//! Line-oriented `key=value` / `key[value]` field sections

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

/// Field name to raw value, last occurrence wins
pub type FieldMap = HashMap<String, String>;

static FIELD_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(?:\[(.*)\]|=(.*))?$").unwrap());
/// Six or more hyphens would be read back as a section break
static DELIMITER_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{6,}").unwrap());

/// Parse one section into a field map.
///
/// Blank lines and lines that are not a field are skipped.
#[must_use]
pub fn parse_fields(section: &str) -> FieldMap {
    section.lines().filter_map(parse_field_line).collect()
}

/// Parse a single line. A bare name yields an empty value.
#[must_use]
pub fn parse_field_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let caps = FIELD_LINE_RE.captures(trimmed)?;
    let name = caps.get(1)?.as_str();
    let value = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map_or("", |m| m.as_str());

    Some((name.to_string(), value.to_string()))
}

/// `name=value`
#[must_use]
pub fn equals_field(name: &str, value: &str) -> String {
    format!("{name}={}", single_line(value))
}

/// `name[value]`
#[must_use]
pub fn bracket_field(name: &str, value: &str) -> String {
    format!("{name}[{}]", single_line(value))
}

/// Line breaks become spaces and hyphen runs are cut to five, so the value
/// reads back as one field of one section
fn single_line(value: &str) -> String {
    let flat: String = value
        .chars()
        .map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c })
        .collect();
    DELIMITER_RUN_RE.replace_all(&flat, "-----").into_owned()
}
