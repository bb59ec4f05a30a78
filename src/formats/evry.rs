//! The Evry note format.
//!
//! A note file holds up to three sections separated by `------`: common
//! metadata, type-specific fields and the free-text body.
//!
//! ```text
//! type=todo
//! created=2023-01-01T10:00:00
//! title=Buy groceries
//! tags=shopping,urgent
//! ------
//! priority[high]
//! reminder[60]
//! ------
//! Milk
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use super::{
    NoteSerialization,
    fields::{self, FieldMap},
};
use crate::{
    error::{ParseError, ParseResult},
    models::{
        CommonFields, Coordinates, EditableLocationFields, EditableNote, EditableTodoFields,
        LocationFields, Note, NoteType, TodoFields, TypeFields, note_id,
    },
};

pub const SECTION_DELIMITER: &str = "------";
pub const FILE_EXTENSION: &str = "evry";

const UNTITLED: &str = "untitled";
const MAX_SLUG_SOURCE_CHARS: usize = 50;

static SLUG_DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s_-]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct EvryFormat;

#[derive(Debug, Default)]
struct Sections<'a> {
    common: &'a str,
    type_fields: &'a str,
    content: &'a str,
}

impl<'a> Sections<'a> {
    /// Two delimiters at most are significant; later ones stay in the content.
    fn split(text: &'a str) -> Self {
        let mut parts = text.splitn(3, SECTION_DELIMITER);
        let common = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (None, _) => Self {
                common,
                ..Self::default()
            },
            (Some(content), None) => Self {
                common,
                type_fields: "",
                content,
            },
            (Some(type_fields), Some(content)) => Self {
                common,
                type_fields,
                content,
            },
        }
    }
}

impl EvryFormat {
    /// Decode a note file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Failed`] naming `file_path` when `type` or
    /// `created` is missing.
    pub fn parse_note(&self, content: &str, file_path: &str) -> ParseResult<Note> {
        Self::decode(content, file_path).map_err(|cause| ParseError::failed(file_path, cause))
    }

    fn decode(content: &str, file_path: &str) -> ParseResult<Note> {
        let sections = Sections::split(content);
        let common = parse_common_fields(&fields::parse_fields(sections.common))?;
        let type_map = fields::parse_fields(sections.type_fields);

        let type_fields = match common.note_type {
            NoteType::Text => TypeFields::Text,
            NoteType::Todo => TypeFields::Todo {
                fields: parse_todo_fields(&type_map),
            },
            NoteType::Location => TypeFields::Location {
                fields: parse_location_fields(&type_map),
            },
        };

        Ok(Note {
            id: note_id(file_path),
            common,
            content: sections.content.trim().to_string(),
            file_path: file_path.to_string(),
            type_fields,
        })
    }

    /// Encode a note into the three-section text form
    #[must_use]
    pub fn serialize_note(&self, note: &EditableNote) -> String {
        let common = common_section(note);
        let type_section = match note.note_type {
            NoteType::Text => String::new(),
            NoteType::Todo => todo_section(&note.todo_fields),
            NoteType::Location => location_section(&note.location_fields),
        };

        let capacity = common.len() + type_section.len() + note.content.len() + 16;
        let mut out = String::with_capacity(capacity);
        out.push_str(common.trim());
        out.push('\n');
        out.push_str(SECTION_DELIMITER);
        out.push('\n');
        if !type_section.trim().is_empty() {
            out.push_str(type_section.trim());
            out.push('\n');
        }
        out.push_str(SECTION_DELIMITER);
        out.push('\n');
        out.push_str(&note.content);
        out
    }
}

impl NoteSerialization for EvryFormat {
    fn parse(&self, content: &str, file_path: &str) -> ParseResult<Note> {
        self.parse_note(content, file_path)
    }

    fn serialize(&self, note: &EditableNote) -> String {
        self.serialize_note(note)
    }
}

fn non_blank(map: &FieldMap, name: &str) -> Option<String> {
    map.get(name)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

fn parse_common_fields(map: &FieldMap) -> ParseResult<CommonFields> {
    let note_type = map
        .get("type")
        .map(|value| NoteType::from_tag(value))
        .ok_or_else(|| ParseError::missing_field("type"))?;
    let created = map
        .get("created")
        .cloned()
        .ok_or_else(|| ParseError::missing_field("created"))?;

    Ok(CommonFields {
        note_type,
        created,
        edited: non_blank(map, "edited"),
        tags: map.get("tags").map(|raw| parse_tags(raw)).unwrap_or_default(),
        title: non_blank(map, "title"),
        archived: map
            .get("archived")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true")),
    })
}

/// Comma-separated tags, trimmed, empty pieces dropped
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// `"lat,lon"` into coordinates; anything else is `None`
#[must_use]
pub fn parse_coordinates(raw: &str) -> Option<Coordinates> {
    let mut parts = raw.split(',').map(str::trim);
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let latitude = lat.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let longitude = lon.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}

fn parse_todo_fields(map: &FieldMap) -> TodoFields {
    TodoFields {
        priority: non_blank(map, "priority"),
        due: non_blank(map, "due"),
        reminder: map.get("reminder").and_then(|v| v.trim().parse().ok()),
    }
}

fn parse_location_fields(map: &FieldMap) -> LocationFields {
    LocationFields {
        coordinates: map.get("coordinates").and_then(|v| parse_coordinates(v)),
        address: non_blank(map, "address"),
        phone: non_blank(map, "phone"),
        website: non_blank(map, "website"),
        rating: non_blank(map, "rating"),
        cuisine: non_blank(map, "cuisine"),
        price_range: non_blank(map, "price_range"),
        hours: non_blank(map, "hours"),
    }
}

fn push_line(section: &mut String, line: &str) {
    section.push_str(line);
    section.push('\n');
}

fn push_bracket(section: &mut String, name: &str, value: &str) {
    if !value.trim().is_empty() {
        push_line(section, &fields::bracket_field(name, value));
    }
}

fn common_section(note: &EditableNote) -> String {
    let mut section = String::new();
    push_line(&mut section, &fields::equals_field("type", note.note_type.tag()));
    push_line(&mut section, &fields::equals_field("created", &note.created));
    if !note.edited.trim().is_empty() {
        push_line(&mut section, &fields::equals_field("edited", &note.edited));
    }
    let tags: Vec<&str> = note
        .tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect();
    if !tags.is_empty() {
        push_line(&mut section, &fields::equals_field("tags", &tags.join(",")));
    }
    if !note.title.trim().is_empty() {
        push_line(&mut section, &fields::equals_field("title", &note.title));
    }
    if note.archived {
        push_line(&mut section, "archived=true");
    }
    section
}

fn todo_section(todo: &EditableTodoFields) -> String {
    let mut section = String::new();
    push_bracket(&mut section, "priority", &todo.priority);
    push_bracket(&mut section, "due", &todo.due);
    if let Some(reminder) = todo.reminder {
        push_bracket(&mut section, "reminder", &reminder.to_string());
    }
    section
}

fn location_section(location: &EditableLocationFields) -> String {
    let mut section = String::new();
    push_bracket(&mut section, "coordinates", &location.coordinates);
    push_bracket(&mut section, "address", &location.address);
    push_bracket(&mut section, "phone", &location.phone);
    push_bracket(&mut section, "website", &location.website);
    push_bracket(&mut section, "rating", &location.rating);
    push_bracket(&mut section, "cuisine", &location.cuisine);
    push_bracket(&mut section, "price_range", &location.price_range);
    push_bracket(&mut section, "hours", &location.hours);
    section
}

/// Current UTC time as stored in `created`/`edited`
#[must_use]
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// File-name-safe slug of a title, or `""` if nothing usable remains
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let head: String = title.chars().take(MAX_SLUG_SOURCE_CHARS).collect();
    let kept = SLUG_DISALLOWED_RE.replace_all(&head, "");
    WHITESPACE_RE
        .replace_all(&kept, "_")
        .trim_matches('_')
        .to_string()
}

/// `<YYYY-MM-DDTHH-MM-SS>_<slug>.evry`, with `untitled` for an empty slug
#[must_use]
pub fn note_file_name(title: &str, now: DateTime<Utc>) -> String {
    note_file_name_with_suffix(title, now, None)
}

/// Like [`note_file_name`] with `_<n>` appended to the slug
#[must_use]
pub fn note_file_name_with_suffix(title: &str, now: DateTime<Utc>, suffix: Option<u32>) -> String {
    let stamp = now.format("%Y-%m-%dT%H-%M-%S");
    let slug = sanitize_title(title);
    let slug = if slug.is_empty() { UNTITLED } else { slug.as_str() };
    match suffix {
        Some(n) => format!("{stamp}_{slug}_{n}.{FILE_EXTENSION}"),
        None => format!("{stamp}_{slug}.{FILE_EXTENSION}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const PATH: &str = "/test/path/note.evry";

    fn parse(content: &str) -> ParseResult<Note> {
        EvryFormat.parse_note(content, PATH)
    }

    /// Parse, serialize and parse again, returning both decodes
    fn round_trip(content: &str) -> (Note, Note) {
        let first = parse(content).unwrap();
        let text = EvryFormat.serialize_note(&EditableNote::from(&first));
        let second = parse(&text).unwrap();
        (first, second)
    }

    #[test]
    fn test_basic_text_note() {
        let note = parse(
            "type=note\ncreated=2023-01-01T10:00:00\ntitle=My Test Note\ntags=important,work\n------\n------\nThis is the content.\nSecond line.\n",
        )
        .unwrap();

        assert!(note.is_text());
        assert_eq!(note.note_type(), NoteType::Text);
        assert_eq!(note.common.created, "2023-01-01T10:00:00");
        assert_eq!(note.common.title.as_deref(), Some("My Test Note"));
        assert_eq!(note.common.tags, vec!["important", "work"]);
        assert_eq!(note.content, "This is the content.\nSecond line.");
        assert_eq!(note.file_path, PATH);
        assert_eq!(note.id, note_id(PATH));
        assert!(!note.is_archived());
    }

    #[test]
    fn test_todo_note() {
        let note = parse(
            "type=todo\ncreated=2023-01-01T10:00:00\nedited=2023-01-02T11:00:00\ntitle=Buy groceries\n------\npriority[high]\ndue[2023-01-03]\nreminder[60]\n------\nMilk\nBread\nEggs",
        )
        .unwrap();

        assert_eq!(note.common.edited.as_deref(), Some("2023-01-02T11:00:00"));
        let todo = note.as_todo().unwrap();
        assert_eq!(todo.priority.as_deref(), Some("high"));
        assert_eq!(todo.due.as_deref(), Some("2023-01-03"));
        assert_eq!(todo.reminder, Some(60));
        assert_eq!(note.content, "Milk\nBread\nEggs");
    }

    #[test]
    fn test_unparsable_reminder_is_none() {
        let note = parse("type=todo\ncreated=x\n------\nreminder[abc]\n------\n").unwrap();
        assert_eq!(note.as_todo().unwrap().reminder, None);
    }

    #[test]
    fn test_location_note() {
        let note = parse(
            "type=location\ncreated=2023-01-01T10:00:00\ntitle=Favorite Restaurant\n------\ncoordinates[40.7128,-74.0060]\naddress[123 Main St, New York, NY 10001]\nphone[(555) 123-4567]\nwebsite[https://restaurant.com]\nrating[4.5]\ncuisine[Italian]\nprice_range[$$]\nhours[Mon-Fri: 11am-10pm]\n------\nGreat pasta and service!",
        )
        .unwrap();

        let place = note.as_location().unwrap();
        assert_eq!(
            place.coordinates,
            Some(Coordinates {
                latitude: 40.7128,
                longitude: -74.0060
            })
        );
        assert_eq!(place.address.as_deref(), Some("123 Main St, New York, NY 10001"));
        assert_eq!(place.phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(place.website.as_deref(), Some("https://restaurant.com"));
        assert_eq!(place.rating.as_deref(), Some("4.5"));
        assert_eq!(place.cuisine.as_deref(), Some("Italian"));
        assert_eq!(place.price_range.as_deref(), Some("$$"));
        assert_eq!(place.hours.as_deref(), Some("Mon-Fri: 11am-10pm"));
        assert_eq!(note.content, "Great pasta and service!");
    }

    #[test]
    fn test_invalid_coordinates_do_not_fail_the_parse() {
        let note = parse(
            "type=location\ncreated=x\n------\ncoordinates[invalid]\naddress[123 Main St]\n------\nLocation content",
        )
        .unwrap();
        let place = note.as_location().unwrap();
        assert_eq!(place.coordinates, None);
        assert_eq!(place.address.as_deref(), Some("123 Main St"));
    }

    #[test]
    fn test_coordinates_parsing() {
        assert_eq!(
            parse_coordinates(" 51.5 , -0.12 "),
            Some(Coordinates {
                latitude: 51.5,
                longitude: -0.12
            })
        );
        assert_eq!(parse_coordinates(""), None);
        assert_eq!(parse_coordinates("1,2,3"), None);
        assert_eq!(parse_coordinates("1"), None);
        assert_eq!(parse_coordinates("north,2"), None);
        assert_eq!(parse_coordinates("NaN,2"), None);
    }

    #[test]
    fn test_tags_are_split_and_trimmed() {
        let note = parse("type=note\ncreated=x\ntags=a, b\n").unwrap();
        assert_eq!(note.common.tags, vec!["a", "b"]);

        let untagged = parse("type=note\ncreated=x\n").unwrap();
        assert!(untagged.common.tags.is_empty());

        let empty = parse("type=note\ncreated=x\ntags=\n").unwrap();
        assert!(empty.common.tags.is_empty());
        assert_eq!(parse_tags("Work, work ,,x"), vec!["Work", "work", "x"]);
    }

    #[test]
    fn test_missing_type_fails() {
        let err = parse(
            "created=2023-01-01T10:00:00\ntitle=Test Note\n------\n------\nContent",
        )
        .unwrap_err();
        assert_eq!(err.missing_field_name(), Some("type"));
        assert_eq!(err.path(), Some(PATH));
    }

    #[test]
    fn test_missing_created_fails() {
        let err = parse("type=note\ntitle=Test Note\n------\n------\nContent").unwrap_err();
        assert_eq!(err.missing_field_name(), Some("created"));
    }

    #[test]
    fn test_unknown_type_parses_as_text() {
        let note = parse("type=journal\ncreated=x\n------\npriority[high]\n------\nbody").unwrap();
        assert!(note.is_text());
    }

    #[test]
    fn test_archived_flag() {
        assert!(parse("type=note\ncreated=x\narchived=TRUE").unwrap().is_archived());
        assert!(!parse("type=note\ncreated=x\narchived=yes").unwrap().is_archived());
        assert!(!parse("type=note\ncreated=x").unwrap().is_archived());
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        let note = parse(
            "type=note\ncreated=x\n%%% garbage %%%\ntitle=Test\n------\n------\nContent",
        )
        .unwrap();
        assert_eq!(note.common.title.as_deref(), Some("Test"));
    }

    #[test]
    fn test_section_counts() {
        let single = parse("type=note\ncreated=x\n").unwrap();
        assert_eq!(single.content, "");

        let two = parse("type=todo\ncreated=x\n------\nContent").unwrap();
        assert_eq!(two.content, "Content");
        assert_eq!(two.as_todo(), Some(&TodoFields::default()));

        let three = parse("type=todo\ncreated=x\n------\npriority[low]\n------\nContent").unwrap();
        assert_eq!(three.as_todo().unwrap().priority.as_deref(), Some("low"));
        assert_eq!(three.content, "Content");
    }

    #[test]
    fn test_extra_delimiters_stay_in_content() {
        let note = parse(
            "type=note\ncreated=x\n------\ntype_section\n------\ncontent\n------\nextra",
        )
        .unwrap();
        assert_eq!(note.content, "content\n------\nextra");
    }

    #[test]
    fn test_serialize_minimal_text_note() {
        let mut note = EditableNote::new(NoteType::Text);
        note.created = "2023-01-01T10:00:00".into();
        note.content = "Simple note".into();

        assert_eq!(
            EvryFormat.serialize_note(&note),
            "type=note\ncreated=2023-01-01T10:00:00\n------\n------\nSimple note"
        );
    }

    #[test]
    fn test_serialize_full_todo_note() {
        let mut note = EditableNote::new(NoteType::Todo);
        note.created = "c".into();
        note.edited = "e".into();
        note.tags = vec!["shopping".into(), " ".into(), "urgent".into()];
        note.title = "Buy groceries".into();
        note.archived = true;
        note.content = "Milk\n".into();
        note.todo_fields.priority = "high".into();
        note.todo_fields.reminder = Some(15);

        assert_eq!(
            EvryFormat.serialize_note(&note),
            "type=todo\ncreated=c\nedited=e\ntags=shopping,urgent\ntitle=Buy groceries\narchived=true\n------\npriority[high]\nreminder[15]\n------\nMilk\n"
        );
    }

    #[test]
    fn test_serialize_keeps_value_whitespace() {
        let note = parse("type=todo\ncreated= c\ntitle= Hello\n------\npriority[ high ]\n------\n")
            .unwrap();
        let text = EvryFormat.serialize_note(&EditableNote::from(&note));

        assert!(text.contains("title= Hello\n"));
        assert!(text.contains("priority[ high ]\n"));
    }

    #[test]
    fn test_delimiter_text_in_values_keeps_file_parseable() {
        let mut note = EditableNote::new(NoteType::Location);
        note.created = "c".into();
        note.title = "Q3 ------ plan".into();
        note.content = "body".into();
        note.location_fields.hours = "9am--------5pm".into();

        let parsed = parse(&EvryFormat.serialize_note(&note)).unwrap();
        assert_eq!(parsed.title(), "Q3 ----- plan");
        assert_eq!(parsed.content, "body");
        assert_eq!(
            parsed.as_location().unwrap().hours.as_deref(),
            Some("9am-----5pm")
        );
    }

    #[test]
    fn test_serialize_ignores_fields_of_other_kinds() {
        let mut note = EditableNote::new(NoteType::Text);
        note.created = "c".into();
        note.todo_fields.priority = "high".into();
        assert!(!EvryFormat.serialize_note(&note).contains("priority"));
    }

    #[test]
    fn test_round_trip_each_kind() {
        let inputs = [
            "title=Plain\ntype=note\ncreated=c\ntags=a, b\n------\n------\n  body text  \n",
            "type=todo\ncreated=c\nedited=e\ntitle=List\narchived=true\n------\ndue[tomorrow]\nreminder[5]\n------\n- one\n- two",
            "type=location\ncreated=c\n------\ncoordinates[40.7128, -74.0060]\ncuisine[Thai]\nprice_range[$]\n------\nnice",
            "type=note\ncreated=c\n------\n------\nbefore\n------\nafter",
            "type=todo\ncreated= c\ntitle= Hello\n------\npriority[ high ]\n------\nbody",
            "type=location\ncreated=c\n------\naddress[  Unit 4 ,  High St ]\n------\n",
        ];
        for input in inputs {
            let (first, second) = round_trip(input);
            assert_eq!(first, second, "round trip changed {input:?}");
        }
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("My Note: Draft #1!"), "My_Note_Draft_1");
        assert_eq!(sanitize_title("  __padded__  "), "padded");
        assert_eq!(sanitize_title("???"), "");
        assert_eq!(sanitize_title(&"a".repeat(80)).len(), 50);
    }

    #[test]
    fn test_note_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            note_file_name("Weekly plan", now),
            "2024-03-09T14-05-07_Weekly_plan.evry"
        );
        assert_eq!(note_file_name("!!!", now), "2024-03-09T14-05-07_untitled.evry");
        assert_eq!(
            note_file_name_with_suffix("Weekly plan", now, Some(2)),
            "2024-03-09T14-05-07_Weekly_plan_2.evry"
        );
    }

    #[test]
    fn test_timestamp_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(timestamp(now), "2024-03-09T14:05:07.000Z");
    }
}
