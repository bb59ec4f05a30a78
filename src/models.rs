use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// The three note kinds, each stored under a short tag in the `type` field
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum,
)]
pub enum NoteType {
    #[default]
    Text,
    Todo,
    Location,
}

impl NoteType {
    pub const ALL: [Self; 3] = [Self::Text, Self::Todo, Self::Location];

    /// Tag written to the `type` field
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Text => "note",
            Self::Todo => "todo",
            Self::Location => "location",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Todo => "List",
            Self::Location => "Map",
        }
    }

    /// Case-insensitive tag lookup; unknown tags fall back to [`NoteType::Text`]
    #[must_use]
    pub fn from_tag(value: &str) -> Self {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Metadata shared by every note kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct CommonFields {
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub created: String,
    pub edited: Option<String>,
    pub tags: Vec<String>,
    pub title: Option<String>,
    pub archived: bool,
}

impl CommonFields {
    #[must_use]
    pub fn new(note_type: NoteType, created: impl Into<String>) -> Self {
        Self {
            note_type,
            created: created.into(),
            edited: None,
            tags: Vec::new(),
            title: None,
            archived: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct TodoFields {
    pub priority: Option<String>,
    pub due: Option<String>,
    pub reminder: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct LocationFields {
    pub coordinates: Option<Coordinates>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<String>,
    pub cuisine: Option<String>,
    pub price_range: Option<String>,
    pub hours: Option<String>,
}

/// Variant-specific payload. The variant always agrees with
/// [`CommonFields::note_type`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Enum)]
pub enum TypeFields {
    Text,
    Todo { fields: TodoFields },
    Location { fields: LocationFields },
}

impl TypeFields {
    #[must_use]
    pub const fn note_type(&self) -> NoteType {
        match self {
            Self::Text => NoteType::Text,
            Self::Todo { .. } => NoteType::Todo,
            Self::Location { .. } => NoteType::Location,
        }
    }
}

/// One persisted note, decoded from one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Note {
    /// Derived from `file_path`; only meant as a UI key
    pub id: String,
    pub common: CommonFields,
    pub content: String,
    pub file_path: String,
    pub type_fields: TypeFields,
}

/// Deterministic note id for a file path.
///
/// Distinct paths may in principle collide, so ids are not a substitute for
/// the path.
#[must_use]
pub fn note_id(file_path: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, file_path.as_bytes()).to_string()
}

impl Note {
    #[must_use]
    pub const fn note_type(&self) -> NoteType {
        self.common.note_type
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.common.title.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.common.archived
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.type_fields, TypeFields::Text)
    }

    /// Case-insensitive exact tag match
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.common.tags.iter().any(|t| t.to_lowercase() == wanted)
    }

    /// Substring match over title, content and tags. `needle` must already be
    /// lowercase.
    #[must_use]
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.common
            .title
            .as_deref()
            .is_some_and(|title| title.to_lowercase().contains(needle))
            || self.content.to_lowercase().contains(needle)
            || self
                .common
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }
}

macro_rules! impl_type_field_helpers {
    ($($variant:ident => $fields:ty),*) => {
        $(
            impl Note {
                paste::paste! {
                    #[must_use]
                    pub fn [<as_ $variant:snake>](&self) -> Option<&$fields> {
                        if let TypeFields::$variant { fields } = &self.type_fields {
                            Some(fields)
                        } else {
                            None
                        }
                    }

                    #[must_use]
                    pub fn [<is_ $variant:snake>](&self) -> bool {
                        self.[<as_ $variant:snake>]().is_some()
                    }
                }
            }
        )*
    };
}

impl_type_field_helpers!(Todo => TodoFields, Location => LocationFields);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct EditableTodoFields {
    pub priority: String,
    pub due: String,
    pub reminder: Option<i32>,
}

/// Location fields as typed into an editor; `coordinates` is the raw
/// `"lat,lon"` text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct EditableLocationFields {
    pub coordinates: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub rating: String,
    pub cuisine: String,
    pub price_range: String,
    pub hours: String,
}

/// Mutable projection of a [`Note`] used while composing or editing.
///
/// Absent values are empty strings. An empty `file_path` means the note has
/// not been written yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct EditableNote {
    pub file_path: String,
    pub note_type: NoteType,
    pub created: String,
    pub edited: String,
    pub tags: Vec<String>,
    pub title: String,
    pub archived: bool,
    pub content: String,
    pub todo_fields: EditableTodoFields,
    pub location_fields: EditableLocationFields,
}

impl EditableNote {
    #[must_use]
    pub fn new(note_type: NoteType) -> Self {
        Self {
            note_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.file_path.trim().is_empty()
    }

    /// Rejects notes that carry nothing worth saving.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] matching the note kind
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_text = !self.title.trim().is_empty() || !self.content.trim().is_empty();
        match self.note_type {
            NoteType::Text if !has_text => Err(ValidationError::EmptyNote),
            NoteType::Todo if !has_text => Err(ValidationError::EmptyTodo),
            NoteType::Location
                if !has_text && self.location_fields.address.trim().is_empty() =>
            {
                Err(ValidationError::EmptyLocation)
            }
            _ => Ok(()),
        }
    }
}

fn owned_or_empty(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

impl From<&TodoFields> for EditableTodoFields {
    fn from(fields: &TodoFields) -> Self {
        Self {
            priority: owned_or_empty(fields.priority.as_ref()),
            due: owned_or_empty(fields.due.as_ref()),
            reminder: fields.reminder,
        }
    }
}

impl From<&LocationFields> for EditableLocationFields {
    fn from(fields: &LocationFields) -> Self {
        Self {
            coordinates: fields
                .coordinates
                .map(|c| c.to_string())
                .unwrap_or_default(),
            address: owned_or_empty(fields.address.as_ref()),
            phone: owned_or_empty(fields.phone.as_ref()),
            website: owned_or_empty(fields.website.as_ref()),
            rating: owned_or_empty(fields.rating.as_ref()),
            cuisine: owned_or_empty(fields.cuisine.as_ref()),
            price_range: owned_or_empty(fields.price_range.as_ref()),
            hours: owned_or_empty(fields.hours.as_ref()),
        }
    }
}

impl From<&Note> for EditableNote {
    fn from(note: &Note) -> Self {
        let common = &note.common;
        let mut editable = Self {
            file_path: note.file_path.clone(),
            note_type: common.note_type,
            created: common.created.clone(),
            edited: owned_or_empty(common.edited.as_ref()),
            tags: common.tags.clone(),
            title: owned_or_empty(common.title.as_ref()),
            archived: common.archived,
            content: note.content.clone(),
            ..Self::default()
        };
        match &note.type_fields {
            TypeFields::Text => {}
            TypeFields::Todo { fields } => editable.todo_fields = fields.into(),
            TypeFields::Location { fields } => editable.location_fields = fields.into(),
        }
        editable
    }
}
