//! Paper record schema
//!
//! Request payloads arrive as loosely typed JSON. They are cast to text
//! field by field, checked against the schema (all five business fields
//! present and non-empty), and only then handed to the store.

mod patch;

pub use patch::PaperPatch;

use crate::db::models::Paper;
use crate::errors::{AppError, Result};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// Business fields in schema order: (struct field, wire name)
pub const FIELDS: [(&str, &str); 5] = [
    ("unit_code", "unitCode"),
    ("year_taken", "yearTaken"),
    ("unit_title", "unitTitle"),
    ("file_location", "fileLocation"),
    ("class_of_study", "classOfStudy"),
];

/// Create payload as sent by clients. Unknown fields (including `id`) are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperInput {
    #[serde(default)]
    pub unit_code: Option<Value>,
    #[serde(default)]
    pub year_taken: Option<Value>,
    #[serde(default)]
    pub unit_title: Option<Value>,
    #[serde(default)]
    pub file_location: Option<Value>,
    #[serde(default)]
    pub class_of_study: Option<Value>,
}

/// A candidate record after casting, before validation
#[derive(Debug, Clone, Default, Validate)]
pub struct PaperDraft {
    #[validate(required, length(min = 1))]
    pub unit_code: Option<String>,
    #[validate(required, length(min = 1))]
    pub year_taken: Option<String>,
    #[validate(required, length(min = 1))]
    pub unit_title: Option<String>,
    #[validate(required, length(min = 1))]
    pub file_location: Option<String>,
    #[validate(required, length(min = 1))]
    pub class_of_study: Option<String>,
}

/// A structurally valid record ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaper {
    pub unit_code: String,
    pub year_taken: String,
    pub unit_title: String,
    pub file_location: String,
    pub class_of_study: String,
}

impl PaperInput {
    /// Cast every supplied value to text
    pub fn into_draft(self) -> Result<PaperDraft> {
        Ok(PaperDraft {
            unit_code: cast_field("unitCode", self.unit_code.as_ref())?,
            year_taken: cast_field("yearTaken", self.year_taken.as_ref())?,
            unit_title: cast_field("unitTitle", self.unit_title.as_ref())?,
            file_location: cast_field("fileLocation", self.file_location.as_ref())?,
            class_of_study: cast_field("classOfStudy", self.class_of_study.as_ref())?,
        })
    }

    /// Cast and validate in one step
    pub fn into_new_paper(self) -> Result<NewPaper> {
        self.into_draft()?.into_new_paper()
    }
}

impl PaperDraft {
    /// Run the schema checks, reporting every failing field
    pub fn check(&self) -> Result<()> {
        let errors = match self.validate() {
            Ok(()) => return Ok(()),
            Err(errors) => errors,
        };

        let failing = errors.field_errors();
        let fields: Vec<String> = FIELDS
            .iter()
            .filter(|(name, _)| failing.contains_key(*name))
            .map(|(_, wire)| wire.to_string())
            .collect();

        let message = fields
            .iter()
            .map(|wire| format!("{}: Path `{}` is required.", wire, wire))
            .collect::<Vec<_>>()
            .join(", ");

        Err(AppError::Validation { message, fields })
    }

    pub fn into_new_paper(self) -> Result<NewPaper> {
        self.check()?;

        Ok(NewPaper {
            unit_code: self.unit_code.unwrap_or_default(),
            year_taken: self.year_taken.unwrap_or_default(),
            unit_title: self.unit_title.unwrap_or_default(),
            file_location: self.file_location.unwrap_or_default(),
            class_of_study: self.class_of_study.unwrap_or_default(),
        })
    }
}

impl From<&Paper> for PaperDraft {
    fn from(paper: &Paper) -> Self {
        Self {
            unit_code: Some(paper.unit_code.clone()),
            year_taken: Some(paper.year_taken.clone()),
            unit_title: Some(paper.unit_title.clone()),
            file_location: Some(paper.file_location.clone()),
            class_of_study: Some(paper.class_of_study.clone()),
        }
    }
}

/// Validate a stored (or merged) record against the schema
pub fn validate_paper(paper: &Paper) -> Result<()> {
    PaperDraft::from(paper).check()
}

/// Read a JSON value as text the way a string schema path would.
///
/// `null` counts as absent; numbers and booleans become their text form;
/// arrays and objects are rejected.
pub fn cast_field(field: &str, value: Option<&Value>) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(AppError::InvalidFormat {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

/// JavaScript-style truthiness: null, false, 0, NaN and "" are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
