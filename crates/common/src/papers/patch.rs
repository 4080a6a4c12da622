//! Partial updates

use super::{cast_field, is_truthy, validate_paper};
use crate::db::models::Paper;
use crate::errors::Result;
use serde::Deserialize;
use serde_json::Value;

/// Update payload. Every field is optional.
///
/// Only truthy values overwrite; `null`, `""`, `0`, `false` and absent fields
/// all leave the stored value as it is, so a field cannot be blanked here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperPatch {
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

impl PaperPatch {
    /// Merge into `paper`, returning the wire names of the fields that were written.
    ///
    /// The merged record is validated before returning.
    pub fn apply(&self, paper: &mut Paper) -> Result<Vec<&'static str>> {
        let mut changed = Vec::new();

        if let Some(value) = patch_value("unitCode", self.unit_code.as_ref())? {
            paper.unit_code = value;
            changed.push("unitCode");
        }
        if let Some(value) = patch_value("yearTaken", self.year_taken.as_ref())? {
            paper.year_taken = value;
            changed.push("yearTaken");
        }
        if let Some(value) = patch_value("unitTitle", self.unit_title.as_ref())? {
            paper.unit_title = value;
            changed.push("unitTitle");
        }
        if let Some(value) = patch_value("fileLocation", self.file_location.as_ref())? {
            paper.file_location = value;
            changed.push("fileLocation");
        }
        if let Some(value) = patch_value("classOfStudy", self.class_of_study.as_ref())? {
            paper.class_of_study = value;
            changed.push("classOfStudy");
        }

        validate_paper(paper)?;
        Ok(changed)
    }
}

fn patch_value(field: &str, value: Option<&Value>) -> Result<Option<String>> {
    match value {
        Some(v) if is_truthy(v) => cast_field(field, Some(v)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use serde_json::json;
    use uuid::Uuid;

    fn stored() -> Paper {
        Paper {
            seq: 1,
            id: Uuid::new_v4(),
            unit_code: "BIO101".into(),
            year_taken: "2022".into(),
            unit_title: "Introduction to Biology".into(),
            file_location: "/path/to/bio101.pdf".into(),
            class_of_study: "Undergraduate".into(),
        }
    }

    fn patch(value: Value) -> PaperPatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_subset_overwrites_only_supplied_fields() {
        let mut paper = stored();
        let before = paper.clone();

        let changed = patch(json!({
            "unitTitle": "Advanced Biology",
            "fileLocation": "/path/to/bio101_updated.pdf"
        }))
        .apply(&mut paper)
        .unwrap();

        assert_eq!(changed, vec!["unitTitle", "fileLocation"]);
        assert_eq!(paper.unit_title, "Advanced Biology");
        assert_eq!(paper.file_location, "/path/to/bio101_updated.pdf");
        assert_eq!(paper.unit_code, before.unit_code);
        assert_eq!(paper.year_taken, before.year_taken);
        assert_eq!(paper.class_of_study, before.class_of_study);
        assert_eq!(paper.id, before.id);
    }

    #[test]
    fn test_falsy_values_are_ignored() {
        let mut paper = stored();
        paper.unit_title = "Intro".into();

        let changed = patch(json!({
            "unitTitle": null,
            "unitCode": "",
            "yearTaken": 0,
            "classOfStudy": false
        }))
        .apply(&mut paper)
        .unwrap();

        assert!(changed.is_empty());
        assert_eq!(paper.unit_title, "Intro");
        assert_eq!(paper.unit_code, "BIO101");
        assert_eq!(paper.year_taken, "2022");
    }

    #[test]
    fn test_empty_patch_is_a_no_op() {
        let mut paper = stored();
        let changed = PaperPatch::default().apply(&mut paper).unwrap();
        assert!(changed.is_empty());
        assert_eq!(paper.unit_title, "Introduction to Biology");
    }

    #[test]
    fn test_invalid_stored_record_is_rejected() {
        let mut paper = stored();
        paper.class_of_study = String::new();

        let err = patch(json!({ "unitTitle": "Genetics" }))
            .apply(&mut paper)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_structured_patch_value_is_rejected() {
        let mut paper = stored();
        let err = patch(json!({ "unitTitle": { "en": "Biology" } }))
            .apply(&mut paper)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat { .. }));
    }
}
