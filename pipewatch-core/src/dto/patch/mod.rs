//! Tri-state field patches
//!
//! Partial updates distinguish three cases per field:
//! - absent from the payload: leave the stored value unchanged
//! - present as `null`: clear the stored value
//! - present with a value: replace the stored value

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single field of a partial update
///
/// Use with `#[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]`
/// so that absent fields deserialize as `Unchanged`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldPatch<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> FieldPatch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldPatch::Unchanged)
    }

    /// Apply this patch to an optional stored value
    pub fn apply_to(self, current: Option<T>) -> Option<T> {
        match self {
            FieldPatch::Unchanged => current,
            FieldPatch::Clear => None,
            FieldPatch::Set(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for FieldPatch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => FieldPatch::Set(v),
            None => FieldPatch::Clear,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldPatch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(FieldPatch::from)
    }
}

impl<T: Serialize> Serialize for FieldPatch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldPatch::Set(value) => value.serialize(serializer),
            FieldPatch::Unchanged | FieldPatch::Clear => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Example {
        #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
        schedule: FieldPatch<String>,
    }

    #[test]
    fn test_absent_is_unchanged() {
        let ex: Example = serde_json::from_str("{}").unwrap();
        assert_eq!(ex.schedule, FieldPatch::Unchanged);
        assert_eq!(ex.schedule.apply_to(Some("old".into())), Some("old".into()));
    }

    #[test]
    fn test_null_clears() {
        let ex: Example = serde_json::from_str(r#"{"schedule": null}"#).unwrap();
        assert_eq!(ex.schedule, FieldPatch::Clear);
        assert_eq!(ex.schedule.apply_to(Some("old".into())), None);
    }

    #[test]
    fn test_value_sets() {
        let ex: Example = serde_json::from_str(r#"{"schedule": "0 * * * *"}"#).unwrap();
        assert_eq!(ex.schedule.apply_to(None), Some("0 * * * *".to_string()));
    }

    #[test]
    fn test_serialize_skips_unchanged() {
        let unchanged = Example {
            schedule: FieldPatch::Unchanged,
        };
        assert_eq!(serde_json::to_string(&unchanged).unwrap(), "{}");

        let cleared = Example {
            schedule: FieldPatch::Clear,
        };
        assert_eq!(
            serde_json::to_string(&cleared).unwrap(),
            r#"{"schedule":null}"#
        );
    }
}
