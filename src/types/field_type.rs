use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of value kinds a variable or action parameter can have.
///
/// The field type decides which operators apply to a variable and how
/// values are coerced before comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Numeric,
    String,
    Boolean,
    Select,
    SelectMultiple,
    Tabular,
}

impl FieldType {
    /// Every field type, in schema export order.
    pub const ALL: [FieldType; 6] = [
        FieldType::Numeric,
        FieldType::String,
        FieldType::Boolean,
        FieldType::Select,
        FieldType::SelectMultiple,
        FieldType::Tabular,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Numeric => "numeric",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Select => "select",
            FieldType::SelectMultiple => "select_multiple",
            FieldType::Tabular => "tabular",
        }
    }

    /// Whether variables of this type carry an options list.
    #[must_use]
    pub fn has_options(self) -> bool {
        matches!(self, FieldType::Select | FieldType::SelectMultiple)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde_name() {
        for ft in FieldType::ALL {
            let json = serde_json::to_value(ft).unwrap();
            assert_eq!(json, serde_json::Value::String(ft.to_string()));
        }
    }

    #[test]
    fn select_types_have_options() {
        assert!(FieldType::Select.has_options());
        assert!(FieldType::SelectMultiple.has_options());
        assert!(!FieldType::Numeric.has_options());
        assert!(!FieldType::Tabular.has_options());
    }
}
