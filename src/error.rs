use thiserror::Error;

use crate::FieldType;

/// Errors raised while evaluating, validating, or parsing rules.
///
/// Every error propagates out of [`run_all`](crate::run_all) unchanged; the
/// engine never skips a failing rule.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    #[error("operator '{operator}' is not defined for field type {field_type}")]
    UnknownOperator {
        field_type: FieldType,
        operator: String,
    },

    #[error("cannot coerce {found} to {expected}")]
    Coercion { expected: FieldType, found: String },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("action '{action}' is missing required parameter '{param}'")]
    MissingParam { action: String, param: String },

    #[error("action '{action}' does not accept parameter '{param}'")]
    UnexpectedParam { action: String, param: String },

    #[error("malformed rule: {reason}")]
    MalformedRule { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedRule {
            reason: reason.into(),
        }
    }

    pub(crate) fn coercion(expected: FieldType, found: &crate::Value) -> Self {
        Error::Coercion {
            expected,
            found: format!("{} {found}", found.type_name()),
        }
    }
}
