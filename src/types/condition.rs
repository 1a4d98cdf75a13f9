use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};
use serde_json::Map;

use super::Value;
use crate::Error;

/// A condition tree node.
///
/// Serialized in the JSON shape hosts store their rules in:
/// `{"all": [...]}`, `{"any": [...]}`, `{"not": {...}}` or
/// `{"name": ..., "operator": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum Condition {
    /// True when every child is true. Vacuously true when empty.
    All(Vec<Condition>),
    /// True when some child is true. False when empty.
    Any(Vec<Condition>),
    Not(Box<Condition>),
    /// Compare a variable against a literal using a named operator.
    Leaf {
        name: String,
        operator: String,
        value: Value,
    },
}

impl Condition {
    #[must_use]
    pub fn all(children: impl IntoIterator<Item = Condition>) -> Condition {
        Condition::All(children.into_iter().collect())
    }

    #[must_use]
    pub fn any(children: impl IntoIterator<Item = Condition>) -> Condition {
        Condition::Any(children.into_iter().collect())
    }

    /// One-line description of this node alone, without its children.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Condition::All(children) => format!("all of {}", children.len()),
            Condition::Any(children) => format!("any of {}", children.len()),
            Condition::Not(_) => "not".to_owned(),
            leaf @ Condition::Leaf { .. } => leaf.to_string(),
        }
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::All(children) => write_joined(f, "ALL", children),
            Condition::Any(children) => write_joined(f, "ANY", children),
            Condition::Not(inner) => write!(f, "NOT {inner}"),
            Condition::Leaf {
                name,
                operator,
                value: Value::Null,
            } => write!(f, "{name} {operator}"),
            Condition::Leaf {
                name,
                operator,
                value,
            } => write!(f, "{name} {operator} {value}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, keyword: &str, children: &[Condition]) -> fmt::Result {
    write!(f, "{keyword}(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

impl TryFrom<serde_json::Value> for Condition {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self, Error> {
        let serde_json::Value::Object(mut map) = json else {
            return Err(Error::malformed("condition node must be an object"));
        };

        if map.len() == 1 {
            if let Some(children) = map.remove("all") {
                return children_of("all", children).map(Condition::All);
            }
            if let Some(children) = map.remove("any") {
                return children_of("any", children).map(Condition::Any);
            }
            if let Some(inner) = map.remove("not") {
                return Ok(!Condition::try_from(inner)?);
            }
        }

        let name = string_key(&mut map, "name")?;
        let operator = string_key(&mut map, "operator")?;
        let value = map.remove("value").map_or(Ok(Value::Null), Value::try_from)?;
        if let Some(extra) = map.keys().next() {
            return Err(Error::malformed(format!(
                "unexpected key '{extra}' in condition on '{name}'"
            )));
        }

        Ok(Condition::Leaf {
            name,
            operator,
            value,
        })
    }
}

fn children_of(keyword: &str, json: serde_json::Value) -> Result<Vec<Condition>, Error> {
    match json {
        serde_json::Value::Array(items) => items.into_iter().map(Condition::try_from).collect(),
        _ => Err(Error::malformed(format!("'{keyword}' must hold an array"))),
    }
}

fn string_key(map: &mut Map<String, serde_json::Value>, key: &str) -> Result<String, Error> {
    match map.remove(key) {
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(_) => Err(Error::malformed(format!("condition '{key}' must be a string"))),
        None => Err(Error::malformed(format!(
            "condition node is not all/any/not and has no '{key}'"
        ))),
    }
}

impl From<Condition> for serde_json::Value {
    fn from(condition: Condition) -> Self {
        use serde_json::json;

        match condition {
            Condition::All(children) => json!({ "all": children }),
            Condition::Any(children) => json!({ "any": children }),
            Condition::Not(inner) => json!({ "not": *inner }),
            Condition::Leaf {
                name,
                operator,
                value,
            } => json!({ "name": name, "operator": operator, "value": value }),
        }
    }
}

/// Intermediate builder for leaf conditions. Created by [`variable()`].
#[derive(Debug, Clone)]
pub struct VariableExpr {
    name: String,
}

impl VariableExpr {
    /// Compare with any registered operator.
    #[must_use]
    pub fn op(self, operator: &str, value: impl Into<Value>) -> Condition {
        Condition::Leaf {
            name: self.name,
            operator: operator.to_owned(),
            value: value.into(),
        }
    }

    /// Apply an operator that takes no operand, such as `is_true` or `exists`.
    #[must_use]
    pub fn check(self, operator: &str) -> Condition {
        self.op(operator, Value::Null)
    }

    #[must_use]
    pub fn equal_to(self, value: impl Into<Value>) -> Condition {
        self.op("equal_to", value)
    }

    #[must_use]
    pub fn greater_than(self, value: impl Into<Value>) -> Condition {
        self.op("greater_than", value)
    }

    #[must_use]
    pub fn less_than(self, value: impl Into<Value>) -> Condition {
        self.op("less_than", value)
    }

    #[must_use]
    pub fn contains(self, value: impl Into<Value>) -> Condition {
        self.op("contains", value)
    }
}

#[must_use]
pub fn variable(name: &str) -> VariableExpr {
    VariableExpr {
        name: name.to_owned(),
    }
}
