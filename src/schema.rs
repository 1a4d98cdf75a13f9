//! Schema export for rule-authoring UIs.
//!
//! Everything here reads type-level registration data, so no host instance
//! is needed.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::operators::{InputType, operators_for};
use crate::{Actions, FieldType, Value, Variables};

/// Description of the variables, actions and operators available for a pair
/// of host types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSchema {
    pub variables: Vec<VariableSchema>,
    pub actions: Vec<ActionSchema>,
    pub variable_type_operators: BTreeMap<FieldType, Vec<OperatorSchema>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSchema {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub options: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSchema {
    pub name: String,
    pub label: String,
    pub params: Vec<ParamSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSchema {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorSchema {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: InputType,
}

impl RuleSchema {
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Describe everything rules may reference for hosts `V` and `A`.
///
/// Variables and actions keep declaration order; operators are listed for
/// every field type.
#[must_use]
pub fn export_rule_data<V: Variables, A: Actions>() -> RuleSchema {
    let variables = V::registry()
        .iter()
        .map(|v| VariableSchema {
            name: v.name().to_owned(),
            label: v.label().to_owned(),
            field_type: v.field_type(),
            options: v.options().to_vec(),
        })
        .collect();

    let actions = A::registry()
        .iter()
        .map(|a| ActionSchema {
            name: a.name().to_owned(),
            label: a.label().to_owned(),
            params: a
                .params()
                .iter()
                .map(|p| ParamSchema {
                    name: p.name().to_owned(),
                    label: p.label().to_owned(),
                    field_type: p.field_type(),
                })
                .collect(),
        })
        .collect();

    let variable_type_operators = FieldType::ALL
        .iter()
        .map(|&ft| {
            let ops = operators_for(ft)
                .iter()
                .map(|op| OperatorSchema {
                    name: op.name(),
                    label: op.label(),
                    input_type: op.input_type(),
                })
                .collect();
            (ft, ops)
        })
        .collect();

    RuleSchema {
        variables,
        actions,
        variable_type_operators,
    }
}

/// `snake_case` name to "Title Case" label.
pub(crate) fn pretty_label(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
