use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Condition, Value};
use crate::Error;

/// A named action to run when a rule triggers, with literal parameters.
///
/// On input the invocation may also be written as a bare string
/// (`"notify_manager"`), as a pair (`["put_on_sale", {"sale_percentage": 0.25}]`)
/// or as an object keyed by `action` instead of `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct ActionInvocation {
    pub name: String,
    pub params: BTreeMap<String, Value>,
}

impl ActionInvocation {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_owned(), value.into());
        self
    }

    /// Whether a JSON array is the `[name, {params}]` shorthand for a single
    /// invocation rather than a list of invocations. An object that reads as
    /// an invocation itself keeps the array a list.
    fn is_pair(items: &[serde_json::Value]) -> bool {
        match items {
            [serde_json::Value::String(_), serde_json::Value::Object(second)] => {
                !Self::looks_like_invocation(second)
            }
            _ => false,
        }
    }

    fn looks_like_invocation(map: &serde_json::Map<String, serde_json::Value>) -> bool {
        let named = ["name", "action"]
            .iter()
            .any(|key| map.get(*key).is_some_and(serde_json::Value::is_string));
        named
            && map
                .keys()
                .all(|key| matches!(key.as_str(), "name" | "action" | "params"))
    }
}

impl TryFrom<serde_json::Value> for ActionInvocation {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self, Error> {
        use serde_json::Value as Json;

        match json {
            Json::String(name) => Ok(Self {
                name,
                params: BTreeMap::new(),
            }),
            Json::Array(items) if Self::is_pair(&items) => {
                let mut items = items.into_iter();
                let (Some(Json::String(name)), Some(params)) = (items.next(), items.next()) else {
                    return Err(Error::malformed("action pair must be [name, {params}]"));
                };
                let params = params_of(&name, params)?;
                Ok(Self { name, params })
            }
            Json::Object(mut map) => {
                let name = match map.remove("name").or_else(|| map.remove("action")) {
                    Some(Json::String(name)) => name,
                    _ => return Err(Error::malformed("action invocation has no string 'name'")),
                };
                let params = match map.remove("params") {
                    Some(params) => params_of(&name, params)?,
                    None => BTreeMap::new(),
                };
                if let Some(extra) = map.keys().next() {
                    return Err(Error::malformed(format!(
                        "unexpected key '{extra}' in invocation of '{name}'"
                    )));
                }
                Ok(Self { name, params })
            }
            other => Err(Error::malformed(format!(
                "action invocation must be a string, pair or object, got {other}"
            ))),
        }
    }
}

fn params_of(action: &str, json: serde_json::Value) -> Result<BTreeMap<String, Value>, Error> {
    match json {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| Ok((k, Value::try_from(v)?)))
            .collect(),
        serde_json::Value::Null => Ok(BTreeMap::new()),
        _ => Err(Error::malformed(format!(
            "params of '{action}' must be an object"
        ))),
    }
}

/// A condition tree paired with the actions to run when it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct Rule {
    pub conditions: Condition,
    pub actions: Vec<ActionInvocation>,
}

impl Rule {
    #[must_use]
    pub fn new(conditions: Condition, actions: Vec<ActionInvocation>) -> Self {
        Self {
            conditions,
            actions,
        }
    }

    /// Parse a single rule from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for invalid JSON and [`Error::MalformedRule`]
    /// for JSON that does not have the rule shape.
    pub fn from_json(input: &str) -> Result<Self, Error> {
        let json: serde_json::Value = serde_json::from_str(input)?;
        Self::try_from(json)
    }
}

impl TryFrom<serde_json::Value> for Rule {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self, Error> {
        use serde_json::Value as Json;

        let Json::Object(mut map) = json else {
            return Err(Error::malformed("rule must be an object"));
        };
        let conditions = map
            .remove("conditions")
            .ok_or_else(|| Error::malformed("rule has no 'conditions'"))
            .and_then(Condition::try_from)?;
        let actions = match map.remove("actions") {
            None | Some(Json::Null) => Vec::new(),
            Some(Json::Array(items)) if !ActionInvocation::is_pair(&items) => items
                .into_iter()
                .map(ActionInvocation::try_from)
                .collect::<Result<_, _>>()?,
            Some(single) => vec![ActionInvocation::try_from(single)?],
        };
        if let Some(extra) = map.keys().next() {
            return Err(Error::malformed(format!("unexpected key '{extra}' in rule")));
        }
        Ok(Self {
            conditions,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable;
    use serde_json::json;

    #[test]
    fn invocation_builder() {
        let inv = ActionInvocation::new("put_on_sale").param("sale_percentage", 0.25);
        assert_eq!(inv.name, "put_on_sale");
        assert_eq!(inv.params.get("sale_percentage"), Some(&Value::Float(0.25)));
    }

    #[test]
    fn invocation_shorthands() {
        let bare = ActionInvocation::try_from(json!("notify_manager")).unwrap();
        assert_eq!(bare, ActionInvocation::new("notify_manager"));

        let pair = ActionInvocation::try_from(json!(["put_on_sale", {"percent": 25}])).unwrap();
        assert_eq!(pair, ActionInvocation::new("put_on_sale").param("percent", 25_i64));

        let keyed = ActionInvocation::try_from(json!({"action": "log_event", "params": {"id": 1}}))
            .unwrap();
        assert_eq!(keyed, ActionInvocation::new("log_event").param("id", 1_i64));
    }

    #[test]
    fn invocation_rejects_numbers() {
        let err = ActionInvocation::try_from(json!(12)).unwrap_err();
        assert!(matches!(err, Error::MalformedRule { .. }));
    }

    #[test]
    fn rule_from_json() {
        let rule = Rule::from_json(
            r#"{
                "conditions": {"all": [
                    {"name": "current_inventory", "operator": "greater_than", "value": 20}
                ]},
                "actions": [{"name": "put_on_sale", "params": {"sale_percentage": 0.25}}]
            }"#,
        )
        .unwrap();

        assert_eq!(
            rule,
            Rule::new(
                Condition::all([variable("current_inventory").greater_than(20_i64)]),
                vec![ActionInvocation::new("put_on_sale").param("sale_percentage", 0.25)],
            )
        );
    }

    #[test]
    fn rule_actions_accept_mixed_list() {
        let rule = Rule::try_from(json!({
            "conditions": {"all": []},
            "actions": ["notify", ["sale", {"p": 10}], {"action": "log"}]
        }))
        .unwrap();
        let names: Vec<&str> = rule.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["notify", "sale", "log"]);
    }

    #[test]
    fn rule_actions_accept_single_pair() {
        let rule = Rule::try_from(json!({
            "conditions": {"any": []},
            "actions": ["put_on_sale", {"percent": 25}]
        }))
        .unwrap();
        assert_eq!(rule.actions.len(), 1);
        assert_eq!(rule.actions[0].name, "put_on_sale");
    }

    #[test]
    fn two_invocation_list_is_not_a_pair() {
        let rule = Rule::try_from(json!({
            "conditions": {"all": []},
            "actions": ["notify", {"action": "log"}]
        }))
        .unwrap();
        let names: Vec<&str> = rule.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["notify", "log"]);
        assert!(rule.actions[0].params.is_empty());

        let rule = Rule::try_from(json!({
            "conditions": {"all": []},
            "actions": ["sale", {"name": "log", "params": {"id": 1}}]
        }))
        .unwrap();
        assert_eq!(rule.actions.len(), 2);
        assert_eq!(rule.actions[1], ActionInvocation::new("log").param("id", 1_i64));
    }

    #[test]
    fn pair_params_may_use_other_keys_named_like_fields() {
        let pair = ActionInvocation::try_from(json!(["rename", {"name": 3, "label": "x"}])).unwrap();
        assert_eq!(pair.name, "rename");
        assert_eq!(pair.params.len(), 2);
    }

    #[test]
    fn rule_without_conditions_is_malformed() {
        let err = Rule::try_from(json!({"actions": []})).unwrap_err();
        assert!(matches!(err, Error::MalformedRule { .. }));
    }

    #[test]
    fn invalid_json_text_is_json_error() {
        let err = Rule::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
