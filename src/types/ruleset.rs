use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::rule::{ActionInvocation, Rule};
use crate::Error;

/// Builder for constructing a [`RuleSet`] in code.
///
/// # Example
///
/// ```
/// use rulebook::{RuleSetBuilder, variable};
///
/// let rules = RuleSetBuilder::new()
///     .rule(|r| {
///         r.when(variable("current_inventory").greater_than(20_i64))
///             .then("put_on_sale", |a| a.param("sale_percentage", 0.25))
///     })
///     .build()
///     .unwrap();
/// assert_eq!(rules.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<RuleBuilder>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    condition: Option<Condition>,
    actions: Vec<ActionInvocation>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. The closure must call `.when(condition)`.
    #[must_use]
    pub fn rule(mut self, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        self.rules.push(f(RuleBuilder::default()));
        self
    }

    /// Finish the rule set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRule`] if a rule never had `.when()` called.
    pub fn build(self) -> Result<RuleSet, Error> {
        let rules = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, builder)| {
                let conditions = builder.condition.ok_or_else(|| {
                    Error::malformed(format!("rule {index} has no conditions"))
                })?;
                Ok(Rule::new(conditions, builder.actions))
            })
            .collect::<Result<_, Error>>()?;
        Ok(RuleSet { rules })
    }
}

impl RuleBuilder {
    /// Set the condition tree for this rule.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Append an action invocation; the closure fills in its parameters.
    #[must_use]
    pub fn then(
        mut self,
        action: &str,
        f: impl FnOnce(ActionInvocation) -> ActionInvocation,
    ) -> Self {
        self.actions.push(f(ActionInvocation::new(action)));
        self
    }

    /// Append an action invocation that takes no parameters.
    #[must_use]
    pub fn then_do(mut self, action: &str) -> Self {
        self.actions.push(ActionInvocation::new(action));
        self
    }
}

/// An ordered list of rules. Order matters: rules run first to last.
///
/// Immutable once built and safe to share across threads behind `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse a JSON array of rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on invalid JSON and [`Error::MalformedRule`]
    /// if the input is not an array of rule objects.
    pub fn from_json(input: &str) -> Result<Self, Error> {
        let json: serde_json::Value = serde_json::from_str(input)?;
        match json {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Rule::try_from)
                .collect::<Result<_, _>>()
                .map(Self::new),
            _ => Err(Error::malformed("rule set must be an array")),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Every variable name referenced by any leaf, first occurrence first.
    #[must_use]
    pub fn referenced_variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for rule in &self.rules {
            collect_variable_names(&rule.conditions, &mut names);
        }
        names
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

fn collect_variable_names<'a>(condition: &'a Condition, out: &mut Vec<&'a str>) {
    match condition {
        Condition::All(children) | Condition::Any(children) => {
            for child in children {
                collect_variable_names(child, out);
            }
        }
        Condition::Not(inner) => collect_variable_names(inner, out),
        Condition::Leaf { name, .. } => {
            if !out.contains(&name.as_str()) {
                out.push(name);
            }
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: usize = self.rules.iter().map(|r| r.actions.len()).sum();
        write!(f, "RuleSet({} rules, {actions} actions)", self.rules.len())
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<Rule> for RuleSet {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        self.rules.extend(iter);
    }
}

impl AsRef<[Rule]> for RuleSet {
    fn as_ref(&self) -> &[Rule] {
        &self.rules
    }
}
