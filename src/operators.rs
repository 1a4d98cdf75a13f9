//! Operator registry: every comparison a condition leaf can make, keyed by
//! field type and operator name.
//!
//! Coercion lives next to the predicates that use it. Operators are never
//! shared between field types; `equal_to` on numeric and `equal_to` on string
//! are separate entries with their own coercion.

use std::borrow::Cow;
use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::{Error, FieldType, Result, Value};

/// Tolerance for numeric comparisons.
const EPSILON: f64 = 0.000_001;

/// A predicate comparing a variable's value against a condition's literal.
pub type Predicate = fn(&Value, &Value) -> Result<bool>;

/// The kind of input widget a rule-authoring UI should offer for an
/// operator's operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Numeric,
    Text,
    /// The operator ignores its operand.
    None,
    Select,
    SelectMultiple,
}

/// A named, labelled predicate registered for one field type.
#[derive(Clone, Copy)]
pub struct Operator {
    name: &'static str,
    label: &'static str,
    input_type: InputType,
    predicate: Predicate,
}

impl Operator {
    const fn new(
        name: &'static str,
        label: &'static str,
        input_type: InputType,
        predicate: Predicate,
    ) -> Self {
        Self {
            name,
            label,
            input_type,
            predicate,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    /// Apply the predicate to `(actual, expected)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Coercion`] when either operand cannot be read as the
    /// field type, or [`Error::InvalidPattern`] for a bad `matches_regex` pattern.
    pub fn apply(&self, actual: &Value, expected: &Value) -> Result<bool> {
        (self.predicate)(actual, expected)
    }

    /// Check that a condition literal is usable as this operator's operand,
    /// without needing a variable value.
    pub(crate) fn check_operand(&self, expected: &Value) -> Result<()> {
        match self.input_type {
            InputType::Numeric => to_number(expected).map(drop),
            InputType::Text if self.name == "matches_regex" => {
                compile_pattern(&to_text(expected)?).map(drop)
            }
            InputType::Text => to_text(expected).map(drop),
            InputType::SelectMultiple => to_list(FieldType::SelectMultiple, expected).map(drop),
            InputType::Select | InputType::None => Ok(()),
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("input_type", &self.input_type)
            .finish_non_exhaustive()
    }
}

static NUMERIC: [Operator; 5] = [
    Operator::new("equal_to", "Equal To", InputType::Numeric, numeric_equal_to),
    Operator::new("greater_than", "Greater Than", InputType::Numeric, greater_than),
    Operator::new("less_than", "Less Than", InputType::Numeric, less_than),
    Operator::new(
        "greater_than_or_equal_to",
        "Greater Than Or Equal To",
        InputType::Numeric,
        greater_than_or_equal_to,
    ),
    Operator::new(
        "less_than_or_equal_to",
        "Less Than Or Equal To",
        InputType::Numeric,
        less_than_or_equal_to,
    ),
];

static STRING: [Operator; 7] = [
    Operator::new("equal_to", "Equal To", InputType::Text, string_equal_to),
    Operator::new("starts_with", "Starts With", InputType::Text, starts_with),
    Operator::new("ends_with", "Ends With", InputType::Text, ends_with),
    Operator::new("contains", "Contains", InputType::Text, string_contains),
    Operator::new("matches_regex", "Matches Regex", InputType::Text, matches_regex),
    Operator::new("non_empty", "Non Empty", InputType::None, non_empty),
    Operator::new(
        "equal_to_case_insensitive",
        "Equal To Case Insensitive",
        InputType::Text,
        equal_to_case_insensitive,
    ),
];

static BOOLEAN: [Operator; 2] = [
    Operator::new("is_true", "Is True", InputType::None, is_true),
    Operator::new("is_false", "Is False", InputType::None, is_false),
];

static SELECT: [Operator; 2] = [
    Operator::new("contains", "Contains", InputType::Select, select_contains),
    Operator::new(
        "does_not_contain",
        "Does Not Contain",
        InputType::Select,
        select_does_not_contain,
    ),
];

static SELECT_MULTIPLE: [Operator; 5] = [
    Operator::new("contains_all", "Contains All", InputType::SelectMultiple, contains_all),
    Operator::new(
        "is_contained_by",
        "Is Contained By",
        InputType::SelectMultiple,
        is_contained_by,
    ),
    Operator::new(
        "shares_at_least_one_element_with",
        "Shares At Least One Element With",
        InputType::SelectMultiple,
        shares_at_least_one_element_with,
    ),
    Operator::new(
        "shares_exactly_one_element_with",
        "Shares Exactly One Element With",
        InputType::SelectMultiple,
        shares_exactly_one_element_with,
    ),
    Operator::new(
        "shares_no_elements_with",
        "Shares No Elements With",
        InputType::SelectMultiple,
        shares_no_elements_with,
    ),
];

static TABULAR: [Operator; 2] = [
    Operator::new("exists", "Exists", InputType::None, exists),
    Operator::new("not_exists", "Not Exists", InputType::None, not_exists),
];

/// All operators registered for a field type, in export order.
#[must_use]
pub fn operators_for(field_type: FieldType) -> &'static [Operator] {
    match field_type {
        FieldType::Numeric => &NUMERIC,
        FieldType::String => &STRING,
        FieldType::Boolean => &BOOLEAN,
        FieldType::Select => &SELECT,
        FieldType::SelectMultiple => &SELECT_MULTIPLE,
        FieldType::Tabular => &TABULAR,
    }
}

/// Resolve an operator by name for a field type.
///
/// # Errors
///
/// Returns [`Error::UnknownOperator`] if `name` is not registered for
/// `field_type`, even when another field type defines it.
pub fn lookup_operator(field_type: FieldType, name: &str) -> Result<&'static Operator> {
    operators_for(field_type)
        .iter()
        .find(|op| op.name == name)
        .ok_or_else(|| Error::UnknownOperator {
            field_type,
            operator: name.to_owned(),
        })
}

/// Coerce an action parameter value to its declared field type.
pub(crate) fn coerce(field_type: FieldType, value: &Value) -> Result<Value> {
    match field_type {
        FieldType::Numeric => match value {
            Value::Int(_) | Value::Float(_) => Ok(value.clone()),
            Value::String(s) => parse_number(s).ok_or_else(|| Error::coercion(field_type, value)),
            _ => Err(Error::coercion(field_type, value)),
        },
        FieldType::String => to_text(value).map(|s| Value::String(s.into_owned())),
        FieldType::Boolean => Ok(Value::Bool(truthy(value))),
        FieldType::Select => match value {
            Value::Table(_) => Err(Error::coercion(field_type, value)),
            _ => Ok(value.clone()),
        },
        FieldType::SelectMultiple => to_list(field_type, value).map(|_| value.clone()),
        FieldType::Tabular => row_count(value).map(|_| value.clone()),
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

#[allow(clippy::cast_precision_loss)]
fn to_number(value: &Value) -> Result<f64> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::String(s) => match parse_number(s) {
            Some(Value::Int(i)) => Ok(i as f64),
            Some(Value::Float(f)) => Ok(f),
            _ => Err(Error::coercion(FieldType::Numeric, value)),
        },
        _ => Err(Error::coercion(FieldType::Numeric, value)),
    }
}

fn numbers(actual: &Value, expected: &Value) -> Result<(f64, f64)> {
    Ok((to_number(actual)?, to_number(expected)?))
}

fn numeric_equal_to(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = numbers(actual, expected)?;
    Ok((a - b).abs() <= EPSILON)
}

fn greater_than(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = numbers(actual, expected)?;
    Ok(a - b > EPSILON)
}

fn less_than(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = numbers(actual, expected)?;
    Ok(b - a > EPSILON)
}

fn greater_than_or_equal_to(actual: &Value, expected: &Value) -> Result<bool> {
    Ok(greater_than(actual, expected)? || numeric_equal_to(actual, expected)?)
}

fn less_than_or_equal_to(actual: &Value, expected: &Value) -> Result<bool> {
    Ok(less_than(actual, expected)? || numeric_equal_to(actual, expected)?)
}

/// Null reads as the empty string.
fn to_text(value: &Value) -> Result<Cow<'_, str>> {
    match value {
        Value::Null => Ok(Cow::Borrowed("")),
        Value::String(s) => Ok(Cow::Borrowed(s)),
        _ => Err(Error::coercion(FieldType::String, value)),
    }
}

fn texts<'a>(actual: &'a Value, expected: &'a Value) -> Result<(Cow<'a, str>, Cow<'a, str>)> {
    Ok((to_text(actual)?, to_text(expected)?))
}

fn string_equal_to(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = texts(actual, expected)?;
    Ok(a == b)
}

fn starts_with(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = texts(actual, expected)?;
    Ok(a.starts_with(&*b))
}

fn ends_with(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = texts(actual, expected)?;
    Ok(a.ends_with(&*b))
}

fn string_contains(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = texts(actual, expected)?;
    Ok(a.contains(&*b))
}

fn equal_to_case_insensitive(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = texts(actual, expected)?;
    Ok(a.to_lowercase() == b.to_lowercase())
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}

/// Unanchored: the pattern may match anywhere in the value.
fn matches_regex(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, pattern) = texts(actual, expected)?;
    Ok(compile_pattern(&pattern)?.is_match(&a))
}

fn non_empty(actual: &Value, _: &Value) -> Result<bool> {
    Ok(!to_text(actual)?.is_empty())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::List(items) => !items.is_empty(),
        Value::Table(rows) => !rows.is_empty(),
    }
}

fn is_true(actual: &Value, _: &Value) -> Result<bool> {
    Ok(truthy(actual))
}

fn is_false(actual: &Value, _: &Value) -> Result<bool> {
    Ok(!truthy(actual))
}

fn to_list(field_type: FieldType, value: &Value) -> Result<&[Value]> {
    match value {
        Value::List(items) => Ok(items),
        _ => Err(Error::coercion(field_type, value)),
    }
}

fn has_member(items: &[Value], candidate: &Value) -> bool {
    items.iter().any(|item| item.loose_eq(candidate))
}

fn select_contains(actual: &Value, expected: &Value) -> Result<bool> {
    Ok(has_member(to_list(FieldType::Select, actual)?, expected))
}

fn select_does_not_contain(actual: &Value, expected: &Value) -> Result<bool> {
    select_contains(actual, expected).map(|found| !found)
}

fn sets<'a>(actual: &'a Value, expected: &'a Value) -> Result<(&'a [Value], &'a [Value])> {
    Ok((
        to_list(FieldType::SelectMultiple, actual)?,
        to_list(FieldType::SelectMultiple, expected)?,
    ))
}

fn contains_all(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = sets(actual, expected)?;
    Ok(b.iter().all(|item| has_member(a, item)))
}

fn is_contained_by(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = sets(actual, expected)?;
    Ok(a.iter().all(|item| has_member(b, item)))
}

/// Distinct elements of `actual` that also appear in `expected`.
fn shared_count(actual: &[Value], expected: &[Value]) -> usize {
    let mut shared: Vec<&Value> = Vec::new();
    for item in actual {
        if has_member(expected, item) && !shared.iter().any(|s| s.loose_eq(item)) {
            shared.push(item);
        }
    }
    shared.len()
}

fn shares_at_least_one_element_with(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = sets(actual, expected)?;
    Ok(a.iter().any(|item| has_member(b, item)))
}

fn shares_exactly_one_element_with(actual: &Value, expected: &Value) -> Result<bool> {
    let (a, b) = sets(actual, expected)?;
    Ok(shared_count(a, b) == 1)
}

fn shares_no_elements_with(actual: &Value, expected: &Value) -> Result<bool> {
    shares_at_least_one_element_with(actual, expected).map(|shared| !shared)
}

fn row_count(value: &Value) -> Result<usize> {
    match value {
        Value::Null => Ok(0),
        Value::Table(rows) => Ok(rows.len()),
        Value::List(items) => Ok(items.len()),
        _ => Err(Error::coercion(FieldType::Tabular, value)),
    }
}

fn exists(actual: &Value, _: &Value) -> Result<bool> {
    Ok(row_count(actual)? > 0)
}

fn not_exists(actual: &Value, _: &Value) -> Result<bool> {
    Ok(row_count(actual)? == 0)
}
