use crate::operators::lookup_operator;
use crate::{Condition, Result, Value, Variables};

/// Evaluate a condition tree against a host's variables.
///
/// `All` stops at the first false child and `Any` at the first true one;
/// getters of children after that point are not called. Errors from any
/// leaf propagate unchanged.
///
/// # Errors
///
/// Returns [`Error::UnknownVariable`](crate::Error::UnknownVariable),
/// [`Error::UnknownOperator`](crate::Error::UnknownOperator),
/// [`Error::Coercion`](crate::Error::Coercion) or
/// [`Error::InvalidPattern`](crate::Error::InvalidPattern) from the first
/// leaf that fails.
pub fn evaluate<V: Variables>(condition: &Condition, variables: &V) -> Result<bool> {
    eval_node(condition, variables, &mut |_, _| {})
}

/// Like [`evaluate`], calling `observe` once per node that was actually
/// evaluated, children before their parent.
pub(crate) fn evaluate_observed<V: Variables>(
    condition: &Condition,
    variables: &V,
    observe: &mut dyn FnMut(&Condition, bool),
) -> Result<bool> {
    eval_node(condition, variables, observe)
}

fn eval_node<V: Variables>(
    node: &Condition,
    variables: &V,
    observe: &mut dyn FnMut(&Condition, bool),
) -> Result<bool> {
    let result = match node {
        Condition::All(children) => {
            let mut held = true;
            for child in children {
                if !eval_node(child, variables, observe)? {
                    held = false;
                    break;
                }
            }
            held
        }
        Condition::Any(children) => {
            let mut held = false;
            for child in children {
                if eval_node(child, variables, observe)? {
                    held = true;
                    break;
                }
            }
            held
        }
        Condition::Not(inner) => !eval_node(inner, variables, observe)?,
        Condition::Leaf {
            name,
            operator,
            value,
        } => eval_leaf(name, operator, value, variables)?,
    };
    observe(node, result);
    Ok(result)
}

fn eval_leaf<V: Variables>(name: &str, operator: &str, value: &Value, variables: &V) -> Result<bool> {
    let field_type = variables.field_type_of(name)?;
    let operator = lookup_operator(field_type, operator)?;
    let actual = variables.get(name)?;
    operator.apply(&actual, value)
}
