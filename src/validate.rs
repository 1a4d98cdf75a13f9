use crate::operators::lookup_operator;
use crate::{Actions, Condition, Result, Rule, Variables};

/// Check rules against the registrations of `V` and `A` without binding any
/// host instance.
///
/// Catches what a run would otherwise report part way through: unknown
/// variables, operators and actions, parameter schema mismatches, operands
/// that cannot be coerced and malformed regex patterns. Variable values are
/// never read, so a rule that validates can still fail on a getter's value.
///
/// # Errors
///
/// Returns the first problem found, in rule order, as the same [`Error`]
/// kind a run would raise.
///
/// [`Error`]: crate::Error
pub fn validate_rules<V: Variables, A: Actions>(rules: &[Rule]) -> Result<()> {
    for rule in rules {
        check_condition::<V>(&rule.conditions)?;
        check_actions::<A>(rule)?;
    }
    Ok(())
}

fn check_condition<V: Variables>(condition: &Condition) -> Result<()> {
    match condition {
        Condition::All(children) | Condition::Any(children) => children
            .iter()
            .try_for_each(|child| check_condition::<V>(child)),
        Condition::Not(inner) => check_condition::<V>(inner),
        Condition::Leaf {
            name,
            operator,
            value,
        } => {
            let field_type = V::registry().field_type_of(name)?;
            lookup_operator(field_type, operator)?.check_operand(value)
        }
    }
}

fn check_actions<A: Actions>(rule: &Rule) -> Result<()> {
    for invocation in &rule.actions {
        A::registry().prepare(invocation)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::{ActionInvocation, ActionRegistry, Error, FieldType, VariableRegistry, variable};

    struct Host;

    impl Variables for Host {
        fn registry() -> &'static VariableRegistry<Self> {
            static REGISTRY: OnceLock<VariableRegistry<Host>> = OnceLock::new();
            REGISTRY.get_or_init(|| {
                VariableRegistry::<Host>::new()
                    .numeric("stock", |_| panic!("validation must not read values"))
                    .string("name", |_| panic!("validation must not read values"))
                    .select_multiple("tags", ["a", "b"], |_| {
                        panic!("validation must not read values")
                    })
            })
        }
    }

    impl Actions for Host {
        fn registry() -> &'static ActionRegistry<Self> {
            static REGISTRY: OnceLock<ActionRegistry<Host>> = OnceLock::new();
            REGISTRY.get_or_init(|| {
                ActionRegistry::<Host>::new().action(
                    "restock",
                    |a| a.param("amount", FieldType::Numeric),
                    |_, _, _| Ok(()),
                )
            })
        }
    }

    fn rule(condition: Condition, actions: Vec<ActionInvocation>) -> Rule {
        Rule::new(condition, actions)
    }

    #[test]
    fn valid_rules_pass() {
        let rules = [rule(
            Condition::all([
                variable("stock").less_than(5_i64),
                variable("name").op("matches_regex", "^Super"),
                variable("tags").op("contains_all", vec!["a"]),
            ]),
            vec![ActionInvocation::new("restock").param("amount", "40")],
        )];
        validate_rules::<Host, Host>(&rules).unwrap();
    }

    #[test]
    fn reports_unknown_names() {
        let unknown_var = [rule(variable("weight").equal_to(1_i64), vec![])];
        assert!(matches!(
            validate_rules::<Host, Host>(&unknown_var),
            Err(Error::UnknownVariable { .. })
        ));

        let unknown_op = [rule(variable("stock").op("starts_with", "1"), vec![])];
        assert!(matches!(
            validate_rules::<Host, Host>(&unknown_op),
            Err(Error::UnknownOperator { .. })
        ));

        let unknown_action = [rule(Condition::all([]), vec![ActionInvocation::new("launch")])];
        assert!(matches!(
            validate_rules::<Host, Host>(&unknown_action),
            Err(Error::UnknownAction { .. })
        ));
    }

    #[test]
    fn reports_bad_operands() {
        let not_a_number = [rule(variable("stock").greater_than("lots"), vec![])];
        assert!(matches!(
            validate_rules::<Host, Host>(&not_a_number),
            Err(Error::Coercion { .. })
        ));

        let bad_pattern = [rule(variable("name").op("matches_regex", "(unclosed"), vec![])];
        assert!(matches!(
            validate_rules::<Host, Host>(&bad_pattern),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn reports_param_mismatch() {
        let missing = [rule(Condition::all([]), vec![ActionInvocation::new("restock")])];
        assert!(matches!(
            validate_rules::<Host, Host>(&missing),
            Err(Error::MissingParam { .. })
        ));
    }

    #[test]
    fn nested_nodes_are_checked() {
        let rules = [rule(
            Condition::any([Condition::all([]), !variable("ghost").check("exists")]),
            vec![],
        )];
        assert!(matches!(
            validate_rules::<Host, Host>(&rules),
            Err(Error::UnknownVariable { .. })
        ));
    }
}
