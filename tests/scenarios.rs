
use fixtures::{Product, bind, order_row};
use rulebook::{
    ActionResults, Condition, DebugTracer, Error, FieldType, RuleSet, RuleSetBuilder, Runner,
    TraceLog, Tracer, Value, run_all, variable,
};
use serde_json::json;

fn quick_start_rules() -> RuleSet {
    RuleSet::from_json(
        r#"[
            {
                "conditions": {"all": [
                    {"name": "current_inventory", "operator": "greater_than", "value": 20},
                    {"name": "product_name", "operator": "contains", "value": "Widget"}
                ]},
                "actions": [{"name": "put_on_sale", "params": {"sale_percentage": 0.25}}]
            },
            {
                "conditions": {"any": [
                    {"name": "current_inventory", "operator": "less_than", "value": 5},
                    {"name": "current_month", "operator": "equal_to", "value": "December"}
                ]},
                "actions": [{"name": "order_more", "params": {"number_to_order": 40}}]
            }
        ]"#,
    )
    .unwrap()
}

#[test]
fn sale_applies_to_well_stocked_widget() {
    let (product, variables, mut actions) = bind(Product {
        inventory: 50,
        ..Product::default()
    });

    let triggered = run_all(&quick_start_rules(), &variables, &mut actions, false).unwrap();

    assert!(triggered);
    let product = product.borrow();
    assert!((product.price - 75.0).abs() < 1e-9);
    assert!(product.orders_placed.is_empty());
}

#[test]
fn low_stock_orders_more_exactly_once() {
    let (product, variables, mut actions) = bind(Product {
        inventory: 3,
        ..Product::default()
    });

    run_all(&quick_start_rules(), &variables, &mut actions, false).unwrap();

    let product = product.borrow();
    assert_eq!(product.orders_placed, [40]);
    assert!((product.price - 100.0).abs() < 1e-9);
}

#[test]
fn negated_condition_blocks_action() {
    let (product, variables, mut actions) = bind(Product {
        inventory: 150,
        ..Product::default()
    });
    let rules = RuleSetBuilder::new()
        .rule(|r| {
            r.when(!variable("current_inventory").greater_than(100_i64))
                .then("order_more", |a| a.param("number_to_order", 10_i64))
        })
        .build()
        .unwrap();

    let triggered = run_all(&rules, &variables, &mut actions, false).unwrap();

    assert!(!triggered);
    assert!(product.borrow().orders_placed.is_empty());
}

#[test]
fn later_rules_see_earlier_side_effects() {
    let (product, variables, mut actions) = bind(Product::default());
    let rules = RuleSetBuilder::new()
        .rule(|r| {
            r.when(variable("price").op("greater_than_or_equal_to", 100_i64))
                .then("put_on_sale", |a| a.param("sale_percentage", 0.5))
        })
        .rule(|r| {
            r.when(variable("price").less_than(60_i64))
                .then("notify_manager", |a| a.param("message", "price dropped"))
        })
        .build()
        .unwrap();

    run_all(&rules, &variables, &mut actions, false).unwrap();

    assert_eq!(product.borrow().notes, ["price dropped"]);
}

#[test]
fn short_circuit_skips_second_getter() {
    let (_, variables, mut actions) = bind(Product {
        inventory: 1,
        ..Product::default()
    });
    let rules = [rulebook::Rule::new(
        Condition::all([
            variable("current_inventory").greater_than(20_i64),
            variable("product_name").contains("Widget"),
        ]),
        vec![],
    )];

    run_all(&rules, &variables, &mut actions, false).unwrap();

    assert_eq!(variables.reads(), 1);
}

#[test]
fn stop_on_first_trigger_evaluates_prefix_only() {
    let (product, variables, mut actions) = bind(Product::default());
    let rules = RuleSetBuilder::new()
        .rule(|r| r.when(variable("on_clearance").check("is_true")).then_do("clear_tags"))
        .rule(|r| {
            r.when(variable("current_inventory").equal_to(50_i64))
                .then("order_more", |a| a.param("number_to_order", 1_i64))
        })
        .rule(|r| r.when(Condition::all([])).then_do("notify_manager"))
        .build()
        .unwrap();

    let report = Runner::new()
        .debug(false)
        .stop_on_first_trigger(true)
        .run(&rules, &variables, &mut actions)
        .unwrap();

    assert_eq!(report.evaluated(), &[0, 1]);
    assert_eq!(report.triggered(), &[1]);
    assert_eq!(report.actions_invoked(), 1);
    let product = product.borrow();
    assert_eq!(product.orders_placed, [1]);
    assert!(product.notes.is_empty());
    assert_eq!(product.tags, ["gadget"]);
}

#[test]
fn without_stop_every_triggered_rule_runs() {
    let (product, variables, mut actions) = bind(Product::default());
    let rules = RuleSetBuilder::new()
        .rule(|r| r.when(Condition::all([])).then_do("notify_manager"))
        .rule(|r| r.when(Condition::all([])).then_do("notify_manager"))
        .build()
        .unwrap();

    run_all(&rules, &variables, &mut actions, false).unwrap();

    assert_eq!(product.borrow().notes.len(), 2);
}

#[test]
fn repeated_action_runs_each_time() {
    let (product, variables, mut actions) = bind(Product::default());
    let rules = RuleSet::from_json(
        r#"[{
            "conditions": {"all": []},
            "actions": [
                ["order_more", {"number_to_order": 5}],
                {"action": "order_more", "params": {"number_to_order": "7"}}
            ]
        }]"#,
    )
    .unwrap();

    run_all(&rules, &variables, &mut actions, false).unwrap();

    assert_eq!(product.borrow().orders_placed, [5, 7]);
}

#[test]
fn numeric_leaf_against_word_is_coercion_error() {
    let (_, variables, mut actions) = bind(Product::default());
    let rules = [rulebook::Rule::new(
        variable("current_inventory").equal_to("plenty"),
        vec![],
    )];

    let err = run_all(&rules, &variables, &mut actions, false).unwrap_err();

    assert!(matches!(
        err,
        Error::Coercion {
            expected: FieldType::Numeric,
            ..
        }
    ));
}

#[test]
fn unbalanced_regex_is_invalid_pattern() {
    let (_, variables, mut actions) = bind(Product::default());
    let rules = [rulebook::Rule::new(
        variable("product_name").op("matches_regex", "Super (Widget"),
        vec![],
    )];

    let err = run_all(&rules, &variables, &mut actions, false).unwrap_err();

    assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "Super (Widget"));
}

#[test]
fn failing_rule_aborts_remaining_rules() {
    let (product, variables, mut actions) = bind(Product::default());
    let rules = RuleSetBuilder::new()
        .rule(|r| r.when(variable("ghost").check("exists")).then_do("clear_tags"))
        .rule(|r| r.when(Condition::all([])).then_do("notify_manager"))
        .build()
        .unwrap();

    let err = run_all(&rules, &variables, &mut actions, false).unwrap_err();

    assert!(matches!(err, Error::UnknownVariable { ref name } if name == "ghost"));
    assert!(product.borrow().notes.is_empty());
}

#[test]
fn action_param_errors_surface_from_run() {
    let (_, variables, mut actions) = bind(Product::default());
    let always = || Condition::all([]);

    let missing = [rulebook::Rule::new(
        always(),
        vec![rulebook::ActionInvocation::new("put_on_sale")],
    )];
    assert!(matches!(
        run_all(&missing, &variables, &mut actions, false),
        Err(Error::MissingParam { .. })
    ));

    let unexpected = [rulebook::Rule::new(
        always(),
        vec![rulebook::ActionInvocation::new("clear_tags").param("all", true)],
    )];
    assert!(matches!(
        run_all(&unexpected, &variables, &mut actions, false),
        Err(Error::UnexpectedParam { .. })
    ));

    let unknown = [rulebook::Rule::new(
        always(),
        vec![rulebook::ActionInvocation::new("discontinue")],
    )];
    assert!(matches!(
        run_all(&unknown, &variables, &mut actions, false),
        Err(Error::UnknownAction { .. })
    ));
}

#[test]
fn select_and_tabular_variables() {
    let (product, variables, mut actions) = bind(Product {
        recent_orders: vec![order_row(3), order_row(1)],
        tags: vec!["kitchen".to_owned(), "gift".to_owned()],
        ..Product::default()
    });
    let rules = RuleSet::from_json(
        r#"[{
            "conditions": {"all": [
                {"name": "sizes", "operator": "contains", "value": "L"},
                {"name": "sizes", "operator": "does_not_contain", "value": "XL"},
                {"name": "tags", "operator": "shares_exactly_one_element_with", "value": ["gift", "outdoor"]},
                {"name": "recent_orders", "operator": "exists"},
                {"not": {"name": "on_clearance", "operator": "is_true"}}
            ]},
            "actions": "clear_tags"
        }]"#,
    )
    .unwrap();

    assert!(run_all(&rules, &variables, &mut actions, false).unwrap());
    assert!(product.borrow().tags.is_empty());
}

#[test]
fn results_accumulator_collects_outcomes() {
    let (_, variables, mut actions) = bind(Product {
        inventory: 3,
        ..Product::default()
    });
    let mut results = ActionResults::new();

    let report = Runner::new()
        .debug(false)
        .results(&mut results)
        .run(&quick_start_rules(), &variables, &mut actions)
        .unwrap();

    assert_eq!(report.triggered(), &[1]);
    assert_eq!(results.len(), 1);
    assert_eq!(results.records()[0].action, "order_more");
    assert_eq!(results.records()[0].outcome, json!({ "ordered": 40 }));
}

#[test]
fn trace_log_matches_evaluation_order() {
    let (_, variables, mut actions) = bind(Product {
        inventory: 3,
        ..Product::default()
    });
    let mut log = TraceLog::new();

    let report = Runner::new()
        .debug(false)
        .tracer(&mut log)
        .run(&quick_start_rules(), &variables, &mut actions)
        .unwrap();
    assert_eq!(report.evaluated(), &[0, 1]);

    let conditions: Vec<(usize, &str, bool)> = log
        .conditions()
        .map(|c| (c.rule_index, c.node.as_str(), c.result))
        .collect();
    assert_eq!(
        conditions,
        [
            (0, "current_inventory greater_than 20", false),
            (0, "all of 2", false),
            (1, "current_inventory less_than 5", true),
            (1, "any of 2", true),
        ]
    );
    let action = log.actions().next().unwrap();
    assert_eq!(action.rule_index, 1);
    assert_eq!(action.params.get("number_to_order"), Some(&Value::Int(40)));
}

#[test]
fn tracing_does_not_change_outcome() {
    let run = |traced: bool| {
        let (product, variables, mut actions) = bind(Product {
            inventory: 3,
            month: "December".to_owned(),
            ..Product::default()
        });
        let mut log = TraceLog::new();
        let mut runner = Runner::new().debug(false);
        if traced {
            runner = runner.tracer(&mut log);
        }
        let report = runner
            .run(&quick_start_rules(), &variables, &mut actions)
            .unwrap();
        let product = product.borrow().clone();
        (report.triggered().to_vec(), product)
    };

    assert_eq!(run(true), run(false));
}

#[test]
fn debug_tracer_writes_fixed_lines() {
    let (_, variables, mut actions) = bind(Product {
        inventory: 3,
        ..Product::default()
    });
    let mut tracer = DebugTracer::new(Vec::new());

    let report = Runner::new()
        .debug(false)
        .tracer(&mut tracer as &mut dyn Tracer)
        .run(&quick_start_rules().rules()[1..], &variables, &mut actions)
        .unwrap();
    assert!(report.triggered_any());

    let out = String::from_utf8(tracer.into_inner()).unwrap();
    assert_eq!(
        out,
        "rule 0: current_inventory less_than 5 => true\n\
         rule 0: any of 2 => true\n\
         rule 0: action order_more {\"number_to_order\":40}\n"
    );
}
