use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use rulebook::{
    ActionRegistry, Actions, FieldType, RuleSet, VariableRegistry, Variables, enable_debug,
    export_rule_data, run_all, validate_rules,
};

#[derive(Debug)]
struct Product {
    name: String,
    price: f64,
    inventory: i64,
}

struct ProductVariables(Rc<RefCell<Product>>);

impl Variables for ProductVariables {
    fn registry() -> &'static VariableRegistry<Self> {
        static REGISTRY: OnceLock<VariableRegistry<ProductVariables>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            VariableRegistry::<ProductVariables>::new()
                .numeric("current_inventory", |v| v.0.borrow().inventory.into())
                .string("product_name", |v| v.0.borrow().name.clone().into())
        })
    }
}

struct ProductActions(Rc<RefCell<Product>>);

impl Actions for ProductActions {
    fn registry() -> &'static ActionRegistry<Self> {
        static REGISTRY: OnceLock<ActionRegistry<ProductActions>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            ActionRegistry::<ProductActions>::new().action(
                "put_on_sale",
                |a| a.param("sale_percentage", FieldType::Numeric),
                |acts, params, _| {
                    acts.0.borrow_mut().price *= 1.0 - params.number("sale_percentage")?;
                    Ok(())
                },
            )
        })
    }
}

const RULES: &str = r#"[
    {
        "conditions": {"all": [
            {"name": "current_inventory", "operator": "greater_than", "value": 20},
            {"name": "product_name", "operator": "contains", "value": "Widget"}
        ]},
        "actions": [{"name": "put_on_sale", "params": {"sale_percentage": 0.25}}]
    }
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rulebook=debug".into()),
        )
        .init();

    let schema = export_rule_data::<ProductVariables, ProductActions>();
    println!("{}", serde_json::to_string_pretty(&schema)?);

    let rules = RuleSet::from_json(RULES)?;
    validate_rules::<ProductVariables, ProductActions>(rules.rules())?;
    println!("{rules}");
    println!("reads: {}", rules.referenced_variables().join(", "));

    let product = Rc::new(RefCell::new(Product {
        name: "Super Widget".to_owned(),
        price: 100.0,
        inventory: 50,
    }));
    let variables = ProductVariables(Rc::clone(&product));
    let mut actions = ProductActions(Rc::clone(&product));

    enable_debug(true);
    let triggered = run_all(&rules, &variables, &mut actions, false)?;

    println!("triggered: {triggered}");
    println!("{:?}", product.borrow());
    Ok(())
}
