mod actions;
mod debug;
mod error;
mod evaluate;
pub mod operators;
mod runner;
mod schema;
mod trace;
mod types;
mod validate;
mod variables;

pub use actions::{
    ActionBuilder, ActionDescriptor, ActionRecord, ActionRegistry, ActionResults, Actions, Invoke,
    ParamSpec, Params,
};
pub use debug::{debug_enabled, enable_debug};
pub use error::{Error, Result};
pub use evaluate::evaluate;
pub use runner::{Runner, run_all};
pub use schema::{
    ActionSchema, OperatorSchema, ParamSchema, RuleSchema, VariableSchema, export_rule_data,
};
pub use trace::{ActionEvent, ConditionEvent, DebugTracer, TraceEvent, TraceLog, Tracer};
pub use types::{
    ActionInvocation, Condition, FieldType, Row, Rule, RuleBuilder, RuleSet, RuleSetBuilder,
    RunReport, Value, VariableExpr, variable,
};
pub use validate::validate_rules;
pub use variables::{Getter, VariableDescriptor, VariableRegistry, Variables};
