mod condition;
mod field_type;
mod rule;
mod ruleset;
mod run_report;
mod value;

pub use condition::{Condition, VariableExpr, variable};
pub use field_type::FieldType;
pub use rule::{ActionInvocation, Rule};
pub use ruleset::{RuleBuilder, RuleSet, RuleSetBuilder};
pub use run_report::RunReport;
pub use value::{Row, Value};
