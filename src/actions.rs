use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::operators::coerce;
use crate::schema::pretty_label;
use crate::{ActionInvocation, Error, FieldType, Result, Value};

/// Performs one action against a bound host object.
pub type Invoke<T> = fn(&mut T, &Params, Option<&mut ActionResults>) -> Result<()>;

/// One declared parameter of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    name: String,
    label: String,
    field_type: FieldType,
    required: bool,
}

impl ParamSpec {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }
}

/// Label and parameter schema for an action, filled in by the closure passed
/// to [`ActionRegistry::action`].
#[derive(Debug)]
pub struct ActionBuilder {
    name: String,
    label: String,
    params: Vec<ParamSpec>,
}

impl ActionBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            label: pretty_label(name),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    /// Declare a required parameter.
    ///
    /// # Panics
    ///
    /// Panics if the action already declares a parameter with this name.
    #[must_use]
    pub fn param(self, name: &str, field_type: FieldType) -> Self {
        self.push(name, field_type, true)
    }

    /// Declare a parameter that rules may omit.
    ///
    /// # Panics
    ///
    /// Panics if the action already declares a parameter with this name.
    #[must_use]
    pub fn optional_param(self, name: &str, field_type: FieldType) -> Self {
        self.push(name, field_type, false)
    }

    fn push(mut self, name: &str, field_type: FieldType, required: bool) -> Self {
        assert!(
            self.params.iter().all(|p| p.name != name),
            "action '{}' declares parameter '{name}' twice",
            self.name
        );
        self.params.push(ParamSpec {
            name: name.to_owned(),
            label: pretty_label(name),
            field_type,
            required,
        });
        self
    }
}

/// Metadata and entry point for one named action.
pub struct ActionDescriptor<T> {
    name: String,
    label: String,
    params: Vec<ParamSpec>,
    invoke: Invoke<T>,
}

impl<T> ActionDescriptor<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declared parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Check literal parameters against the schema and coerce each one to
    /// its declared field type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedParam`], [`Error::MissingParam`] or
    /// [`Error::Coercion`].
    pub fn resolve(&self, literals: &BTreeMap<String, Value>) -> Result<Params> {
        if let Some(extra) = literals
            .keys()
            .find(|key| self.params.iter().all(|p| &p.name != *key))
        {
            return Err(Error::UnexpectedParam {
                action: self.name.clone(),
                param: extra.clone(),
            });
        }

        let mut values = BTreeMap::new();
        for spec in &self.params {
            match literals.get(&spec.name) {
                Some(literal) => {
                    values.insert(spec.name.clone(), coerce(spec.field_type, literal)?);
                }
                None if spec.required => {
                    return Err(Error::MissingParam {
                        action: self.name.clone(),
                        param: spec.name.clone(),
                    });
                }
                None => {}
            }
        }

        Ok(Params {
            action: self.name.clone(),
            values,
        })
    }

    /// Run the action with already resolved parameters.
    ///
    /// # Errors
    ///
    /// Propagates whatever the action itself returns.
    pub fn call(
        &self,
        target: &mut T,
        params: &Params,
        results: Option<&mut ActionResults>,
    ) -> Result<()> {
        (self.invoke)(target, params, results)
    }
}

impl<T> fmt::Debug for ActionDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// The actions a host type exposes to rules, in declaration order.
///
/// # Example
///
/// ```
/// use std::sync::OnceLock;
/// use rulebook::{ActionInvocation, ActionRegistry, Actions, FieldType};
///
/// struct Till {
///     price: f64,
/// }
///
/// impl Actions for Till {
///     fn registry() -> &'static ActionRegistry<Self> {
///         static REGISTRY: OnceLock<ActionRegistry<Till>> = OnceLock::new();
///         REGISTRY.get_or_init(|| {
///             ActionRegistry::<Till>::new().action(
///                 "put_on_sale",
///                 |a| a.param("sale_percentage", FieldType::Numeric),
///                 |till, params, _| {
///                     till.price *= 1.0 - params.number("sale_percentage")?;
///                     Ok(())
///                 },
///             )
///         })
///     }
/// }
///
/// let mut till = Till { price: 100.0 };
/// let sale = ActionInvocation::new("put_on_sale").param("sale_percentage", 0.25);
/// till.invoke(&sale, None).unwrap();
/// assert!((till.price - 75.0).abs() < 1e-9);
/// ```
pub struct ActionRegistry<T> {
    descriptors: Vec<ActionDescriptor<T>>,
}

impl<T> Default for ActionRegistry<T> {
    fn default() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }
}

impl<T> ActionRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action. `schema` sets the label and declares parameters.
    ///
    /// # Panics
    ///
    /// Panics if an action with the same name is already registered.
    #[must_use]
    pub fn action(
        mut self,
        name: &str,
        schema: impl FnOnce(ActionBuilder) -> ActionBuilder,
        invoke: Invoke<T>,
    ) -> Self {
        assert!(
            self.descriptor(name).is_none(),
            "action '{name}' declared twice"
        );
        let ActionBuilder {
            name,
            label,
            params,
        } = schema(ActionBuilder::new(name));
        self.descriptors.push(ActionDescriptor {
            name,
            label,
            params,
            invoke,
        });
        self
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&ActionDescriptor<T>> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Resolve an invocation to its descriptor and coerced parameters
    /// without running it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] for an unregistered name, otherwise
    /// the errors of [`ActionDescriptor::resolve`].
    pub fn prepare(&self, invocation: &ActionInvocation) -> Result<(&ActionDescriptor<T>, Params)> {
        let descriptor = self
            .descriptor(&invocation.name)
            .ok_or_else(|| Error::UnknownAction {
                name: invocation.name.clone(),
            })?;
        let params = descriptor.resolve(&invocation.params)?;
        Ok((descriptor, params))
    }

    /// Resolve and run one invocation against `target`.
    ///
    /// # Errors
    ///
    /// See [`prepare`](Self::prepare); errors returned by the action
    /// propagate unchanged.
    pub fn invoke(
        &self,
        target: &mut T,
        invocation: &ActionInvocation,
        results: Option<&mut ActionResults>,
    ) -> Result<()> {
        let (descriptor, params) = self.prepare(invocation)?;
        descriptor.call(target, &params, results)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor<T>> {
        self.descriptors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<T> fmt::Debug for ActionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.descriptors).finish()
    }
}

/// A host type whose instances carry out rule actions.
pub trait Actions: Sized + 'static {
    fn registry() -> &'static ActionRegistry<Self>;

    /// # Errors
    ///
    /// See [`ActionRegistry::invoke`].
    fn invoke(
        &mut self,
        invocation: &ActionInvocation,
        results: Option<&mut ActionResults>,
    ) -> Result<()> {
        Self::registry().invoke(self, invocation, results)
    }
}

/// Coerced parameter values handed to an action.
///
/// Optional parameters the rule omitted are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    action: String,
    values: BTreeMap<String, Value>,
}

impl Params {
    /// Name of the action these parameters belong to.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.values.get(name).ok_or_else(|| Error::MissingParam {
            action: self.action.clone(),
            param: name.to_owned(),
        })
    }

    /// # Errors
    ///
    /// [`Error::MissingParam`] if absent, [`Error::Coercion`] if not a number.
    #[allow(clippy::cast_precision_loss)]
    pub fn number(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            Value::Int(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            other => Err(Error::coercion(FieldType::Numeric, other)),
        }
    }

    /// Like [`number`](Self::number) but rejects fractional values.
    ///
    /// # Errors
    ///
    /// [`Error::MissingParam`] if absent, [`Error::Coercion`] if not a whole
    /// number.
    #[allow(clippy::cast_possible_truncation)]
    pub fn int(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            Value::Int(i) => Ok(*i),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(*f as i64),
            other => Err(Error::coercion(FieldType::Numeric, other)),
        }
    }

    /// # Errors
    ///
    /// [`Error::MissingParam`] if absent, [`Error::Coercion`] if not a string.
    pub fn text(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            Value::String(s) => Ok(s),
            other => Err(Error::coercion(FieldType::String, other)),
        }
    }

    /// # Errors
    ///
    /// [`Error::MissingParam`] if absent, [`Error::Coercion`] if not a bool.
    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.require(name)? {
            Value::Bool(b) => Ok(*b),
            other => Err(Error::coercion(FieldType::Boolean, other)),
        }
    }

    /// # Errors
    ///
    /// [`Error::MissingParam`] if absent, [`Error::Coercion`] if not a list.
    pub fn list(&self, name: &str) -> Result<&[Value]> {
        match self.require(name)? {
            Value::List(items) => Ok(items),
            other => Err(Error::coercion(FieldType::SelectMultiple, other)),
        }
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// One structured outcome recorded by an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub action: String,
    pub outcome: serde_json::Value,
}

/// Caller-owned, append-only log that actions may write outcomes into.
///
/// The engine only passes it through; it never reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionResults {
    records: Vec<ActionRecord>,
}

impl ActionResults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: &str, outcome: serde_json::Value) {
        self.records.push(ActionRecord {
            action: action.to_owned(),
            outcome,
        });
    }

    #[must_use]
    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    /// Outcomes recorded under one action name, oldest first.
    pub fn for_action<'a>(
        &'a self,
        action: &'a str,
    ) -> impl Iterator<Item = &'a serde_json::Value> + 'a {
        self.records
            .iter()
            .filter(move |r| r.action == action)
            .map(|r| &r.outcome)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
