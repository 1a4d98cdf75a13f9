use std::fmt;

use crate::schema::pretty_label;
use crate::{Error, FieldType, Result, Value};

/// Reads one variable's current value from a bound host object.
pub type Getter<T> = fn(&T) -> Value;

/// Metadata and getter for one named variable.
pub struct VariableDescriptor<T> {
    name: String,
    label: String,
    field_type: FieldType,
    options: Vec<Value>,
    getter: Getter<T>,
}

impl<T> VariableDescriptor<T> {
    /// Declare a variable. The label defaults to the title-cased name.
    #[must_use]
    pub fn new(name: &str, field_type: FieldType, getter: Getter<T>) -> Self {
        Self {
            name: name.to_owned(),
            label: pretty_label(name),
            field_type,
            options: Vec::new(),
            getter,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    /// Allowed values offered to rule authors. Only meaningful for the
    /// select field types.
    #[must_use]
    pub fn with_options<V: Into<Value>>(mut self, options: impl IntoIterator<Item = V>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

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
    pub fn options(&self) -> &[Value] {
        &self.options
    }

    /// Call the getter. Never cached.
    pub fn read(&self, target: &T) -> Value {
        (self.getter)(target)
    }
}

impl<T> fmt::Debug for VariableDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("field_type", &self.field_type)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// The variables a host type exposes to rules, in declaration order.
///
/// Built once per host type and shared by every instance; see [`Variables`].
///
/// # Example
///
/// ```
/// use std::sync::OnceLock;
/// use rulebook::{Value, VariableRegistry, Variables};
///
/// struct Inventory {
///     count: i64,
/// }
///
/// impl Variables for Inventory {
///     fn registry() -> &'static VariableRegistry<Self> {
///         static REGISTRY: OnceLock<VariableRegistry<Inventory>> = OnceLock::new();
///         REGISTRY.get_or_init(|| {
///             VariableRegistry::<Inventory>::new().numeric("count", |inv| inv.count.into())
///         })
///     }
/// }
///
/// let inv = Inventory { count: 3 };
/// assert_eq!(inv.get("count").unwrap(), Value::Int(3));
/// ```
pub struct VariableRegistry<T> {
    descriptors: Vec<VariableDescriptor<T>>,
}

impl<T> Default for VariableRegistry<T> {
    fn default() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }
}

impl<T> VariableRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable.
    ///
    /// # Panics
    ///
    /// Panics if a variable with the same name is already registered.
    #[must_use]
    pub fn declare(mut self, descriptor: VariableDescriptor<T>) -> Self {
        assert!(
            self.descriptor(descriptor.name()).is_none(),
            "variable '{}' declared twice",
            descriptor.name()
        );
        self.descriptors.push(descriptor);
        self
    }

    #[must_use]
    pub fn numeric(self, name: &str, getter: Getter<T>) -> Self {
        self.declare(VariableDescriptor::new(name, FieldType::Numeric, getter))
    }

    #[must_use]
    pub fn string(self, name: &str, getter: Getter<T>) -> Self {
        self.declare(VariableDescriptor::new(name, FieldType::String, getter))
    }

    #[must_use]
    pub fn boolean(self, name: &str, getter: Getter<T>) -> Self {
        self.declare(VariableDescriptor::new(name, FieldType::Boolean, getter))
    }

    #[must_use]
    pub fn select<V: Into<Value>>(
        self,
        name: &str,
        options: impl IntoIterator<Item = V>,
        getter: Getter<T>,
    ) -> Self {
        self.declare(VariableDescriptor::new(name, FieldType::Select, getter).with_options(options))
    }

    #[must_use]
    pub fn select_multiple<V: Into<Value>>(
        self,
        name: &str,
        options: impl IntoIterator<Item = V>,
        getter: Getter<T>,
    ) -> Self {
        self.declare(
            VariableDescriptor::new(name, FieldType::SelectMultiple, getter).with_options(options),
        )
    }

    #[must_use]
    pub fn tabular(self, name: &str, getter: Getter<T>) -> Self {
        self.declare(VariableDescriptor::new(name, FieldType::Tabular, getter))
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&VariableDescriptor<T>> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    fn require(&self, name: &str) -> Result<&VariableDescriptor<T>> {
        self.descriptor(name).ok_or_else(|| Error::UnknownVariable {
            name: name.to_owned(),
        })
    }

    /// Read a variable's current value from `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVariable`] if `name` is not registered.
    pub fn get(&self, target: &T, name: &str) -> Result<Value> {
        Ok(self.require(name)?.read(target))
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownVariable`] if `name` is not registered.
    pub fn field_type_of(&self, name: &str) -> Result<FieldType> {
        Ok(self.require(name)?.field_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableDescriptor<T>> {
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

impl<T> fmt::Debug for VariableRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.descriptors).finish()
    }
}

/// A host type whose instances expose named, typed values to rules.
///
/// Implementors are usually thin views over a domain object, constructed per
/// evaluation. The registry is per type, so schema export needs no instance.
pub trait Variables: Sized + 'static {
    fn registry() -> &'static VariableRegistry<Self>;

    /// # Errors
    ///
    /// Returns [`Error::UnknownVariable`] if `name` is not registered.
    fn get(&self, name: &str) -> Result<Value> {
        Self::registry().get(self, name)
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownVariable`] if `name` is not registered.
    fn field_type_of(&self, name: &str) -> Result<FieldType> {
        Self::registry().field_type_of(name)
    }
}
