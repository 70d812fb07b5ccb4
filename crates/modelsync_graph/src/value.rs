//! Dynamic value model and metadata-annotated instances.

use crate::error::{GraphError, GraphResult};
use chrono::{DateTime, FixedOffset};
use modelsync_schema::ClassDescriptor;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A shared, mutable instance.
///
/// Multiple graph nodes and external observers may hold the same reference;
/// merge operations mutate the instance in place so those references stay
/// valid across reloads.
pub type InstanceRef = Arc<RwLock<Instance>>;

/// A dynamic runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null sentinel. Every declared property holds at least this.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. All wire numbers are carried as `f64`.
    Number(f64),
    /// A text string.
    String(String),
    /// A point in time.
    Date(DateTime<FixedOffset>),
    /// A reference to a metadata-annotated object.
    Object(InstanceRef),
    /// An ordered collection of values.
    List(Vec<Value>),
}

impl Value {
    /// Returns true for the null sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the string content, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric content, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean content, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrows the object reference, if any.
    pub fn as_object(&self) -> Option<&InstanceRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrows the list content, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short human-readable label for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Object(_) => "object",
            Value::List(_) => "collection",
        }
    }
}

impl PartialEq for Value {
    /// Scalars and lists compare structurally; objects compare by identity.
    ///
    /// Identity comparison for objects keeps equality total on cyclic
    /// graphs: structurally-equal-but-distinct objects are distinct.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// A data object annotated with its class descriptor.
///
/// Every property declared by the class is always present in the value map;
/// unset properties hold [`Value::Null`]. The generation counter increments
/// on every mutation and serves as a cheap change-detection hook for the
/// synchronization schedulers.
#[derive(Debug)]
pub struct Instance {
    class: Arc<ClassDescriptor>,
    values: BTreeMap<String, Value>,
    generation: u64,
}

impl Instance {
    /// Creates an instance with every declared property set to null.
    pub fn new(class: Arc<ClassDescriptor>) -> Self {
        let values = class
            .properties()
            .iter()
            .map(|p| (p.name.clone(), Value::Null))
            .collect();
        Self {
            class,
            values,
            generation: 0,
        }
    }

    /// Creates a shared instance with every declared property set to null.
    pub fn new_shared(class: Arc<ClassDescriptor>) -> InstanceRef {
        Arc::new(RwLock::new(Self::new(class)))
    }

    /// The class descriptor this instance is annotated with.
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// Reads a property value. Undeclared names return `None`.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    /// Writes a property value, bumping the generation counter.
    ///
    /// Writing an undeclared property fails with
    /// [`GraphError::UnknownProperty`].
    pub fn set(&mut self, property: &str, value: Value) -> GraphResult<()> {
        if self.class.property(property).is_none() {
            return Err(GraphError::UnknownProperty {
                class: self.class.name.clone(),
                property: property.into(),
            });
        }
        self.values.insert(property.into(), value);
        self.generation += 1;
        Ok(())
    }

    /// The current value of the primary-key property, for entity classes.
    pub fn primary_key(&self) -> Option<Value> {
        let key = self.class.key_property()?;
        self.values.get(&key.name).cloned()
    }

    /// Monotonic mutation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsync_schema::{PropertyDescriptor, TypeDescriptor};

    fn person() -> Arc<ClassDescriptor> {
        Arc::new(ClassDescriptor::model(
            "Person",
            "People",
            "personId",
            vec![
                PropertyDescriptor::primary_key("personId", TypeDescriptor::Number),
                PropertyDescriptor::value("name", TypeDescriptor::String),
            ],
        ))
    }

    #[test]
    fn new_instance_initializes_all_properties() {
        let instance = Instance::new(person());
        assert!(instance.get("personId").unwrap().is_null());
        assert!(instance.get("name").unwrap().is_null());
        assert!(instance.get("other").is_none());
    }

    #[test]
    fn set_bumps_generation_and_rejects_unknown_properties() {
        let mut instance = Instance::new(person());
        assert_eq!(instance.generation(), 0);
        instance.set("name", "Ada".into()).unwrap();
        assert_eq!(instance.generation(), 1);
        assert_eq!(instance.get("name").unwrap().as_str(), Some("Ada"));

        let err = instance.set("nope", Value::Null).unwrap_err();
        assert!(matches!(err, GraphError::UnknownProperty { .. }));
        assert_eq!(instance.generation(), 1);
    }

    #[test]
    fn primary_key_reads_through_class_metadata() {
        let mut instance = Instance::new(person());
        assert!(instance.primary_key().unwrap().is_null());
        instance.set("personId", 7i64.into()).unwrap();
        assert_eq!(instance.primary_key().unwrap().as_f64(), Some(7.0));
    }

    #[test]
    fn object_equality_is_identity() {
        let a = Instance::new_shared(person());
        let b = Instance::new_shared(person());
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }
}
