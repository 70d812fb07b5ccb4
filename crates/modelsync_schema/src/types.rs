//! Type descriptors.

use crate::enums::EnumDescriptor;
use std::sync::Arc;

/// Describes the shape of a single value.
///
/// Object and entity types are referenced by name and resolved through
/// [`crate::Domain`]; enum types carry their full descriptor since enum
/// metadata can never be cyclic.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// A text value.
    String,
    /// A numeric value.
    Number,
    /// A boolean value.
    Boolean,
    /// A point in time.
    Date,
    /// A member of the described enum.
    Enum(Arc<EnumDescriptor>),
    /// A plain object of the named class (not server-identifiable).
    Object(String),
    /// An entity of the named class, identifiable by a primary key.
    Model(String),
    /// A collection of the inner type.
    Collection(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Returns the class name for object and entity types.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Object(name) | TypeDescriptor::Model(name) => Some(name),
            _ => None,
        }
    }

    /// Returns true for object and entity types.
    pub fn is_class(&self) -> bool {
        matches!(self, TypeDescriptor::Object(_) | TypeDescriptor::Model(_))
    }

    /// Returns true for collection types.
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeDescriptor::Collection(_))
    }

    /// Returns the element type for collection types.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Collection(item) => Some(item),
            _ => None,
        }
    }

    /// Short human-readable label for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::String => "string",
            TypeDescriptor::Number => "number",
            TypeDescriptor::Boolean => "boolean",
            TypeDescriptor::Date => "date",
            TypeDescriptor::Enum(_) => "enum",
            TypeDescriptor::Object(_) => "object",
            TypeDescriptor::Model(_) => "model",
            TypeDescriptor::Collection(_) => "collection",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_resolution() {
        assert_eq!(
            TypeDescriptor::Model("Case".into()).class_name(),
            Some("Case")
        );
        assert_eq!(
            TypeDescriptor::Object("Address".into()).class_name(),
            Some("Address")
        );
        assert_eq!(TypeDescriptor::Number.class_name(), None);
    }

    #[test]
    fn collection_element() {
        let ty = TypeDescriptor::Collection(Box::new(TypeDescriptor::Model("Case".into())));
        assert!(ty.is_collection());
        assert_eq!(ty.element().and_then(|e| e.class_name()), Some("Case"));
        assert!(TypeDescriptor::Date.element().is_none());
    }
}
