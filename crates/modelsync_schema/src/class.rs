//! Class and property descriptors.

use crate::types::TypeDescriptor;

/// Role a property plays in a relational model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyRole {
    /// An ordinary data property.
    Value,
    /// The property holding the entity's unique key.
    PrimaryKey,
    /// A scalar holding the primary key of a related entity.
    ForeignKey {
        /// Name of the paired reference-navigation property on the same
        /// class, if one is declared.
        navigation: Option<String>,
        /// Name of the entity type the key points at.
        principal_type: String,
    },
    /// An object property referencing a single related entity.
    ReferenceNavigation {
        /// Name of the paired foreign-key property on the same class.
        foreign_key: String,
    },
    /// A collection property holding the dependent side of a relationship.
    CollectionNavigation {
        /// Name of the foreign-key property on the *element* class that
        /// points back at the owner, if one is declared.
        foreign_key: Option<String>,
    },
}

impl PropertyRole {
    /// Returns true for reference and collection navigation roles.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            PropertyRole::ReferenceNavigation { .. } | PropertyRole::CollectionNavigation { .. }
        )
    }
}

/// Metadata for one property of a class.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Machine-readable property name.
    pub name: String,
    /// Human-readable property name.
    pub display_name: String,
    /// Relational role of the property.
    pub role: PropertyRole,
    /// Shape of the property's value.
    pub ty: TypeDescriptor,
}

impl PropertyDescriptor {
    /// Creates an ordinary data property.
    pub fn value(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self::with_role(name, ty, PropertyRole::Value)
    }

    /// Creates a primary-key property.
    pub fn primary_key(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self::with_role(name, ty, PropertyRole::PrimaryKey)
    }

    /// Creates a foreign-key property paired with a navigation property.
    pub fn foreign_key(
        name: impl Into<String>,
        ty: TypeDescriptor,
        principal_type: impl Into<String>,
        navigation: Option<&str>,
    ) -> Self {
        Self::with_role(
            name,
            ty,
            PropertyRole::ForeignKey {
                navigation: navigation.map(String::from),
                principal_type: principal_type.into(),
            },
        )
    }

    /// Creates a reference-navigation property backed by a foreign key.
    pub fn reference_navigation(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::with_role(
            name,
            TypeDescriptor::Model(target.into()),
            PropertyRole::ReferenceNavigation {
                foreign_key: foreign_key.into(),
            },
        )
    }

    /// Creates a collection-navigation property.
    pub fn collection_navigation(
        name: impl Into<String>,
        element: impl Into<String>,
        foreign_key: Option<&str>,
    ) -> Self {
        Self::with_role(
            name,
            TypeDescriptor::Collection(Box::new(TypeDescriptor::Model(element.into()))),
            PropertyRole::CollectionNavigation {
                foreign_key: foreign_key.map(String::from),
            },
        )
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    fn with_role(name: impl Into<String>, ty: TypeDescriptor, role: PropertyRole) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            role,
            ty,
        }
    }
}

/// Discriminates plain objects from server-identifiable entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassKind {
    /// A plain object with no server identity.
    Object,
    /// An entity addressable through the generated CRUD endpoints.
    Model {
        /// Name of the primary-key property.
        key_property: String,
        /// URI path segment identifying the entity's endpoints, with no
        /// leading or trailing slashes.
        controller_route: String,
    },
}

/// Metadata for an object or entity class.
///
/// Property declaration order is display order.
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    /// Machine-readable class name.
    pub name: String,
    /// Human-readable class name.
    pub display_name: String,
    /// Object/entity discriminator plus entity-only metadata.
    pub kind: ClassKind,
    /// Name of the property used to display instances, if one is designated.
    pub display_property: Option<String>,
    properties: Vec<PropertyDescriptor>,
}

impl ClassDescriptor {
    /// Creates a plain-object class.
    pub fn object(name: impl Into<String>, properties: Vec<PropertyDescriptor>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind: ClassKind::Object,
            display_property: None,
            properties,
        }
    }

    /// Creates an entity class.
    pub fn model(
        name: impl Into<String>,
        controller_route: impl Into<String>,
        key_property: impl Into<String>,
        properties: Vec<PropertyDescriptor>,
    ) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind: ClassKind::Model {
                key_property: key_property.into(),
                controller_route: controller_route.into(),
            },
            display_property: None,
            properties,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Designates the property used to display instances.
    pub fn with_display_property(mut self, property: impl Into<String>) -> Self {
        self.display_property = Some(property.into());
        self
    }

    /// All properties, in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns true for entity classes.
    pub fn is_model(&self) -> bool {
        matches!(self.kind, ClassKind::Model { .. })
    }

    /// The primary-key property descriptor, for entity classes.
    pub fn key_property(&self) -> Option<&PropertyDescriptor> {
        match &self.kind {
            ClassKind::Model { key_property, .. } => self.property(key_property),
            ClassKind::Object => None,
        }
    }

    /// The entity's endpoint route segment, for entity classes.
    pub fn controller_route(&self) -> Option<&str> {
        match &self.kind {
            ClassKind::Model {
                controller_route, ..
            } => Some(controller_route),
            ClassKind::Object => None,
        }
    }

    /// Resolves the navigation property paired with the named foreign key.
    pub fn navigation_for_key(&self, foreign_key: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| {
            matches!(&p.role, PropertyRole::ReferenceNavigation { foreign_key: fk } if fk == foreign_key)
        })
    }

    /// Resolves the foreign-key property paired with the named navigation
    /// property.
    pub fn key_for_navigation(&self, navigation: &str) -> Option<&PropertyDescriptor> {
        let nav = self.property(navigation)?;
        match &nav.role {
            PropertyRole::ReferenceNavigation { foreign_key } => self.property(foreign_key),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_class() -> ClassDescriptor {
        ClassDescriptor::model(
            "Case",
            "Cases",
            "caseId",
            vec![
                PropertyDescriptor::primary_key("caseId", TypeDescriptor::Number),
                PropertyDescriptor::value("title", TypeDescriptor::String),
                PropertyDescriptor::foreign_key(
                    "assigneeId",
                    TypeDescriptor::Number,
                    "Person",
                    Some("assignee"),
                ),
                PropertyDescriptor::reference_navigation("assignee", "Person", "assigneeId"),
            ],
        )
        .with_display_property("title")
    }

    #[test]
    fn property_lookup_and_order() {
        let class = case_class();
        assert_eq!(class.property("title").unwrap().name, "title");
        assert!(class.property("missing").is_none());
        let names: Vec<_> = class.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["caseId", "title", "assigneeId", "assignee"]);
    }

    #[test]
    fn entity_metadata() {
        let class = case_class();
        assert!(class.is_model());
        assert_eq!(class.controller_route(), Some("Cases"));
        assert_eq!(class.key_property().unwrap().name, "caseId");
        assert_eq!(class.display_property.as_deref(), Some("title"));
    }

    #[test]
    fn navigation_back_references() {
        let class = case_class();
        assert_eq!(
            class.navigation_for_key("assigneeId").unwrap().name,
            "assignee"
        );
        assert_eq!(
            class.key_for_navigation("assignee").unwrap().name,
            "assigneeId"
        );
        assert!(class.navigation_for_key("caseId").is_none());
    }

    #[test]
    fn plain_object_has_no_entity_metadata() {
        let class = ClassDescriptor::object(
            "Address",
            vec![PropertyDescriptor::value("street", TypeDescriptor::String)],
        );
        assert!(!class.is_model());
        assert!(class.controller_route().is_none());
        assert!(class.key_property().is_none());
    }
}
