//! The domain registry.

use crate::class::ClassDescriptor;
use crate::enums::EnumDescriptor;
use crate::error::{SchemaError, SchemaResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Root metadata registry for an application's data model.
///
/// Built once at startup via [`DomainBuilder`] and shared immutably. All
/// by-name type references inside [`crate::TypeDescriptor`] resolve through
/// this registry.
#[derive(Debug, Default)]
pub struct Domain {
    types: BTreeMap<String, Arc<ClassDescriptor>>,
    enums: BTreeMap<String, Arc<EnumDescriptor>>,
}

impl Domain {
    /// Starts building a domain.
    pub fn builder() -> DomainBuilder {
        DomainBuilder::default()
    }

    /// Resolves a class by name.
    pub fn class(&self, name: &str) -> SchemaResult<Arc<ClassDescriptor>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownType(name.into()))
    }

    /// Resolves an entity class by name, rejecting plain objects.
    pub fn entity(&self, name: &str) -> SchemaResult<Arc<ClassDescriptor>> {
        let class = self.class(name)?;
        if !class.is_model() {
            return Err(SchemaError::NotAnEntity(name.into()));
        }
        Ok(class)
    }

    /// Resolves an enum by name.
    pub fn enumeration(&self, name: &str) -> SchemaResult<Arc<EnumDescriptor>> {
        self.enums
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownEnum(name.into()))
    }

    /// All registered classes, ordered by name.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassDescriptor>> {
        self.types.values()
    }
}

/// Builder for [`Domain`].
#[derive(Debug, Default)]
pub struct DomainBuilder {
    types: BTreeMap<String, Arc<ClassDescriptor>>,
    enums: BTreeMap<String, Arc<EnumDescriptor>>,
    error: Option<SchemaError>,
}

impl DomainBuilder {
    /// Registers a class descriptor.
    pub fn class(mut self, class: ClassDescriptor) -> Self {
        if self.error.is_none() && self.types.contains_key(&class.name) {
            self.error = Some(SchemaError::DuplicateType(class.name.clone()));
            return self;
        }
        self.types.insert(class.name.clone(), Arc::new(class));
        self
    }

    /// Registers an enum descriptor.
    pub fn enumeration(mut self, descriptor: EnumDescriptor) -> Self {
        if self.error.is_none() && self.enums.contains_key(&descriptor.name) {
            self.error = Some(SchemaError::DuplicateType(descriptor.name.clone()));
            return self;
        }
        self.enums
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        self
    }

    /// Finishes the domain, surfacing any registration error.
    pub fn build(self) -> SchemaResult<Domain> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Domain {
            types: self.types,
            enums: self.enums,
        })
    }
}
