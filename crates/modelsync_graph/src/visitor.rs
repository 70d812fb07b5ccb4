//! The shared traversal dispatch contract.

use crate::error::GraphResult;
use crate::value::Value;
use modelsync_schema::{ClassDescriptor, Domain, EnumDescriptor, TypeDescriptor};
use std::sync::Arc;

/// Generic traversal over a (value, descriptor) pair.
///
/// The provided [`visit`](ValueVisitor::visit) driver branches on the type
/// discriminator exhaustively; concrete visitors implement the branches
/// they care about. `visit_model` falls back to `visit_object` so visitors
/// that treat entities and plain objects alike implement only the latter.
pub trait ValueVisitor {
    /// The transformed value produced per branch.
    type Output;

    /// The registry used to resolve by-name type references.
    fn domain(&self) -> &Domain;

    /// Dispatches on the descriptor's type discriminator.
    fn visit(&mut self, value: &Value, ty: &TypeDescriptor) -> GraphResult<Self::Output> {
        match ty {
            TypeDescriptor::Model(name) => {
                let class = self.domain().class(name)?;
                self.visit_model(value, &class)
            }
            TypeDescriptor::Object(name) => {
                let class = self.domain().class(name)?;
                self.visit_object(value, &class)
            }
            TypeDescriptor::Collection(element) => self.visit_collection(value, element),
            TypeDescriptor::Enum(descriptor) => self.visit_enum(value, descriptor),
            TypeDescriptor::Date => self.visit_date(value),
            TypeDescriptor::String | TypeDescriptor::Number | TypeDescriptor::Boolean => {
                self.visit_primitive(value, ty)
            }
        }
    }

    /// Visits an entity value. Defaults to the plain-object branch.
    fn visit_model(
        &mut self,
        value: &Value,
        class: &Arc<ClassDescriptor>,
    ) -> GraphResult<Self::Output> {
        self.visit_object(value, class)
    }

    /// Visits a plain-object value.
    fn visit_object(
        &mut self,
        value: &Value,
        class: &Arc<ClassDescriptor>,
    ) -> GraphResult<Self::Output>;

    /// Visits a collection value.
    fn visit_collection(
        &mut self,
        value: &Value,
        element: &TypeDescriptor,
    ) -> GraphResult<Self::Output>;

    /// Visits an enum value.
    fn visit_enum(
        &mut self,
        value: &Value,
        descriptor: &Arc<EnumDescriptor>,
    ) -> GraphResult<Self::Output>;

    /// Visits a date value.
    fn visit_date(&mut self, value: &Value) -> GraphResult<Self::Output>;

    /// Visits a primitive (string, number, boolean) value.
    fn visit_primitive(&mut self, value: &Value, ty: &TypeDescriptor) -> GraphResult<Self::Output>;
}
