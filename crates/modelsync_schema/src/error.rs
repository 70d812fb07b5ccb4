//! Error types for schema construction and resolution.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building or resolving metadata.
///
/// Every variant indicates that the caller and the metadata are out of
/// sync, which is a programmer error; none of these are recoverable at
/// runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A class name could not be resolved through the domain registry.
    #[error("unknown type `{0}`")]
    UnknownType(String),

    /// An enum name could not be resolved through the domain registry.
    #[error("unknown enum `{0}`")]
    UnknownEnum(String),

    /// An entity was required but the resolved class is a plain object.
    #[error("type `{0}` is not an entity")]
    NotAnEntity(String),

    /// Two enum members share a string or numeric key.
    #[error("duplicate key `{key}` in enum `{name}`")]
    DuplicateEnumKey {
        /// Enum type name.
        name: String,
        /// The colliding key, rendered as text.
        key: String,
    },

    /// A type was registered twice under the same name.
    #[error("type `{0}` is already registered")]
    DuplicateType(String),
}
