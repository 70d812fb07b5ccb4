//! Error types for graph traversal.

use modelsync_schema::SchemaError;
use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised during graph traversal.
///
/// These indicate that the data and the metadata are out of sync, which is
/// a programmer error; they propagate synchronously to the caller of the
/// traversal rather than being captured as state.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A property name does not exist on the class it was resolved against.
    #[error("unknown property `{property}` on type `{class}`")]
    UnknownProperty {
        /// Class name.
        class: String,
        /// Property name that failed to resolve.
        property: String,
    },

    /// A value's shape does not match its descriptor.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape encountered.
        actual: String,
    },

    /// An object carries metadata that conflicts with the expected type.
    #[error("metadata mismatch: expected `{expected}`, found `{found}`")]
    MetadataMismatch {
        /// Expected class name.
        expected: String,
        /// Class name attached to the object.
        found: String,
    },

    /// A date value could not be parsed during conversion.
    #[error("unparsable date value `{0}`")]
    UnparsableDate(String),

    /// A type reference failed to resolve through the domain registry.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
