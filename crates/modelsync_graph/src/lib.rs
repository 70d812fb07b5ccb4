//! # modelsync Graph
//!
//! Metadata-driven object graph engine.
//!
//! This crate provides:
//! - The dynamic [`Value`] model and metadata-annotated [`Instance`]s
//! - Conversion of wire JSON into typed, cycle-safe object graphs
//! - Depth-limited projection of graphs back into wire payloads
//! - Human-readable display rendering of graphs, properties and values
//!
//! ## Architecture
//!
//! All traversal is driven by descriptors from `modelsync_schema`; there is
//! no per-type hand-written mapping code. The three concrete visitors share
//! one dispatch contract, [`ValueVisitor`], which branches on the type
//! discriminator exhaustively.
//!
//! ## Key invariants
//!
//! - Every declared property of a converted instance is present (missing
//!   values are the [`Value::Null`] sentinel)
//! - Conversion of cyclic graphs terminates: an identity map scoped to one
//!   traversal memoizes every visited object
//! - Converting an already-converted instance is an identity operation
//! - Merges mutate instances in place so shared references stay valid

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod convert;
mod display;
mod error;
mod value;
mod visitor;
mod wire;

pub use convert::{convert_to_model, convert_value, update_from_model};
pub use display::{model_display, prop_display, value_display};
pub use error::{GraphError, GraphResult};
pub use value::{Instance, InstanceRef, Value};
pub use visitor::ValueVisitor;
pub use wire::{map_to_wire, map_to_wire_with_depth, map_value_to_wire, DEFAULT_MAX_DEPTH};
