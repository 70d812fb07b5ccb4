//! Error types for the client layer.

use modelsync_api::ApiError;
use modelsync_graph::GraphError;
use thiserror::Error;

/// Result type for client operations.
pub type CallResult<T> = Result<T, CallError>;

/// Errors raised by callers and controllers.
///
/// Remote failures are *not* represented here; they are captured in the
/// caller's observable state. These variants cover the concurrency policy
/// and programmer errors only.
#[derive(Error, Debug)]
pub enum CallError {
    /// The wrapper was invoked while a call was pending under the
    /// `disallow` policy.
    #[error("a request is already pending for this caller")]
    AlreadyPending,

    /// A fatal (non-remote) API error: decoding, hydration or key
    /// resolution failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A graph operation failed while preparing or applying a call.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
