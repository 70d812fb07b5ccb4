//! Error types for the API layer.

use modelsync_graph::GraphError;
use serde::Deserialize;
use thiserror::Error;

use crate::response::ValidationIssue;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// A transport-level failure, produced by [`crate::HttpTransport`]
/// implementations.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status code, when a response was received at all.
    pub status: Option<u16>,
    /// Human-readable failure description.
    pub message: String,
    /// Raw response body, when one was received.
    pub body: Option<Vec<u8>>,
}

impl TransportError {
    /// Creates a network-level error with no response.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// Creates an error for a non-success HTTP status.
    pub fn status(status: u16, body: Option<Vec<u8>>) -> Self {
        Self {
            status: Some(status),
            message: format!("server returned HTTP {status}"),
            body,
        }
    }
}

/// The structured part of a failure response body, when the server sent
/// one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Server-provided failure message.
    #[serde(default)]
    pub message: Option<String>,
    /// Field-level validation errors.
    #[serde(default)]
    pub validation_issues: Vec<ValidationIssue>,
}

/// Errors raised by the API layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport {
        /// Failure description.
        message: String,
        /// Whether retrying may help.
        retryable: bool,
    },

    /// The server answered with a non-success status.
    #[error("server returned HTTP {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Structured failure body, when the server sent one.
        envelope: Option<ErrorEnvelope>,
    },

    /// A response body could not be decoded as the expected envelope.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// An entity key was missing or not a scalar.
    #[error("entity key is missing or not a scalar")]
    InvalidKey,

    /// Hydrating the response into a typed graph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl ApiError {
    /// Returns true for failures that represent a remote outcome rather
    /// than a programming error.
    pub fn is_remote(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Http { .. })
    }

    /// The best available human-readable message for a remote failure.
    pub fn remote_message(&self) -> Option<String> {
        match self {
            ApiError::Transport { message, .. } => Some(message.clone()),
            ApiError::Http { status, envelope } => Some(
                envelope
                    .as_ref()
                    .and_then(|e| e.message.clone())
                    .unwrap_or_else(|| format!("server returned HTTP {status}")),
            ),
            _ => None,
        }
    }

    /// Field-level validation issues carried by a remote failure.
    pub fn remote_validation_issues(&self) -> Vec<ValidationIssue> {
        match self {
            ApiError::Http {
                envelope: Some(envelope),
                ..
            } => envelope.validation_issues.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        match error.status {
            Some(status) => {
                let envelope = error
                    .body
                    .as_deref()
                    .and_then(|body| serde_json::from_slice::<ErrorEnvelope>(body).ok());
                ApiError::Http { status, envelope }
            }
            None => ApiError::Transport {
                message: error.message,
                retryable: true,
            },
        }
    }
}
