//! # modelsync API
//!
//! HTTP contract and transport layer for the modelsync runtime.
//!
//! This crate provides:
//! - The result envelopes and parameter objects of the consumed CRUD API
//! - Query-string encoding for list, filter and data-source parameters
//! - The [`HttpTransport`] abstraction with a reqwest implementation and
//!   a programmable in-process mock
//! - [`ModelApiClient`], the per-entity-type client for the five standard
//!   endpoints, which hydrates responses into typed graphs
//!
//! ## Architecture
//!
//! The transport is an explicit handle (`Arc<dyn HttpTransport>`) owned by
//! the composition root and passed into every client; there is no global
//! HTTP singleton. Successful responses are passed through the conversion
//! visitor before being returned, so consumers never see raw wire objects.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod http;
mod params;
mod query;
mod response;
mod transport;

pub use client::ModelApiClient;
pub use error::{ApiError, ApiResult, ErrorEnvelope, TransportError};
pub use http::ReqwestTransport;
pub use params::{DataSourceParams, DataSourceSpec, FilterParams, ListParams};
pub use query::{data_source_query, filter_query, list_query};
pub use response::{ItemResult, ListResult, ValidationIssue};
pub use transport::{HttpTransport, MockTransport, RecordedRequest};
