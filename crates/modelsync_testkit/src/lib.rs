//! # modelsync Testkit
//!
//! Test fixtures for the modelsync workspace.
//!
//! This crate provides:
//! - A sample domain (cases, people, companies, a status enum) exercising
//!   every property role, including a cyclic navigation pair
//! - Canned wire envelopes for the standard endpoints

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod payloads;

pub use fixtures::*;
pub use payloads::*;
