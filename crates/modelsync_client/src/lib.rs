//! # modelsync Client
//!
//! Stateful call wrappers and synchronization controllers.
//!
//! This crate provides:
//! - [`Caller`], which wraps one network operation and exposes its
//!   lifecycle as observable state under a configurable concurrency policy
//! - [`ViewModel`], the entity synchronization controller: one owned
//!   instance, load/save/delete callers, dirty tracking and debounced
//!   auto-save
//! - [`ListViewModel`], the collection controller: list parameters,
//!   list/count callers and debounced auto-load
//!
//! ## Key invariants
//!
//! - Network failures never surface as `Err`; callers expose
//!   `was_successful` and `message` instead. Metadata errors do propagate.
//! - Cancellation is a deliberate local action: it fires no callbacks and
//!   leaves the previous outcome fields untouched.
//! - Controllers merge server responses into the live instance in place,
//!   so references held by observers stay valid across reloads.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod caller;
mod cancel;
mod error;
mod list;
mod scheduler;
mod viewmodel;

pub use caller::{CallState, Caller, ConcurrencyMode, ItemFields, ListFields, ResultShape};
pub use cancel::CancelHandle;
pub use error::{CallError, CallResult};
pub use list::ListViewModel;
pub use viewmodel::ViewModel;
