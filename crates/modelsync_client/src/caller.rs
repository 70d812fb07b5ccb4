//! The stateful call wrapper.

use crate::cancel::CancelHandle;
use crate::error::{CallError, CallResult};
use futures::future::BoxFuture;
use modelsync_api::{ApiError, ApiResult, ItemResult, ListResult, ValidationIssue};
use modelsync_graph::Value;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

/// Behavior when a caller is invoked while a call is already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// Invoking while pending is an error. The default.
    #[default]
    Disallow,
    /// The outstanding call is cancelled first, then the new call proceeds.
    Cancel,
    /// Calls may overlap; whichever completion settles last wins the
    /// visible state. An accepted race, not a bug.
    Allow,
}

/// Observable state of a caller's most recent settled invocation.
#[derive(Debug, Clone, Default)]
pub struct CallState<S> {
    /// True while a request is pending.
    pub is_loading: bool,
    /// Outcome of the previous settled request, `None` before the first.
    pub was_successful: Option<bool>,
    /// Message from the previous settled request.
    pub message: Option<String>,
    /// Result-shape-specific fields.
    pub fields: S,
}

/// Result-shape-specific state fields absorbed from a response envelope.
pub trait ResultShape: Default + Clone + Send + Sync + 'static {
    /// The hydrated envelope absorbed on settle.
    type Envelope: Send + 'static;

    /// Whether the server reported success.
    fn envelope_successful(envelope: &Self::Envelope) -> bool;

    /// The server-provided message, if any.
    fn envelope_message(envelope: &Self::Envelope) -> Option<String>;

    /// Absorbs a settled response.
    fn absorb(&mut self, envelope: Self::Envelope);

    /// Absorbs a remote failure.
    fn absorb_failure(&mut self, error: &ApiError);
}

/// Fields for callers returning a single item.
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    /// Principal data returned by the previous request.
    pub result: Option<Value>,
    /// Validation issues returned by the previous request.
    pub validation_issues: Vec<ValidationIssue>,
}

impl ResultShape for ItemFields {
    type Envelope = ItemResult<Value>;

    fn envelope_successful(envelope: &Self::Envelope) -> bool {
        envelope.was_successful
    }

    fn envelope_message(envelope: &Self::Envelope) -> Option<String> {
        envelope.message.clone()
    }

    fn absorb(&mut self, envelope: Self::Envelope) {
        self.result = envelope.object;
        self.validation_issues = envelope.validation_issues;
    }

    fn absorb_failure(&mut self, error: &ApiError) {
        self.result = None;
        self.validation_issues = error.remote_validation_issues();
    }
}

/// Fields for callers returning a page of items.
#[derive(Debug, Clone, Default)]
pub struct ListFields {
    /// The page of items returned by the previous request.
    pub result: Vec<Value>,
    /// The 1-based page that was returned.
    pub page: u32,
    /// The page size that was applied.
    pub page_size: u32,
    /// Total number of pages.
    pub page_count: u32,
    /// Total number of matching items; may be `-1` when unknown.
    pub total_count: i64,
}

impl ResultShape for ListFields {
    type Envelope = ListResult<Value>;

    fn envelope_successful(envelope: &Self::Envelope) -> bool {
        envelope.was_successful
    }

    fn envelope_message(envelope: &Self::Envelope) -> Option<String> {
        envelope.message.clone()
    }

    fn absorb(&mut self, envelope: Self::Envelope) {
        self.result = envelope.list.unwrap_or_default();
        self.page = envelope.page;
        self.page_size = envelope.page_size;
        self.page_count = envelope.page_count;
        self.total_count = envelope.total_count;
    }

    fn absorb_failure(&mut self, _error: &ApiError) {
        self.result.clear();
    }
}

type Invoker<A, E> = Arc<dyn Fn(A) -> BoxFuture<'static, ApiResult<E>> + Send + Sync>;
type Callback<S> = Box<dyn Fn(&CallState<S>) + Send + Sync>;

/// Wraps exactly one network-call function and exposes its lifecycle as
/// observable state.
///
/// Every invocation obtains a fresh [`CancelHandle`] before the call
/// begins; the wrapper's stored handle is cleared only when that same
/// call settles, so a handle is never reused across calls. Remote
/// failures settle into state; only concurrency-policy violations and
/// metadata-level errors return `Err`.
pub struct Caller<A, S: ResultShape> {
    mode: Mutex<ConcurrencyMode>,
    invoker: Invoker<A, S::Envelope>,
    state: RwLock<CallState<S>>,
    handle: Mutex<Option<CancelHandle>>,
    on_success: RwLock<Vec<Callback<S>>>,
    on_failure: RwLock<Vec<Callback<S>>>,
}

impl<A, S: ResultShape> Caller<A, S> {
    /// Creates a caller around an invoker function.
    pub fn new<F>(invoker: F) -> Self
    where
        F: Fn(A) -> BoxFuture<'static, ApiResult<S::Envelope>> + Send + Sync + 'static,
    {
        Self {
            mode: Mutex::new(ConcurrencyMode::default()),
            invoker: Arc::new(invoker),
            state: RwLock::new(CallState::default()),
            handle: Mutex::new(None),
            on_success: RwLock::new(Vec::new()),
            on_failure: RwLock::new(Vec::new()),
        }
    }

    /// Sets the concurrency mode, chainable at construction time.
    pub fn with_concurrency(self, mode: ConcurrencyMode) -> Self {
        *self.mode.lock() = mode;
        self
    }

    /// Sets the concurrency mode.
    pub fn set_concurrency(&self, mode: ConcurrencyMode) {
        *self.mode.lock() = mode;
    }

    /// The current concurrency mode.
    pub fn concurrency_mode(&self) -> ConcurrencyMode {
        *self.mode.lock()
    }

    /// Snapshot of the observable state.
    pub fn state(&self) -> CallState<S> {
        self.state.read().clone()
    }

    /// True while a request is pending.
    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    /// Outcome of the previous settled request.
    pub fn was_successful(&self) -> Option<bool> {
        self.state.read().was_successful
    }

    /// Message from the previous settled request.
    pub fn message(&self) -> Option<String> {
        self.state.read().message.clone()
    }

    /// Registers a callback invoked after a request settles successfully.
    ///
    /// The callback receives the just-updated state.
    pub fn on_success(&self, callback: impl Fn(&CallState<S>) + Send + Sync + 'static) {
        self.on_success.write().push(Box::new(callback));
    }

    /// Registers a callback invoked after a request settles with a remote
    /// failure.
    pub fn on_failure(&self, callback: impl Fn(&CallState<S>) + Send + Sync + 'static) {
        self.on_failure.write().push(Box::new(callback));
    }

    /// Cancels the pending request, if any.
    ///
    /// The loading flag clears immediately, without waiting for the
    /// underlying operation to acknowledge; outcome fields and callbacks
    /// are untouched, since a cancellation is a deliberate local action
    /// rather than an outcome of the remote operation.
    pub fn cancel(&self) {
        let handle = self.handle.lock().clone();
        if let Some(handle) = handle {
            handle.cancel();
            self.state.write().is_loading = false;
        }
    }

    /// Invokes the wrapped call.
    ///
    /// Remote failures settle into state and return `Ok`; the `disallow`
    /// policy and metadata-level failures return `Err`.
    pub async fn invoke(&self, arg: A) -> CallResult<()> {
        let handle = {
            let mut slot = self.handle.lock();
            if self.state.read().is_loading {
                match self.concurrency_mode() {
                    ConcurrencyMode::Disallow => return Err(CallError::AlreadyPending),
                    ConcurrencyMode::Cancel => {
                        if let Some(pending) = slot.take() {
                            pending.cancel();
                        }
                        self.state.write().is_loading = false;
                    }
                    ConcurrencyMode::Allow => {}
                }
            }
            // Fresh handle before the call begins.
            let handle = CancelHandle::new();
            *slot = Some(handle.clone());
            self.state.write().is_loading = true;
            handle
        };

        let call = (self.invoker)(arg);
        tokio::select! {
            _ = handle.cancelled() => {
                // Deliberate local action: no outcome change, no callbacks.
                self.clear_handle_if(&handle);
                Ok(())
            }
            outcome = call => {
                self.clear_handle_if(&handle);
                self.settle(outcome)
            }
        }
    }

    fn settle(&self, outcome: ApiResult<S::Envelope>) -> CallResult<()> {
        match outcome {
            Ok(envelope) => {
                let snapshot = {
                    let mut state = self.state.write();
                    state.was_successful = Some(S::envelope_successful(&envelope));
                    state.message = S::envelope_message(&envelope);
                    state.fields.absorb(envelope);
                    state.is_loading = false;
                    state.clone()
                };
                for callback in self.on_success.read().iter() {
                    callback(&snapshot);
                }
                Ok(())
            }
            Err(error) if error.is_remote() => {
                debug!(%error, "request settled with remote failure");
                let snapshot = {
                    let mut state = self.state.write();
                    state.was_successful = Some(false);
                    state.message = Some(
                        error
                            .remote_message()
                            .unwrap_or_else(|| "a network error occurred".into()),
                    );
                    state.fields.absorb_failure(&error);
                    state.is_loading = false;
                    state.clone()
                };
                for callback in self.on_failure.read().iter() {
                    callback(&snapshot);
                }
                Ok(())
            }
            Err(error) => {
                // Metadata-level failure: propagate to the caller.
                self.state.write().is_loading = false;
                Err(CallError::Api(error))
            }
        }
    }

    /// Clears the stored handle only if it still belongs to this call.
    fn clear_handle_if(&self, handle: &CancelHandle) {
        let mut slot = self.handle.lock();
        if slot.as_ref().is_some_and(|current| current.same(handle)) {
            *slot = None;
        }
    }
}
