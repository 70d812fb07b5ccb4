//! The collection synchronization controller.

use crate::caller::{CallState, Caller, ConcurrencyMode, ItemFields, ListFields};
use crate::error::CallResult;
use crate::scheduler::SchedulerGuard;
use futures::FutureExt;
use modelsync_api::{ListParams, ModelApiClient};
use modelsync_graph::Value;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error};

/// Synchronization controller for a paged collection of entities.
///
/// Owns the list parameters and the list/count callers, and derives
/// paging state from the last seen responses.
pub struct ListViewModel {
    api: Arc<ModelApiClient>,
    params: Arc<RwLock<ListParams>>,
    last_page_count: Arc<RwLock<u32>>,
    load: Caller<(), ListFields>,
    count: Caller<(), ItemFields>,
    auto_load: Mutex<Option<SchedulerGuard>>,
    weak: Weak<ListViewModel>,
}

impl ListViewModel {
    /// Creates a controller with default parameters (page 1, page size
    /// 25).
    pub fn new(api: Arc<ModelApiClient>) -> Arc<Self> {
        let params: Arc<RwLock<ListParams>> = Arc::new(RwLock::new(ListParams::default()));
        let last_page_count: Arc<RwLock<u32>> = Arc::new(RwLock::new(0));

        let load = {
            let api = api.clone();
            let params = params.clone();
            Caller::new(move |(): ()| {
                let api = api.clone();
                let params = params.clone();
                async move {
                    let params = params.read().clone();
                    api.list(&params).await
                }
                .boxed()
            })
        };
        {
            let last_page_count = last_page_count.clone();
            load.on_success(move |state: &CallState<ListFields>| {
                *last_page_count.write() = state.fields.page_count;
            });
        }

        let count = {
            let api = api.clone();
            let params = params.clone();
            Caller::new(move |(): ()| {
                let api = api.clone();
                let params = params.clone();
                async move {
                    let filter = params.read().filter.clone();
                    api.count(&filter).await
                }
                .boxed()
            })
        };
        {
            // A successful count also pins the page count, derived from
            // the current page size.
            let last_page_count = last_page_count.clone();
            let params = params.clone();
            count.on_success(move |state: &CallState<ItemFields>| {
                let Some(total) = state.fields.result.as_ref().and_then(Value::as_f64) else {
                    return;
                };
                let page_size = params.read().page_size.max(1);
                *last_page_count.write() = (total / f64::from(page_size)).ceil() as u32;
            });
        }

        Arc::new_cyclic(|weak: &Weak<ListViewModel>| ListViewModel {
            api,
            params,
            last_page_count,
            load,
            count,
            auto_load: Mutex::new(None),
            weak: weak.clone(),
        })
    }

    /// The API client this controller issues calls through.
    pub fn api(&self) -> &Arc<ModelApiClient> {
        &self.api
    }

    /// The current list parameters.
    pub fn params(&self) -> ListParams {
        self.params.read().clone()
    }

    /// Replaces the list parameters.
    pub fn set_params(&self, params: ListParams) {
        *self.params.write() = params;
    }

    /// Edits the list parameters in place.
    pub fn update_params(&self, edit: impl FnOnce(&mut ListParams)) {
        edit(&mut self.params.write());
    }

    /// The current page parameter.
    pub fn page(&self) -> u32 {
        self.params.read().page
    }

    /// Sets the page parameter.
    pub fn set_page(&self, page: u32) {
        self.params.write().page = page;
    }

    /// The items loaded by the last successful list call.
    pub fn items(&self) -> Vec<Value> {
        self.load.state().fields.result
    }

    /// Total item count from the last list response; may be `-1` when
    /// unknown.
    pub fn total_count(&self) -> i64 {
        self.load.state().fields.total_count
    }

    /// Page count from the last seen list or count response.
    pub fn page_count(&self) -> u32 {
        *self.last_page_count.read()
    }

    /// True if the page parameter is beyond the first page.
    pub fn has_previous_page(&self) -> bool {
        self.page() > 1
    }

    /// True if the last seen page count indicates pages after the current
    /// page parameter.
    pub fn has_next_page(&self) -> bool {
        self.page() < self.page_count()
    }

    /// Decrements the page parameter if there is a previous page.
    pub fn previous_page(&self) {
        if self.has_previous_page() {
            self.params.write().page -= 1;
        }
    }

    /// Increments the page parameter if there is a next page.
    pub fn next_page(&self) {
        if self.has_next_page() {
            self.params.write().page += 1;
        }
    }

    /// Loads the current page. Remote failures settle into
    /// [`load_state`](Self::load_state).
    pub async fn load(&self) -> CallResult<()> {
        self.load.invoke(()).await
    }

    /// Counts the entities matching the current filter parameters.
    pub async fn count(&self) -> CallResult<()> {
        self.count.invoke(()).await
    }

    /// State of the list caller.
    pub fn load_state(&self) -> CallState<ListFields> {
        self.load.state()
    }

    /// State of the count caller.
    pub fn count_state(&self) -> CallState<ItemFields> {
        self.count.state()
    }

    /// The list caller, for cancellation, callbacks and concurrency
    /// configuration.
    pub fn load_caller(&self) -> &Caller<(), ListFields> {
        &self.load
    }

    /// The count caller.
    pub fn count_caller(&self) -> &Caller<(), ItemFields> {
        &self.count
    }

    /// Starts debounced auto-loading.
    ///
    /// The scheduler deep-compares the parameter object each period; any
    /// change debounces into a reload. If a load is already pending and
    /// the load caller's mode is not [`ConcurrencyMode::Cancel`], the
    /// reload is re-enqueued instead of issued. Torn down by
    /// [`stop_auto_load`](Self::stop_auto_load) or by dropping the
    /// controller.
    pub fn start_auto_load(&self, wait: Duration) {
        self.start_auto_load_inner(wait, None);
    }

    /// Starts debounced auto-loading gated by a predicate.
    pub fn start_auto_load_when(
        &self,
        wait: Duration,
        predicate: impl Fn(&ListViewModel) -> bool + Send + Sync + 'static,
    ) {
        self.start_auto_load_inner(wait, Some(Arc::new(predicate)));
    }

    fn start_auto_load_inner(
        &self,
        wait: Duration,
        predicate: Option<Arc<dyn Fn(&ListViewModel) -> bool + Send + Sync>>,
    ) {
        self.stop_auto_load();
        let weak = self.weak.clone();
        let mut last_seen = self.params();
        let task = tokio::spawn(async move {
            let mut pending = false;
            loop {
                sleep(wait).await;
                let Some(vm) = weak.upgrade() else { break };
                let current = vm.params();
                if current != last_seen {
                    last_seen = current;
                    pending = true;
                }
                if !pending {
                    continue;
                }
                if let Some(predicate) = &predicate {
                    if !predicate(&vm) {
                        continue;
                    }
                }
                if vm.load.is_loading()
                    && vm.load.concurrency_mode() != ConcurrencyMode::Cancel
                {
                    // Re-enqueue: try again on the next tick.
                    continue;
                }
                pending = false;
                debug!("auto-load triggered");
                if let Err(err) = vm.load().await {
                    error!(%err, "auto-load failed");
                }
            }
        });
        *self.auto_load.lock() = Some(SchedulerGuard::new(task));
    }

    /// Stops auto-loading if it is enabled.
    pub fn stop_auto_load(&self) {
        self.auto_load.lock().take();
    }
}
