//! The entity synchronization controller.

use crate::caller::{CallState, Caller, ItemFields};
use crate::error::CallResult;
use crate::scheduler::SchedulerGuard;
use futures::FutureExt;
use modelsync_api::{DataSourceParams, ModelApiClient};
use modelsync_graph::{
    convert_to_model, map_to_wire, model_display, prop_display, update_from_model, GraphError,
    GraphResult, Instance, InstanceRef, Value,
};
use modelsync_schema::{ClassDescriptor, Domain, PropertyRole};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error};

/// Synchronization controller for one entity instance.
///
/// Owns the instance, its load/save/delete callers and the dirty state.
/// The instance itself may be shared with any number of observers; load
/// and save responses are merged into it in place so those references
/// stay valid.
pub struct ViewModel {
    domain: Arc<Domain>,
    class: Arc<ClassDescriptor>,
    api: Arc<ModelApiClient>,
    data: InstanceRef,
    pristine: Arc<RwLock<Option<String>>>,
    params: Arc<RwLock<DataSourceParams>>,
    load_response_from_saves: Arc<AtomicBool>,
    load: Caller<Option<Value>, ItemFields>,
    save: Caller<(), ItemFields>,
    delete: Caller<(), ItemFields>,
    auto_save: Mutex<Option<SchedulerGuard>>,
    weak: Weak<ViewModel>,
}

impl ViewModel {
    /// Creates a controller around a fresh, empty instance.
    pub fn new(api: Arc<ModelApiClient>) -> Arc<Self> {
        let data = Instance::new_shared(api.class().clone());
        Self::assemble(api, data)
    }

    /// Creates a controller around an existing instance.
    ///
    /// The instance must be annotated with the client's entity class.
    pub fn with_instance(api: Arc<ModelApiClient>, data: InstanceRef) -> GraphResult<Arc<Self>> {
        let expected = api.class().name.clone();
        let found = data.read().class().name.clone();
        if expected != found {
            return Err(GraphError::MetadataMismatch { expected, found });
        }
        Ok(Self::assemble(api, data))
    }

    fn assemble(api: Arc<ModelApiClient>, data: InstanceRef) -> Arc<Self> {
        let domain = api.domain().clone();
        let class = api.class().clone();
        let pristine: Arc<RwLock<Option<String>>> = Arc::new(RwLock::new(None));
        let params: Arc<RwLock<DataSourceParams>> = Arc::new(RwLock::new(DataSourceParams::default()));
        let load_response_from_saves = Arc::new(AtomicBool::new(true));

        let load = {
            let api = api.clone();
            let data = data.clone();
            let params = params.clone();
            Caller::new(move |id: Option<Value>| {
                let api = api.clone();
                let data = data.clone();
                let params = params.clone();
                async move {
                    let key = match id {
                        Some(key) => key,
                        None => data.read().primary_key().unwrap_or(Value::Null),
                    };
                    let params = params.read().clone();
                    api.get(&key, &params).await
                }
                .boxed()
            })
        };
        {
            // On success, merge onto the live instance and mark clean.
            let domain = domain.clone();
            let data = data.clone();
            let pristine = pristine.clone();
            load.on_success(move |state: &CallState<ItemFields>| {
                let Some(Value::Object(result)) = &state.fields.result else {
                    return;
                };
                if let Err(err) = update_from_model(&data, result) {
                    error!(%err, "failed to merge load response");
                    return;
                }
                *pristine.write() = snapshot(&domain, &data);
            });
        }

        let save = {
            let api = api.clone();
            let domain = domain.clone();
            let data = data.clone();
            let params = params.clone();
            let pristine = pristine.clone();
            Caller::new(move |(): ()| {
                let api = api.clone();
                let domain = domain.clone();
                let data = data.clone();
                let params = params.clone();
                let pristine = pristine.clone();
                async move {
                    let body = map_to_wire(&domain, &data)?;
                    // Mark clean before the request goes out; this is what
                    // makes the post-response dirty check detect edits made
                    // while the save is in flight.
                    *pristine.write() = Some(body.to_string());
                    let params = params.read().clone();
                    api.save(body, &params).await
                }
                .boxed()
            })
        };
        {
            let domain = domain.clone();
            let class = class.clone();
            let data = data.clone();
            let pristine = pristine.clone();
            let load_response = load_response_from_saves.clone();
            save.on_success(move |state: &CallState<ItemFields>| {
                let Some(Value::Object(result)) = &state.fields.result else {
                    // Nothing useful can be done without response data.
                    return;
                };
                let dirtied_in_flight = match (snapshot(&domain, &data), pristine.read().clone()) {
                    (Some(current), Some(baseline)) => current != baseline,
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if dirtied_in_flight {
                    // The instance changed while the save was in flight:
                    // keep the response only as the new pristine baseline,
                    // but load the key so a creation save keys subsequent
                    // updates.
                    *pristine.write() = snapshot(&domain, result);
                    copy_primary_key(&class, &data, result);
                } else if load_response.load(Ordering::SeqCst) {
                    if let Err(err) = update_from_model(&data, result) {
                        error!(%err, "failed to merge save response");
                        return;
                    }
                    *pristine.write() = snapshot(&domain, &data);
                } else {
                    copy_primary_key(&class, &data, result);
                    *pristine.write() = snapshot(&domain, &data);
                }
            });
        }

        let delete = {
            let api = api.clone();
            let data = data.clone();
            let params = params.clone();
            Caller::new(move |(): ()| {
                let api = api.clone();
                let data = data.clone();
                let params = params.clone();
                async move {
                    let key = data.read().primary_key().unwrap_or(Value::Null);
                    let params = params.read().clone();
                    api.delete(&key, &params).await
                }
                .boxed()
            })
        };

        let vm = Arc::new_cyclic(|weak: &Weak<ViewModel>| ViewModel {
            domain,
            class,
            api,
            data,
            pristine,
            params,
            load_response_from_saves,
            load,
            save,
            delete,
            auto_save: Mutex::new(None),
            weak: weak.clone(),
        });
        vm.set_clean();
        vm
    }

    /// The instance owned by this controller.
    pub fn data(&self) -> InstanceRef {
        self.data.clone()
    }

    /// The entity class this controller serves.
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// The metadata registry this controller resolves against.
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// The API client this controller issues calls through.
    pub fn api(&self) -> &Arc<ModelApiClient> {
        &self.api
    }

    /// Current value of the primary key.
    pub fn primary_key(&self) -> Option<Value> {
        self.data.read().primary_key()
    }

    /// Reads a property of the instance.
    pub fn get(&self, property: &str) -> Option<Value> {
        self.data.read().get(property).cloned()
    }

    /// Writes a property of the instance.
    pub fn set(&self, property: &str, value: Value) -> GraphResult<()> {
        self.data.write().set(property, value)
    }

    /// Parameters sent with `get`, `save` and `delete` calls.
    pub fn params(&self) -> DataSourceParams {
        self.params.read().clone()
    }

    /// Replaces the parameters sent with `get`, `save` and `delete` calls.
    pub fn set_params(&self, params: DataSourceParams) {
        *self.params.write() = params;
    }

    /// Whether successful save responses are merged back into the live
    /// instance. Defaults to true.
    pub fn set_load_response_from_saves(&self, enabled: bool) {
        self.load_response_from_saves
            .store(enabled, Ordering::SeqCst);
    }

    /// True if the savable data differs from the last server-confirmed
    /// state.
    ///
    /// Computed by comparing the serialized depth-limited projection
    /// against the pristine snapshot. Both sides serialize through the
    /// same projection, which emits keys in a stable order, so the string
    /// comparison never misreports structurally equal states.
    pub fn is_dirty(&self) -> bool {
        match (snapshot(&self.domain, &self.data), self.pristine.read().clone()) {
            (Some(current), Some(baseline)) => current != baseline,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Marks the current state as clean by recomputing the pristine
    /// snapshot.
    pub fn set_clean(&self) {
        *self.pristine.write() = snapshot(&self.domain, &self.data);
    }

    /// Loads the entity keyed by `id`, or by the current primary key.
    ///
    /// On success the result is merged onto the existing instance,
    /// preserving its identity, and the state is marked clean. Remote
    /// failures settle into [`load_state`](Self::load_state).
    pub async fn load(&self, id: Option<Value>) -> CallResult<()> {
        self.load.invoke(id).await
    }

    /// Saves the current instance.
    ///
    /// The state is marked clean *before* the request goes out, which is
    /// what makes the post-response dirty check meaningful: edits made
    /// while the save is in flight leave the instance dirty again, and in
    /// that case the response only replaces the pristine baseline instead
    /// of clobbering the edits. A failed save does not restore the
    /// previous baseline.
    pub async fn save(&self) -> CallResult<()> {
        self.save.invoke(()).await
    }

    /// Deletes the entity keyed by the current primary key.
    ///
    /// No local graph mutation happens beyond what the caller does with
    /// the result.
    pub async fn delete(&self) -> CallResult<()> {
        self.delete.invoke(()).await
    }

    /// State of the load caller.
    pub fn load_state(&self) -> CallState<ItemFields> {
        self.load.state()
    }

    /// State of the save caller.
    pub fn save_state(&self) -> CallState<ItemFields> {
        self.save.state()
    }

    /// State of the delete caller.
    pub fn delete_state(&self) -> CallState<ItemFields> {
        self.delete.state()
    }

    /// The load caller, for cancellation, callbacks and concurrency
    /// configuration.
    pub fn load_caller(&self) -> &Caller<Option<Value>, ItemFields> {
        &self.load
    }

    /// The save caller.
    pub fn save_caller(&self) -> &Caller<(), ItemFields> {
        &self.save
    }

    /// The delete caller.
    pub fn delete_caller(&self) -> &Caller<(), ItemFields> {
        &self.delete
    }

    /// Renders the whole instance, or one property, for display.
    pub fn display(&self, property: Option<&str>) -> GraphResult<String> {
        match property {
            None => model_display(&self.domain, &self.data),
            Some(property) => prop_display(&self.domain, &self.data, property),
        }
    }

    /// Creates a new typed item in a collection-navigation property, adds
    /// it to the collection and returns it.
    ///
    /// The child's foreign key is back-filled from this instance's
    /// primary key.
    pub fn add_child(&self, property: &str) -> GraphResult<InstanceRef> {
        let descriptor = self
            .class
            .property(property)
            .ok_or_else(|| GraphError::UnknownProperty {
                class: self.class.name.clone(),
                property: property.into(),
            })?;
        let PropertyRole::CollectionNavigation { foreign_key } = &descriptor.role else {
            return Err(GraphError::TypeMismatch {
                expected: "collection navigation property".into(),
                actual: format!("property `{property}`"),
            });
        };
        let element_class = descriptor
            .ty
            .element()
            .and_then(|e| e.class_name())
            .ok_or_else(|| GraphError::TypeMismatch {
                expected: "collection of a class type".into(),
                actual: descriptor.ty.kind_name().into(),
            })?;
        let child_class = self.domain.class(element_class)?;
        let child = convert_to_model(&self.domain, &serde_json::json!({}), &child_class)?;

        if let Some(foreign_key) = foreign_key {
            if let Some(key) = self.primary_key() {
                if !key.is_null() {
                    child.write().set(foreign_key, key)?;
                }
            }
        }

        let mut data = self.data.write();
        let mut collection = match data.get(property) {
            Some(Value::List(items)) => items.clone(),
            _ => Vec::new(),
        };
        collection.push(Value::Object(child.clone()));
        data.set(property, Value::List(collection))?;
        Ok(child)
    }

    /// Starts debounced auto-saving.
    ///
    /// Each period the scheduler checks for changes (via the instance's
    /// generation counter, then the dirty comparison), re-enqueues itself
    /// if a save is already pending, and otherwise saves and re-enqueues
    /// after completion, which is what catches edits made during an
    /// in-flight save. The scheduler is torn down by
    /// [`stop_auto_save`](Self::stop_auto_save) or by dropping the
    /// controller.
    pub fn start_auto_save(&self, wait: Duration) {
        self.start_auto_save_inner(wait, None);
    }

    /// Starts debounced auto-saving gated by a predicate.
    ///
    /// The predicate runs before every save attempt; returning false
    /// skips the attempt and leaves the scheduler armed.
    pub fn start_auto_save_when(
        &self,
        wait: Duration,
        predicate: impl Fn(&ViewModel) -> bool + Send + Sync + 'static,
    ) {
        self.start_auto_save_inner(wait, Some(Arc::new(predicate)));
    }

    fn start_auto_save_inner(
        &self,
        wait: Duration,
        predicate: Option<Arc<dyn Fn(&ViewModel) -> bool + Send + Sync>>,
    ) {
        self.stop_auto_save();
        let weak = self.weak.clone();
        let task = tokio::spawn(async move {
            let mut last_clean_generation: Option<u64> = None;
            loop {
                sleep(wait).await;
                let Some(vm) = weak.upgrade() else { break };
                if vm.save.is_loading() {
                    // Re-enqueue: the post-save tick will pick changes up.
                    continue;
                }
                let generation = vm.data.read().generation();
                if last_clean_generation == Some(generation) {
                    continue;
                }
                if !vm.is_dirty() {
                    last_clean_generation = Some(generation);
                    continue;
                }
                if let Some(predicate) = &predicate {
                    if !predicate(&vm) {
                        continue;
                    }
                }
                last_clean_generation = None;
                debug!("auto-save triggered");
                if let Err(err) = vm.save().await {
                    error!(%err, "auto-save failed");
                }
            }
        });
        *self.auto_save.lock() = Some(SchedulerGuard::new(task));
    }

    /// Stops auto-saving if it is enabled.
    pub fn stop_auto_save(&self) {
        self.auto_save.lock().take();
    }
}

/// Serializes the depth-limited projection used for dirty comparison.
///
/// Projection failures are logged and yield `None`; they indicate data
/// that cannot be saved either, so the instance is not reported dirty.
fn snapshot(domain: &Domain, instance: &InstanceRef) -> Option<String> {
    match map_to_wire(domain, instance) {
        Ok(json) => Some(json.to_string()),
        Err(err) => {
            error!(%err, "failed to project instance for dirty comparison");
            None
        }
    }
}

/// Copies the primary key of `source` onto `target`.
fn copy_primary_key(class: &ClassDescriptor, target: &InstanceRef, source: &InstanceRef) {
    let Some(key_property) = class.key_property() else {
        return;
    };
    let key = source.read().get(&key_property.name).cloned();
    if let Some(key) = key {
        if !key.is_null() {
            if let Err(err) = target.write().set(&key_property.name, key) {
                error!(%err, "failed to copy primary key from save response");
            }
        }
    }
}
