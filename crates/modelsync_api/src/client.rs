//! Per-entity-type API client for the standard endpoints.

use crate::error::{ApiError, ApiResult};
use crate::params::{DataSourceParams, FilterParams, ListParams};
use crate::query::{data_source_query, filter_query, list_query};
use crate::response::{ItemResult, ListResult};
use crate::transport::HttpTransport;
use modelsync_graph::{convert_to_model, GraphError, Value};
use modelsync_schema::{ClassDescriptor, Domain};
use std::sync::Arc;
use tracing::debug;

/// Stateless client for one entity type's generated CRUD endpoints.
///
/// Successful responses are hydrated through the conversion visitor, so
/// `object` and `list` payloads come back as typed graphs rather than raw
/// wire objects.
pub struct ModelApiClient {
    domain: Arc<Domain>,
    class: Arc<ClassDescriptor>,
    transport: Arc<dyn HttpTransport>,
    route: String,
}

impl ModelApiClient {
    /// Creates a client for the named entity type.
    ///
    /// Fails if the name does not resolve to an entity class.
    pub fn new(
        domain: Arc<Domain>,
        type_name: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> ApiResult<Self> {
        let class = domain.entity(type_name).map_err(GraphError::from)?;
        let route = class
            .controller_route()
            .map(String::from)
            .unwrap_or_else(|| class.name.clone());
        Ok(Self {
            domain,
            class,
            transport,
            route,
        })
    }

    /// The entity class this client serves.
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// The metadata registry this client resolves against.
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// Fetches a single entity by key.
    pub async fn get(&self, id: &Value, params: &DataSourceParams) -> ApiResult<ItemResult<Value>> {
        let path = format!("/{}/get/{}", self.route, key_segment(id)?);
        debug!(path, "get");
        let bytes = self.transport.get(&path, &data_source_query(params)).await?;
        self.hydrate_item(&bytes)
    }

    /// Fetches a page of entities.
    pub async fn list(&self, params: &ListParams) -> ApiResult<ListResult<Value>> {
        let path = format!("/{}/list", self.route);
        debug!(path, "list");
        let bytes = self.transport.get(&path, &list_query(params)).await?;
        self.hydrate_list(&bytes)
    }

    /// Counts matching entities.
    pub async fn count(&self, params: &FilterParams) -> ApiResult<ItemResult<Value>> {
        let path = format!("/{}/count", self.route);
        debug!(path, "count");
        let bytes = self.transport.get(&path, &filter_query(params)).await?;
        let envelope: ItemResult<f64> =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope
            .map_object(|count| Ok::<_, ApiError>(Value::Number(count)))
    }

    /// Saves a projected entity payload.
    pub async fn save(
        &self,
        body: serde_json::Value,
        params: &DataSourceParams,
    ) -> ApiResult<ItemResult<Value>> {
        let path = format!("/{}/save", self.route);
        debug!(path, "save");
        let bytes = self
            .transport
            .post(&path, &data_source_query(params), Some(body))
            .await?;
        self.hydrate_item(&bytes)
    }

    /// Deletes an entity by key.
    pub async fn delete(
        &self,
        id: &Value,
        params: &DataSourceParams,
    ) -> ApiResult<ItemResult<Value>> {
        let path = format!("/{}/delete/{}", self.route, key_segment(id)?);
        debug!(path, "delete");
        let bytes = self
            .transport
            .post(&path, &data_source_query(params), None)
            .await?;
        self.hydrate_item(&bytes)
    }

    fn hydrate_item(&self, bytes: &[u8]) -> ApiResult<ItemResult<Value>> {
        let envelope: ItemResult<serde_json::Value> =
            serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        let hydrated = envelope.map_object(|json| {
            convert_to_model(&self.domain, &json, &self.class).map(Value::Object)
        })?;
        Ok(hydrated)
    }

    fn hydrate_list(&self, bytes: &[u8]) -> ApiResult<ListResult<Value>> {
        let envelope: ListResult<serde_json::Value> =
            serde_json::from_slice(bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        let hydrated = envelope.map_list(|json| {
            convert_to_model(&self.domain, &json, &self.class).map(Value::Object)
        })?;
        Ok(hydrated)
    }
}

/// Renders an entity key as a path segment.
fn key_segment(id: &Value) -> ApiResult<String> {
    match id {
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Ok(format!("{}", *n as i64)),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ApiError::InvalidKey),
    }
}
