//! HTTP transport over reqwest.

use crate::error::TransportError;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use tracing::debug;

/// [`HttpTransport`] implementation backed by a [`reqwest::Client`].
///
/// The client handle is explicit: the composition root constructs one
/// transport (or shares a `reqwest::Client` across several) and passes it
/// into each controller. Dropping the in-flight request future cancels the
/// underlying HTTP request.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh client.
    ///
    /// The base URL should carry no trailing slash (e.g.
    /// `https://example.com/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a transport around an existing client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read(response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?
            .to_vec();
        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::status(status.as_u16(), Some(body)))
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        Self::read(response).await
    }

    async fn post(
        &self,
        path: &str,
        query: &[(String, String)],
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let mut request = self.client.post(&url).query(query);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        Self::read(response).await
    }
}
