//! Transport layer abstraction.

use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Handles the raw HTTP exchange with the generated API.
///
/// This trait abstracts the network layer so tests can run against an
/// in-process mock and applications can choose their HTTP stack. Paths are
/// rooted at the API base (e.g. `/Cases/get/1`); query pairs are encoded
/// by the implementation.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a GET request and returns the raw response body.
    async fn get(&self, path: &str, query: &[(String, String)])
        -> Result<Vec<u8>, TransportError>;

    /// Sends a POST request with an optional JSON body and returns the raw
    /// response body.
    async fn post(
        &self,
        path: &str,
        query: &[(String, String)],
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, TransportError>;
}

/// One request observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: &'static str,
    /// Request path.
    pub path: String,
    /// Query pairs, in encoding order.
    pub query: Vec<(String, String)>,
    /// JSON body, for POST requests that carried one.
    pub body: Option<serde_json::Value>,
}

struct MockResponse {
    result: Result<Vec<u8>, TransportError>,
    delay: Option<Duration>,
}

/// A programmable transport for testing.
///
/// Responses are served in FIFO order regardless of method or path; every
/// request is recorded. A response may carry an artificial latency, which
/// is how concurrency and cancellation behavior is exercised in tests.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Creates an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful JSON response.
    pub fn push_json(&self, json: serde_json::Value) {
        self.push(MockResponse {
            result: Ok(json.to_string().into_bytes()),
            delay: None,
        });
    }

    /// Queues a successful JSON response served after a delay.
    pub fn push_json_delayed(&self, json: serde_json::Value, delay: Duration) {
        self.push(MockResponse {
            result: Ok(json.to_string().into_bytes()),
            delay: Some(delay),
        });
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.push(MockResponse {
            result: Err(error),
            delay: None,
        });
    }

    /// Queues a transport failure served after a delay.
    pub fn push_error_delayed(&self, error: TransportError, delay: Duration) {
        self.push(MockResponse {
            result: Err(error),
            delay: Some(delay),
        });
    }

    /// All requests observed so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of responses still queued.
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }

    fn push(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    async fn serve(
        &self,
        request: RecordedRequest,
    ) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().push(request);
        let response = self.responses.lock().pop_front();
        let Some(response) = response else {
            return Err(TransportError::network("no mock response queued"));
        };
        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }
        response.result
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<u8>, TransportError> {
        self.serve(RecordedRequest {
            method: "GET",
            path: path.into(),
            query: query.to_vec(),
            body: None,
        })
        .await
    }

    async fn post(
        &self,
        path: &str,
        query: &[(String, String)],
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, TransportError> {
        self.serve(RecordedRequest {
            method: "POST",
            path: path.into(),
            query: query.to_vec(),
            body,
        })
        .await
    }
}
