use reqwest::Method;
use serde_json::Value;

use crate::error::ChromaError;

const API_PREFIX: &str = "/api/v2";

/// Thin transport adapter over the server's REST surface.
///
/// Issues single-shot requests against a fixed base URL, attaches the bearer
/// token when configured and deserializes JSON bodies. Distinguishes only two
/// failure kinds: `Connection` when the network call itself did not complete
/// and `Request` (carrying the raw response body) on a non-2xx status.
/// Classification of request failures into domain errors is the facade's job.
#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    base_url: String,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub(crate) fn new(scheme: &str, host: &str, port: u16, auth_token: Option<String>) -> Self {
        Self {
            base_url: format!("{scheme}://{host}:{port}{API_PREFIX}"),
            auth_token,
            http: reqwest::Client::new(),
        }
    }

    pub(crate) async fn get(&self, endpoint: &str) -> Result<Value, ChromaError> {
        self.send(Method::GET, endpoint, None).await
    }

    pub(crate) async fn post(&self, endpoint: &str, body: Value) -> Result<Value, ChromaError> {
        self.send(Method::POST, endpoint, Some(body)).await
    }

    pub(crate) async fn put(&self, endpoint: &str, body: Value) -> Result<Value, ChromaError> {
        self.send(Method::PUT, endpoint, Some(body)).await
    }

    pub(crate) async fn delete(&self, endpoint: &str) -> Result<Value, ChromaError> {
        self.send(Method::DELETE, endpoint, None).await
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, ChromaError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChromaError::Connection(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChromaError::Connection(e.to_string()))?;
        tracing::debug!(%method, %url, %status, "request completed");

        if !status.is_success() {
            return Err(ChromaError::Request(text));
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ChromaError::Request(e.to_string()))
    }
}
