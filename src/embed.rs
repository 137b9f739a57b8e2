use std::sync::Mutex;

use serde_json::{json, Map, Value};

use crate::error::ChromaError;

/// Turns documents into one fixed-length vector each.
///
/// Invoked by the client facade only when a caller supplies documents without
/// vectors. Implementations must return one vector per input document, in the
/// same order.
#[async_trait::async_trait]
pub trait EmbeddingFunction: Send + Sync {
    async fn generate(&self, documents: &[String]) -> Result<Vec<Vec<f64>>, ChromaError>;

    /// Non-embedding fields of the last provider response (model name, token
    /// usage, timing), for observability. Pass-through, never validated.
    fn request_metadata(&self) -> Option<Value> {
        None
    }
}

/// Where a vendor response keeps its vectors, and what it calls its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireFormat {
    /// `{"input": [...]}` in, vectors at `data[i].embedding`.
    InputData,
    /// `{"input": [...]}` in, vectors at top-level `embeddings`.
    InputFlat,
    /// `{"texts": [...]}` in, vectors at top-level `embeddings`.
    TextsFlat,
}

impl WireFormat {
    fn input_field(&self) -> &'static str {
        match self {
            WireFormat::InputData | WireFormat::InputFlat => "input",
            WireFormat::TextsFlat => "texts",
        }
    }

    fn payload_field(&self) -> &'static str {
        match self {
            WireFormat::InputData => "data",
            WireFormat::InputFlat | WireFormat::TextsFlat => "embeddings",
        }
    }
}

/// HTTP embedding provider.
///
/// The six supported vendors differ only in endpoint, request field names and
/// where the response keeps its vectors, so one struct carries them all as
/// configuration. Each constructor bakes in the vendor's defaults.
pub struct EmbeddingProvider {
    base_url: String,
    path: String,
    api_key: Option<String>,
    model: String,
    input_type: Option<String>,
    format: WireFormat,
    last_request_metadata: Mutex<Option<Value>>,
    http: reqwest::Client,
}

impl EmbeddingProvider {
    fn new(
        base_url: &str,
        path: &str,
        api_key: Option<String>,
        model: &str,
        input_type: Option<String>,
        format: WireFormat,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            path: path.to_string(),
            api_key,
            model: model.to_string(),
            input_type,
            format,
            last_request_metadata: Mutex::new(None),
            http: reqwest::Client::new(),
        }
    }

    pub fn openai(api_key: &str) -> Self {
        Self::new(
            "https://api.openai.com",
            "/v1/embeddings",
            Some(api_key.to_string()),
            "text-embedding-3-small",
            None,
            WireFormat::InputData,
        )
    }

    pub fn jina(api_key: &str) -> Self {
        Self::new(
            "https://api.jina.ai",
            "/v1/embeddings",
            Some(api_key.to_string()),
            "jina-embeddings-v2-base-en",
            None,
            WireFormat::InputData,
        )
    }

    pub fn together_ai(api_key: &str) -> Self {
        Self::new(
            "https://api.together.xyz",
            "/v1/embeddings",
            Some(api_key.to_string()),
            "togethercomputer/m2-bert-80M-8k-retrieval",
            None,
            WireFormat::InputData,
        )
    }

    pub fn voyage_ai(api_key: &str) -> Self {
        Self::new(
            "https://api.voyageai.com",
            "/v1/embeddings",
            Some(api_key.to_string()),
            "voyage-2",
            Some("document".to_string()),
            WireFormat::InputData,
        )
    }

    pub fn cohere(api_key: &str) -> Self {
        Self::new(
            "https://api.cohere.com",
            "/v1/embed",
            Some(api_key.to_string()),
            "embed-english-v3.0",
            Some("classification".to_string()),
            WireFormat::TextsFlat,
        )
    }

    /// Local Ollama instance at `http://localhost:11434`. No auth.
    pub fn ollama() -> Self {
        Self::new(
            "http://localhost:11434",
            "/api/embed",
            None,
            "deepseek-r1:14b",
            None,
            WireFormat::InputFlat,
        )
    }

    /// Points the provider at a different endpoint, for self-hosted or test
    /// deployments of a vendor-compatible API.
    pub fn with_endpoint(mut self, base_url: &str, path: &str) -> Self {
        self.base_url = base_url.to_string();
        self.path = path.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_input_type(mut self, input_type: &str) -> Self {
        self.input_type = Some(input_type.to_string());
        self
    }

    async fn request(&self, body: Value) -> Result<Value, ChromaError> {
        let url = format!("{}{}", self.base_url, self.path);
        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChromaError::ProviderConnection(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChromaError::ProviderConnection(e.to_string()))?;

        if !status.is_success() {
            return Err(ChromaError::ProviderRequest(text));
        }
        serde_json::from_str(&text).map_err(|e| ChromaError::ProviderRequest(e.to_string()))
    }

    fn extract_embeddings(&self, response: &Value) -> Result<Vec<Vec<f64>>, ChromaError> {
        let malformed =
            || ChromaError::ProviderRequest("unexpected embeddings response shape".to_string());

        let payload = response.get(self.format.payload_field()).ok_or_else(malformed)?;
        match self.format {
            WireFormat::InputData => payload
                .as_array()
                .ok_or_else(malformed)?
                .iter()
                .map(|obj| {
                    serde_json::from_value(obj.get("embedding").cloned().unwrap_or(Value::Null))
                        .map_err(|_| malformed())
                })
                .collect(),
            WireFormat::InputFlat | WireFormat::TextsFlat => {
                serde_json::from_value(payload.clone()).map_err(|_| malformed())
            }
        }
    }

    fn retain_metadata(&self, response: &Value) {
        let mut fields = match response.as_object() {
            Some(object) => object.clone(),
            None => Map::new(),
        };
        fields.remove(self.format.payload_field());

        let mut last = self
            .last_request_metadata
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(Value::Object(fields));
    }
}

#[async_trait::async_trait]
impl EmbeddingFunction for EmbeddingProvider {
    async fn generate(&self, documents: &[String]) -> Result<Vec<Vec<f64>>, ChromaError> {
        let mut body = json!({
            self.format.input_field(): documents,
            "model": self.model,
        });
        if let Some(input_type) = &self.input_type {
            body["input_type"] = Value::String(input_type.clone());
        }

        let response = self.request(body).await?;
        let embeddings = self.extract_embeddings(&response)?;
        self.retain_metadata(&response);

        Ok(embeddings)
    }

    fn request_metadata(&self) -> Option<Value> {
        self.last_request_metadata
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
