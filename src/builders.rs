use std::collections::HashMap;

use serde_json::Value;
use typed_builder::TypedBuilder;

/// Where to reach the server and which tenant/database to scope calls to.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ConnectParams {
    #[builder(default = "http".to_string(), setter(into))]
    pub scheme: String,

    #[builder(default = "localhost".to_string(), setter(into))]
    pub host: String,

    #[builder(default = 8000)]
    pub port: u16,

    #[builder(default = "default_database".to_string(), setter(into))]
    pub database: String,

    #[builder(default = "default_tenant".to_string(), setter(into))]
    pub tenant: String,

    #[builder(default, setter(strip_option, into))]
    pub auth_token: Option<String>,
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Bulk input to add/update/upsert. Empty arrays mean "not provided".
#[derive(Debug, Clone, TypedBuilder)]
pub struct EmbeddingsParams {
    pub ids: Vec<String>,

    #[builder(default = Vec::new())]
    pub embeddings: Vec<Vec<f64>>,

    #[builder(default = Vec::new())]
    pub metadatas: Vec<HashMap<String, String>>,

    #[builder(default = Vec::new())]
    pub documents: Vec<String>,
}

/// Filters for a get call. `where_document`/`where_metadata` are opaque
/// filter trees forwarded verbatim to the server.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GetEmbeddingsParams {
    #[builder(default = Vec::new())]
    pub ids: Vec<String>,

    #[builder(default = vec!["metadatas".to_string(), "documents".to_string()])]
    pub include: Vec<String>,

    #[builder(default, setter(strip_option))]
    pub where_document: Option<Value>,

    #[builder(default, setter(strip_option))]
    pub where_metadata: Option<Value>,
}

impl Default for GetEmbeddingsParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct DeleteEmbeddingsParams {
    #[builder(default = Vec::new())]
    pub ids: Vec<String>,

    #[builder(default, setter(strip_option))]
    pub where_document: Option<Value>,

    #[builder(default, setter(strip_option))]
    pub where_metadata: Option<Value>,
}

/// A similarity query. Exactly one of `query_documents`/`query_embeddings`
/// may be non-empty; documents are embedded through the collection's
/// provider before dispatch.
#[derive(Debug, Clone, TypedBuilder)]
pub struct QueryParams {
    #[builder(default = Vec::new())]
    pub query_documents: Vec<String>,

    #[builder(default = Vec::new())]
    pub query_embeddings: Vec<Vec<f64>>,

    #[builder(default = 10)]
    pub n_results: usize,

    #[builder(default = vec!["metadatas".to_string(), "embeddings".to_string()])]
    pub include: Vec<String>,

    #[builder(default, setter(strip_option))]
    pub where_document: Option<Value>,

    #[builder(default, setter(strip_option))]
    pub where_metadata: Option<Value>,
}
