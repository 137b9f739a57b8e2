use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::api::ApiClient;
use crate::builders::{
    ConnectParams, DeleteEmbeddingsParams, EmbeddingsParams, GetEmbeddingsParams, QueryParams,
};
use crate::collection::Collection;
use crate::embed::EmbeddingFunction;
use crate::error::ChromaError;
use crate::types::{
    embedding_records_from_response, query_results_from_response, string_map, DeletePayload,
    EmbeddingRecord, EmbeddingsPayload, GetPayload, QueryPayload, QueryResult, UserIdentity,
};

/// Canonicalized, cross-checked form of the bulk inputs to a write call.
struct ValidationResult {
    ids: Vec<String>,
    embeddings: Vec<Vec<f64>>,
    metadatas: Vec<HashMap<String, String>>,
    documents: Vec<String>,
}

/// Client for a chroma vector database.
///
/// Owns the tenant/database context and provisions both on construction.
/// Every operation validates its inputs locally before anything is sent, and
/// reconciles server error bodies into [`ChromaError`] variants. One network
/// round-trip per call (two when documents are embedded through a provider),
/// no retries.
#[derive(Debug, Clone)]
pub struct ChromaClient {
    api: ApiClient,
    database: String,
    tenant: String,
}

impl ChromaClient {
    /// Connects and provisions the tenant and database if they do not exist
    /// yet. Construction against an already-provisioned tenant/database is
    /// idempotent; an unreachable server fails construction with a
    /// connection error.
    pub async fn new(params: ConnectParams) -> Result<Self, ChromaError> {
        let api = ApiClient::new(
            &params.scheme,
            &params.host,
            params.port,
            params.auth_token,
        );
        let client = Self {
            api,
            database: params.database,
            tenant: params.tenant,
        };
        client.initialize().await?;
        Ok(client)
    }

    async fn initialize(&self) -> Result<(), ChromaError> {
        if let Err(e) = self.api.get(&format!("/tenants/{}", self.tenant)).await {
            tracing::debug!(tenant = %self.tenant, error = %e, "tenant lookup failed, creating it");
            self.api
                .post("/tenants", json!({ "name": self.tenant }))
                .await
                .map_err(ChromaError::classify)?;
        }

        if let Err(e) = self.api.get(&self.db_path()).await {
            tracing::debug!(database = %self.database, error = %e, "database lookup failed, creating it");
            self.api
                .post(
                    &format!("/tenants/{}/databases", self.tenant),
                    json!({ "name": self.database }),
                )
                .await
                .map_err(ChromaError::classify)?;
        }

        Ok(())
    }

    fn db_path(&self) -> String {
        format!("/tenants/{}/databases/{}", self.tenant, self.database)
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Server version string.
    pub async fn version(&self) -> Result<String, ChromaError> {
        let version = self
            .api
            .get("/version")
            .await
            .map_err(ChromaError::classify)?;
        Ok(match version {
            Value::String(version) => version,
            other => other.to_string(),
        })
    }

    pub async fn heartbeat(&self) -> Result<u64, ChromaError> {
        let response = self
            .api
            .get("/heartbeat")
            .await
            .map_err(ChromaError::classify)?;
        Ok(response
            .get("nanosecond heartbeat")
            .and_then(Value::as_u64)
            .unwrap_or_default())
    }

    pub async fn healthcheck(&self) -> Result<String, ChromaError> {
        let response = self
            .api
            .get("/healthcheck")
            .await
            .map_err(ChromaError::classify)?;
        Ok(response.to_string())
    }

    /// Wipes the server. Must be enabled server-side.
    pub async fn reset(&self) -> Result<bool, ChromaError> {
        let response = self
            .api
            .post("/reset", json!({}))
            .await
            .map_err(ChromaError::classify)?;
        Ok(response.as_bool().unwrap_or_default())
    }

    pub async fn get_user_identity(&self) -> Result<UserIdentity, ChromaError> {
        let response = self
            .api
            .get("/auth/identity")
            .await
            .map_err(ChromaError::classify)?;
        serde_json::from_value(response).map_err(|e| ChromaError::Request(e.to_string()))
    }

    pub async fn create_collection(
        &self,
        name: &str,
        metadata: HashMap<String, String>,
        embedding_function: Option<Arc<dyn EmbeddingFunction>>,
    ) -> Result<Collection, ChromaError> {
        let mut body = json!({ "name": name, "metadata": metadata });
        if metadata.is_empty() {
            if let Some(object) = body.as_object_mut() {
                object.remove("metadata");
            }
        }

        let response = self
            .api
            .post(&format!("{}/collections", self.db_path()), body)
            .await
            .map_err(ChromaError::classify)?;
        Ok(collection_from_value(&response, embedding_function))
    }

    pub async fn get_collection(
        &self,
        name: &str,
        embedding_function: Option<Arc<dyn EmbeddingFunction>>,
    ) -> Result<Collection, ChromaError> {
        let response = self
            .api
            .get(&format!("{}/collections/{}", self.db_path(), name))
            .await
            .map_err(ChromaError::classify)?;
        Ok(collection_from_value(&response, embedding_function))
    }

    /// The one catch-and-recover path in the crate: a NotFound/Value-style
    /// "does not exist" outcome from the lookup falls through to creation.
    /// Every other failure propagates.
    pub async fn get_or_create_collection(
        &self,
        name: &str,
        metadata: HashMap<String, String>,
        embedding_function: Option<Arc<dyn EmbeddingFunction>>,
    ) -> Result<Collection, ChromaError> {
        match self.get_collection(name, embedding_function.clone()).await {
            Ok(collection) => Ok(collection),
            Err(ChromaError::NotFound(_)) | Err(ChromaError::Value(_)) => {
                self.create_collection(name, metadata, embedding_function)
                    .await
            }
            Err(other) => Err(other),
        }
    }

    pub async fn get_collections(
        &self,
        embedding_function: Option<Arc<dyn EmbeddingFunction>>,
    ) -> Result<Vec<Collection>, ChromaError> {
        let response = self
            .api
            .get(&format!("{}/collections", self.db_path()))
            .await
            .map_err(ChromaError::classify)?;

        Ok(response
            .as_array()
            .map(|collections| {
                collections
                    .iter()
                    .map(|c| collection_from_value(c, embedding_function.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn get_collection_count(&self) -> Result<usize, ChromaError> {
        let response = self
            .api
            .get(&format!("{}/collections_count", self.db_path()))
            .await
            .map_err(ChromaError::classify)?;
        Ok(response.as_u64().unwrap_or_default() as usize)
    }

    pub async fn collection_exists(&self, name: &str) -> Result<bool, ChromaError> {
        match self.get_collection(name, None).await {
            Ok(_) => Ok(true),
            Err(ChromaError::NotFound(_)) | Err(ChromaError::Value(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Renames a collection and/or replaces its metadata, returning a fresh
    /// handle under the new name.
    pub async fn update_collection(
        &self,
        old_name: &str,
        new_name: &str,
        new_metadata: HashMap<String, String>,
    ) -> Result<Collection, ChromaError> {
        let old_collection = self.get_collection(old_name, None).await?;

        let mut body = json!({ "new_name": new_name, "new_metadata": new_metadata });
        if new_metadata.is_empty() {
            if let Some(object) = body.as_object_mut() {
                object.remove("new_metadata");
            }
        }

        self.api
            .put(
                &format!("{}/collections/{}", self.db_path(), old_collection.id()?),
                body,
            )
            .await
            .map_err(ChromaError::classify)?;

        self.get_collection(new_name, old_collection.embedding_function()?)
            .await
    }

    /// Deletes the remote collection, then marks this specific handle
    /// deleted. Other handles to the same logical collection are not
    /// updated and will fail only once the server rejects them.
    pub async fn delete_collection(&self, collection: &mut Collection) -> Result<(), ChromaError> {
        let name = collection.name()?.to_string();
        self.api
            .delete(&format!("{}/collections/{}", self.db_path(), name))
            .await
            .map_err(ChromaError::classify)?;
        collection.mark_deleted();
        Ok(())
    }

    pub async fn delete_all_collections(&self) -> Result<(), ChromaError> {
        for mut collection in self.get_collections(None).await? {
            self.delete_collection(&mut collection).await?;
        }
        Ok(())
    }

    pub async fn add_embeddings(
        &self,
        collection: &Collection,
        params: EmbeddingsParams,
    ) -> Result<(), ChromaError> {
        self.write_embeddings(collection, params, "add", true).await
    }

    /// Updates existing records. Unlike add/upsert, embeddings are not
    /// required: a metadata- or document-only update is valid.
    pub async fn update_embeddings(
        &self,
        collection: &Collection,
        params: EmbeddingsParams,
    ) -> Result<(), ChromaError> {
        self.write_embeddings(collection, params, "update", false)
            .await
    }

    pub async fn upsert_embeddings(
        &self,
        collection: &Collection,
        params: EmbeddingsParams,
    ) -> Result<(), ChromaError> {
        self.write_embeddings(collection, params, "upsert", true)
            .await
    }

    async fn write_embeddings(
        &self,
        collection: &Collection,
        params: EmbeddingsParams,
        operation: &str,
        require_embeddings_or_documents: bool,
    ) -> Result<(), ChromaError> {
        let validated = self
            .validate(collection, params, require_embeddings_or_documents)
            .await?;
        let payload = EmbeddingsPayload {
            ids: validated.ids,
            embeddings: validated.embeddings,
            metadatas: validated.metadatas,
            documents: validated.documents,
        };

        self.api
            .post(
                &format!(
                    "{}/collections/{}/{}",
                    self.db_path(),
                    collection.id()?,
                    operation
                ),
                serde_json::to_value(&payload).map_err(|e| ChromaError::Request(e.to_string()))?,
            )
            .await
            .map_err(ChromaError::classify)?;
        Ok(())
    }

    /// Pre-flight validation of a bulk write. Purely local except for the
    /// embedding-generation sub-step; nothing is sent before it passes.
    async fn validate(
        &self,
        collection: &Collection,
        params: EmbeddingsParams,
        require_embeddings_or_documents: bool,
    ) -> Result<ValidationResult, ChromaError> {
        collection.check_deleted()?;

        let EmbeddingsParams {
            ids,
            embeddings,
            metadatas,
            documents,
        } = params;

        if require_embeddings_or_documents && embeddings.is_empty() && documents.is_empty() {
            return Err(ChromaError::InvalidArgument(
                "You must provide either embeddings or documents".to_string(),
            ));
        }

        if (!embeddings.is_empty() && embeddings.len() != ids.len())
            || (!metadatas.is_empty() && metadatas.len() != ids.len())
            || (!documents.is_empty() && documents.len() != ids.len())
        {
            return Err(ChromaError::InvalidArgument(
                "The number of ids, embeddings, metadatas and documents must be the same"
                    .to_string(),
            ));
        }

        let embeddings = if require_embeddings_or_documents && embeddings.is_empty() {
            match collection.embedding_function()? {
                None => {
                    return Err(ChromaError::InvalidArgument(
                        "You must provide an embedding function if you did not provide embeddings"
                            .to_string(),
                    ))
                }
                Some(function) if !documents.is_empty() => function.generate(&documents).await?,
                Some(_) => {
                    return Err(ChromaError::InvalidArgument(
                        "If you did not provide embeddings, you must provide documents".to_string(),
                    ))
                }
            }
        } else {
            embeddings
        };

        if let Some(first) = embeddings.first() {
            if embeddings.iter().any(|e| e.len() != first.len()) {
                return Err(ChromaError::Dimensionality(
                    "All embeddings must have the same dimensionality".to_string(),
                ));
            }
        }

        if ids.iter().any(String::is_empty) {
            return Err(ChromaError::InvalidArgument(
                "IDs must be non-empty strings".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for id in &ids {
            if !seen.insert(id.as_str()) && !duplicates.contains(&id.as_str()) {
                duplicates.push(id.as_str());
            }
        }
        if !duplicates.is_empty() {
            return Err(ChromaError::UniqueConstraint(format!(
                "Expected IDs to be unique, found duplicates for: {}",
                duplicates.join(", ")
            )));
        }

        Ok(ValidationResult {
            ids,
            embeddings,
            metadatas,
            documents,
        })
    }

    pub async fn get_embeddings(
        &self,
        collection: &Collection,
        params: GetEmbeddingsParams,
    ) -> Result<Vec<EmbeddingRecord>, ChromaError> {
        let payload = GetPayload {
            ids: params.ids,
            include: params.include,
            where_document: params.where_document,
            where_metadata: params.where_metadata,
        };

        let response = self
            .api
            .post(
                &format!("{}/collections/{}/get", self.db_path(), collection.id()?),
                serde_json::to_value(&payload).map_err(|e| ChromaError::Request(e.to_string()))?,
            )
            .await
            .map_err(ChromaError::classify)?;
        Ok(embedding_records_from_response(&response))
    }

    pub async fn get_embedding_count(&self, collection: &Collection) -> Result<usize, ChromaError> {
        let response = self
            .api
            .get(&format!(
                "{}/collections/{}/count",
                self.db_path(),
                collection.id()?
            ))
            .await
            .map_err(ChromaError::classify)?;
        Ok(response.as_u64().unwrap_or_default() as usize)
    }

    pub async fn delete_embeddings(
        &self,
        collection: &Collection,
        params: DeleteEmbeddingsParams,
    ) -> Result<(), ChromaError> {
        let payload = DeletePayload {
            ids: params.ids,
            where_document: params.where_document,
            where_metadata: params.where_metadata,
        };

        self.api
            .post(
                &format!(
                    "{}/collections/{}/delete",
                    self.db_path(),
                    collection.id()?
                ),
                serde_json::to_value(&payload).map_err(|e| ChromaError::Request(e.to_string()))?,
            )
            .await
            .map_err(ChromaError::classify)?;
        Ok(())
    }

    /// Similarity search. Filter trees in the params are forwarded verbatim;
    /// the server owns their semantics.
    pub async fn query(
        &self,
        collection: &Collection,
        params: QueryParams,
    ) -> Result<Vec<QueryResult>, ChromaError> {
        collection.check_deleted()?;

        let QueryParams {
            query_documents,
            query_embeddings,
            n_results,
            include,
            where_document,
            where_metadata,
        } = params;

        if !query_documents.is_empty() && !query_embeddings.is_empty() {
            return Err(ChromaError::InvalidArgument(
                "You must provide only one of query embeddings or query documents".to_string(),
            ));
        }

        let query_embeddings = if query_embeddings.is_empty() {
            match collection.embedding_function()? {
                None => {
                    return Err(ChromaError::InvalidArgument(
                        "You must provide an embedding function if you did not provide embeddings"
                            .to_string(),
                    ))
                }
                Some(function) if !query_documents.is_empty() => {
                    function.generate(&query_documents).await?
                }
                Some(_) => {
                    return Err(ChromaError::InvalidArgument(
                        "If you did not provide embeddings, you must provide query documents"
                            .to_string(),
                    ))
                }
            }
        } else {
            query_embeddings
        };

        let payload = QueryPayload {
            query_embeddings,
            n_results,
            include,
            where_document,
            where_metadata,
        };

        let response = self
            .api
            .post(
                &format!("{}/collections/{}/query", self.db_path(), collection.id()?),
                serde_json::to_value(&payload).map_err(|e| ChromaError::Request(e.to_string()))?,
            )
            .await
            .map_err(ChromaError::classify)?;
        Ok(query_results_from_response(&response))
    }
}

fn collection_from_value(
    value: &Value,
    embedding_function: Option<Arc<dyn EmbeddingFunction>>,
) -> Collection {
    let metadata = value
        .get("metadata")
        .filter(|m| !m.is_null())
        .map(string_map)
        .unwrap_or_default();

    Collection::new(
        value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        metadata,
        embedding_function,
    )
}
