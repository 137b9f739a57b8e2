pub use crate::builders::{
    ConnectParams, DeleteEmbeddingsParams, EmbeddingsParams, GetEmbeddingsParams, QueryParams,
};
pub use crate::client::ChromaClient;
pub use crate::collection::Collection;
pub use crate::embed::{EmbeddingFunction, EmbeddingProvider};
pub use crate::error::ChromaError;
pub use crate::types::{EmbeddingRecord, QueryResult, UserIdentity};
