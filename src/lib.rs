//! Async client for a chroma vector database.
//!
//! Connecting provisions the tenant and database, then collections hold the
//! embeddings:
//!
//! ```no_run
//! use chroma_client_rs::prelude::*;
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ChromaError> {
//!     let client = ChromaClient::new(ConnectParams::default()).await?;
//!     let collection = client
//!         .get_or_create_collection("quotes", HashMap::new(), None)
//!         .await?;
//!
//!     client
//!         .add_embeddings(
//!             &collection,
//!             EmbeddingsParams::builder()
//!                 .ids(vec!["ID1".into(), "ID2".into()])
//!                 .embeddings(vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]])
//!                 .build(),
//!         )
//!         .await?;
//!
//!     let results = client
//!         .query(
//!             &collection,
//!             QueryParams::builder()
//!                 .query_embeddings(vec![vec![0.1, 0.2, 0.3]])
//!                 .n_results(1usize)
//!                 .build(),
//!         )
//!         .await?;
//!     println!("closest: {:?}", results[0].ids);
//!     Ok(())
//! }
//! ```
//!
//! Callers without precomputed vectors attach an [`embed::EmbeddingProvider`]
//! (or their own [`embed::EmbeddingFunction`]) to a collection and pass
//! documents instead; the client embeds them before dispatch:
//!
//! ```no_run
//! use chroma_client_rs::prelude::*;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ChromaError> {
//!     let client = ChromaClient::new(ConnectParams::default()).await?;
//!     let embedder = Arc::new(EmbeddingProvider::ollama().with_model("all-minilm"));
//!     let collection = client
//!         .get_or_create_collection("quotes", HashMap::new(), Some(embedder))
//!         .await?;
//!
//!     client
//!         .add_embeddings(
//!             &collection,
//!             EmbeddingsParams::builder()
//!                 .ids(vec!["ID1".into()])
//!                 .documents(vec!["the quick brown fox".into()])
//!                 .build(),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

mod api;
pub mod builders;
pub mod client;
pub mod collection;
pub mod embed;
pub mod error;
pub mod prelude;
pub mod types;
