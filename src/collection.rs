use std::collections::HashMap;
use std::sync::Arc;

use crate::embed::EmbeddingFunction;
use crate::error::ChromaError;

/// Handle to a server-side collection.
///
/// Created only by the client facade, never directly. Immutable after
/// creation except for the deletion flag, which the facade flips when the
/// remote collection is deleted; from then on every accessor fails with
/// `NotFound`. Multiple handles to the same logical collection may coexist
/// (from list vs. get) and are not kept in sync with each other.
pub struct Collection {
    name: String,
    id: String,
    metadata: HashMap<String, String>,
    embedding_function: Option<Arc<dyn EmbeddingFunction>>,
    is_deleted: bool,
}

impl Collection {
    pub(crate) fn new(
        name: String,
        id: String,
        metadata: HashMap<String, String>,
        embedding_function: Option<Arc<dyn EmbeddingFunction>>,
    ) -> Self {
        Self {
            name,
            id,
            metadata,
            embedding_function,
            is_deleted: false,
        }
    }

    pub fn name(&self) -> Result<&str, ChromaError> {
        self.check_deleted()?;
        Ok(&self.name)
    }

    /// Server-assigned opaque id.
    pub fn id(&self) -> Result<&str, ChromaError> {
        self.check_deleted()?;
        Ok(&self.id)
    }

    pub fn metadata(&self) -> Result<&HashMap<String, String>, ChromaError> {
        self.check_deleted()?;
        Ok(&self.metadata)
    }

    pub fn embedding_function(&self) -> Result<Option<Arc<dyn EmbeddingFunction>>, ChromaError> {
        self.check_deleted()?;
        Ok(self.embedding_function.clone())
    }

    pub fn set_embedding_function(
        &mut self,
        embedding_function: Arc<dyn EmbeddingFunction>,
    ) -> Result<(), ChromaError> {
        self.check_deleted()?;
        self.embedding_function = Some(embedding_function);
        Ok(())
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Flipped by the facade after the remote delete succeeds. Only this
    /// specific handle is marked; other handles to the same logical
    /// collection keep working until the server rejects them.
    pub(crate) fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }

    pub(crate) fn check_deleted(&self) -> Result<(), ChromaError> {
        if self.is_deleted {
            return Err(ChromaError::NotFound(format!(
                "Collection {} is already deleted",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("metadata", &self.metadata)
            .field("is_deleted", &self.is_deleted)
            .finish()
    }
}
