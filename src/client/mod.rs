// Client module
// Binds configuration and the two collaborators once, then exposes the
// public operations: vector_search, search, add, remove, get_document, and
// the integrity checks.

use std::sync::Arc;

use crate::config::Config;
use crate::documents::models::{Document, DocumentInput};
use crate::documents::{self, IngestedDocument, IntegrityReport};
use crate::embeddings::{EmbeddingProvider, OllamaClient};
use crate::search::{self, SearchHit, SearchRequest};
use crate::storage::{SqliteEngine, StorageEngine};
use crate::{DocvecError, Result};

/// Entry point for document vector search.
///
/// All state lives in the storage collaborator; the client itself only
/// holds configuration and handles, so it is cheap to clone.
#[derive(Clone)]
pub struct Client {
    config: Config,
    storage: Arc<dyn StorageEngine>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl Client {
    /// Open (creating if necessary) the SQLite database under the
    /// configured base directory and wire up the Ollama embedding client.
    #[inline]
    pub async fn connect(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| DocvecError::Config(e.to_string()))?;

        let engine = SqliteEngine::new(config.database_path()).await?;
        engine.ensure_schema(&config.storage).await?;

        let ollama = OllamaClient::new(&config.ollama)
            .map_err(|e| DocvecError::Config(format!("{:#}", e)))?;

        Ok(Self {
            config,
            storage: Arc::new(engine),
            embeddings: Arc::new(ollama),
        })
    }

    /// Build a client around caller-supplied collaborators. The storage
    /// engine is expected to already have the schema in place.
    #[inline]
    pub fn with_collaborators(
        config: Config,
        storage: Arc<dyn StorageEngine>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            config,
            storage,
            embeddings,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Top-k nearest-neighbor search with a pre-computed query vector.
    #[inline]
    pub async fn vector_search(
        &self,
        vector: &[f32],
        top_k: usize,
        with_embedding: bool,
    ) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            vector,
            top_k,
            with_embedding,
        };
        search::vector_search(self.storage.as_ref(), &self.config.storage, &request).await
    }

    /// Embed the query text, then run a top-k vector search. Returned
    /// points carry empty embeddings; use [`Client::vector_search`] when
    /// the stored vectors are needed.
    #[inline]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(DocvecError::Validation(
                "Query text cannot be empty".to_string(),
            ));
        }

        let vectors = self.embeddings.embed_batch(&[query.to_string()]).await?;
        let vector = vectors.into_iter().next().ok_or_else(|| {
            DocvecError::Embedding("Embedder returned no vector for the query".to_string())
        })?;

        self.vector_search(&vector, top_k, false).await
    }

    /// Ingest documents; see [`documents::add_documents`] for the
    /// atomicity contract.
    #[inline]
    pub async fn add(&self, inputs: Vec<DocumentInput>) -> Result<Vec<IngestedDocument>> {
        documents::add_documents(
            self.storage.as_ref(),
            self.embeddings.as_ref(),
            &self.config.storage,
            &self.config.chunking,
            inputs,
        )
        .await
    }

    /// Remove a document and all of its points. Removing an unknown id is
    /// a no-op returning `false`.
    #[inline]
    pub async fn remove(&self, document_id: &str) -> Result<bool> {
        documents::remove_document(self.storage.as_ref(), &self.config.storage, document_id).await
    }

    #[inline]
    pub async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        documents::get_document(self.storage.as_ref(), &self.config.storage, document_id).await
    }

    /// Scan for orphaned points and point-less documents.
    #[inline]
    pub async fn validate_integrity(&self) -> Result<IntegrityReport> {
        documents::consistency::validate_integrity(self.storage.as_ref(), &self.config.storage)
            .await
    }

    /// Delete points whose owning document is gone. Returns how many were
    /// removed.
    #[inline]
    pub async fn cleanup_orphaned_points(&self) -> Result<u64> {
        documents::consistency::cleanup_orphaned_points(self.storage.as_ref(), &self.config.storage)
            .await
    }
}
