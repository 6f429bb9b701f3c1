// Embeddings module
// Capability interface over the text-to-vector collaborator, plus content
// chunking and the shipped Ollama client.

pub mod chunking;
pub mod ollama;

use async_trait::async_trait;

use crate::Result;

pub use chunking::{ChunkingConfig, TextChunk, chunk_text, estimate_token_count};
pub use ollama::OllamaClient;

/// Contract for the embedding collaborator: turn text into fixed-width
/// numeric vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in input
    /// order. Implementations must not block the async executor.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
