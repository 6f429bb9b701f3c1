// Documents module
// Lifecycle management that keeps documents and their points consistent
// across ingestion and removal.


pub mod consistency;
pub mod models;

use chrono::Utc;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::embeddings::chunking::{self, ChunkingConfig};
use crate::embeddings::EmbeddingProvider;
use crate::storage::{BoundQuery, SqlValue, StorageEngine};
use crate::{DocvecError, Result};

use models::{Document, DocumentInput, Metadata, Point, encode_metadata};

pub use consistency::{IntegrityReport, OrphanedPoint};

/// A document together with the points created for it during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedDocument {
    pub document: Document,
    pub points: Vec<Point>,
}

/// Ingest a batch of documents: chunk, embed, and persist each one.
///
/// Each document commits in its own transaction (document row plus all of
/// its point rows), so a persisted document always has at least one point.
/// The batch fails closed: the first failing document aborts the call with
/// its error, and documents committed earlier in the batch stay committed.
#[inline]
pub async fn add_documents(
    storage: &dyn StorageEngine,
    embeddings: &dyn EmbeddingProvider,
    storage_config: &StorageConfig,
    chunking_config: &ChunkingConfig,
    inputs: Vec<DocumentInput>,
) -> Result<Vec<IngestedDocument>> {
    let mut ingested = Vec::with_capacity(inputs.len());

    for input in inputs {
        let document = add_document(
            storage,
            embeddings,
            storage_config,
            chunking_config,
            input,
        )
        .await?;
        ingested.push(document);
    }

    Ok(ingested)
}

async fn add_document(
    storage: &dyn StorageEngine,
    embeddings: &dyn EmbeddingProvider,
    storage_config: &StorageConfig,
    chunking_config: &ChunkingConfig,
    input: DocumentInput,
) -> Result<IngestedDocument> {
    if input.name.trim().is_empty() {
        return Err(DocvecError::Validation(
            "Document name cannot be empty".to_string(),
        ));
    }

    let chunks = chunking::chunk_text(&input.content, chunking_config);
    if chunks.is_empty() {
        return Err(DocvecError::Validation(format!(
            "Document {:?} has no content to index",
            input.name
        )));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = embeddings.embed_batch(&texts).await?;

    if vectors.len() != chunks.len() {
        return Err(DocvecError::Embedding(format!(
            "Embedder returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    for vector in &vectors {
        if vector.len() != storage_config.embedding_dimensions {
            return Err(DocvecError::Validation(format!(
                "Embedder produced a {}-dimensional vector, expected {}",
                vector.len(),
                storage_config.embedding_dimensions
            )));
        }
    }

    let document_id = input.document_id.unwrap_or_else(Document::mint_id);
    let now = Utc::now();
    let document = Document {
        document_id: document_id.clone(),
        name: input.name,
        content: input.content,
        metadata: input.metadata,
        created_at: now,
        updated_at: now,
    };

    let mut statements = Vec::with_capacity(chunks.len() + 1);
    statements.push(insert_document_statement(storage_config, &document));

    let mut points = Vec::with_capacity(chunks.len());
    for (chunk, vector) in chunks.into_iter().zip(vectors) {
        let point = Point {
            point_id: Point::mint_id(),
            document_id: document_id.clone(),
            chunk_index: chunk.chunk_index as i64,
            chunk_text: chunk.content,
            embedding: vector,
            metadata: Metadata::new(),
        };
        statements.push(insert_point_statement(storage_config, &point)?);
        points.push(point);
    }

    storage.execute_transactional(statements).await?;

    info!(
        "Ingested document {} ({:?}) with {} points",
        document.document_id,
        document.name,
        points.len()
    );

    Ok(IngestedDocument { document, points })
}

/// Remove a document and every point that references it, in one
/// transaction. Removing an id that does not exist is a no-op; the return
/// value reports whether a document row was actually deleted.
#[inline]
pub async fn remove_document(
    storage: &dyn StorageEngine,
    storage_config: &StorageConfig,
    document_id: &str,
) -> Result<bool> {
    let affected = storage
        .execute_transactional(vec![
            BoundQuery::new(format!(
                "DELETE FROM {} WHERE document_id = ?",
                storage_config.points_table
            ))
            .bind(SqlValue::Text(document_id.to_string())),
            BoundQuery::new(format!(
                "DELETE FROM {} WHERE document_id = ?",
                storage_config.documents_table
            ))
            .bind(SqlValue::Text(document_id.to_string())),
        ])
        .await?;

    let points_removed = affected.first().copied().unwrap_or(0);
    let removed = affected.get(1).copied().unwrap_or(0) > 0;

    if removed {
        info!(
            "Removed document {} and {} points",
            document_id, points_removed
        );
    } else {
        debug!("Remove of nonexistent document {} was a no-op", document_id);
    }

    Ok(removed)
}

/// Fetch a single document by id.
#[inline]
pub async fn get_document(
    storage: &dyn StorageEngine,
    storage_config: &StorageConfig,
    document_id: &str,
) -> Result<Option<Document>> {
    let query = BoundQuery::new(format!(
        "SELECT document_id, \
                name AS document_name, \
                content AS document_content, \
                metadata AS document_metadata, \
                created_at AS document_created_at, \
                updated_at AS document_updated_at \
         FROM {} WHERE document_id = ?",
        storage_config.documents_table
    ))
    .bind(SqlValue::Text(document_id.to_string()));

    let rows = storage.fetch_all(query).await?;

    match rows.first() {
        Some(row) => Document::from_row(row).map(Some),
        None => Ok(None),
    }
}

fn insert_document_statement(storage_config: &StorageConfig, document: &Document) -> BoundQuery {
    BoundQuery::new(format!(
        "INSERT INTO {} (document_id, name, content, metadata, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
        storage_config.documents_table
    ))
    .bind(SqlValue::Text(document.document_id.clone()))
    .bind(SqlValue::Text(document.name.clone()))
    .bind(SqlValue::Text(document.content.clone()))
    .bind(encode_metadata(&document.metadata))
    .bind(SqlValue::Text(document.created_at.to_rfc3339()))
    .bind(SqlValue::Text(document.updated_at.to_rfc3339()))
}

fn insert_point_statement(storage_config: &StorageConfig, point: &Point) -> Result<BoundQuery> {
    let embedding = serde_json::to_string(&point.embedding)
        .map_err(|e| DocvecError::Validation(format!("Failed to encode embedding: {}", e)))?;

    Ok(BoundQuery::new(format!(
        "INSERT INTO {} (point_id, document_id, chunk_index, chunk_text, embedding, metadata) \
         VALUES (?, ?, ?, ?, ?, ?)",
        storage_config.points_table
    ))
    .bind(SqlValue::Text(point.point_id.clone()))
    .bind(SqlValue::Text(point.document_id.clone()))
    .bind(SqlValue::Integer(point.chunk_index))
    .bind(SqlValue::Text(point.chunk_text.clone()))
    .bind(SqlValue::Text(embedding))
    .bind(encode_metadata(&point.metadata)))
}
