// Search module
// Turns a query vector into a ranked list of (point, document, score) hits.


pub mod columns;
pub mod materialize;
pub mod query;

use tracing::debug;

use crate::Result;
use crate::config::StorageConfig;
use crate::documents::models::{Document, Point};
use crate::storage::StorageEngine;

/// One ranked search result: the matched point, its owning document, and
/// the cosine similarity between the query vector and the point's embedding.
///
/// The document is absent only when the join policy is `Left` and the point
/// is orphaned; with the default inner join it is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub point: Point,
    pub document: Option<Document>,
    pub score: f32,
}

/// Parameters for one similarity search.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub vector: &'a [f32],
    pub top_k: usize,
    /// When false, returned points carry an empty embedding instead of the
    /// stored vector, which keeps result payloads small.
    pub with_embedding: bool,
}

/// Run a top-k vector similarity search against the storage collaborator.
///
/// Issues exactly one read query. Returns at most `top_k` hits ordered by
/// descending score; an empty corpus yields an empty list, not an error.
/// The order of hits with equal scores is up to the store and not
/// guaranteed stable. Input-contract violations surface as validation
/// faults before any storage access; execution failures surface as storage
/// faults; malformed rows abort the whole call during materialization.
#[inline]
pub async fn vector_search(
    storage: &dyn StorageEngine,
    config: &StorageConfig,
    request: &SearchRequest<'_>,
) -> Result<Vec<SearchHit>> {
    let bound =
        query::build_similarity_query(config, request.vector, request.top_k, request.with_embedding)?;

    debug!(
        "Running similarity search (top_k = {}, with_embedding = {})",
        request.top_k, request.with_embedding
    );

    let rows = storage.fetch_all(bound).await?;
    let hits = materialize::materialize_hits(&rows, config.join_policy)?;

    debug!("Similarity search produced {} hits", hits.len());
    Ok(hits)
}
