
use crate::config::{JoinPolicy, StorageConfig};
use crate::search::columns;
use crate::storage::{BoundQuery, SqlValue};
use crate::{DocvecError, Result};

/// The store's native vector comparison operator. It returns a cosine
/// distance; the query converts it to a similarity so higher is better.
pub const SIMILARITY_FUNCTION: &str = "vec_distance_cosine";

/// Build the parameterized top-k similarity query.
///
/// The query vector travels as a bound JSON-text parameter, never spliced
/// into the SQL. Table names come from configuration and are validated as
/// bare identifiers at config load.
///
/// Fails fast with a validation error before any storage access when the
/// caller contract is violated: `top_k` of zero, an empty or non-finite
/// vector, or a vector whose length differs from the configured
/// dimensionality.
#[inline]
pub fn build_similarity_query(
    config: &StorageConfig,
    vector: &[f32],
    top_k: usize,
    with_embedding: bool,
) -> Result<BoundQuery> {
    if top_k == 0 {
        return Err(DocvecError::Validation(
            "top_k must be at least 1".to_string(),
        ));
    }

    if vector.is_empty() {
        return Err(DocvecError::Validation(
            "Query vector cannot be empty".to_string(),
        ));
    }

    if vector.iter().any(|v| !v.is_finite()) {
        return Err(DocvecError::Validation(
            "Query vector contains non-finite values".to_string(),
        ));
    }

    if vector.len() != config.embedding_dimensions {
        return Err(DocvecError::Validation(format!(
            "Query vector has {} dimensions, expected {}",
            vector.len(),
            config.embedding_dimensions
        )));
    }

    let join = match config.join_policy {
        JoinPolicy::Inner => "INNER JOIN",
        JoinPolicy::Left => "LEFT JOIN",
    };

    let sql = format!(
        "SELECT {columns}, 1.0 - {similarity}(p.embedding, ?) AS relevance_score \
         FROM {points} AS p \
         {join} {documents} AS d ON p.document_id = d.document_id \
         ORDER BY relevance_score DESC \
         LIMIT ?",
        columns = columns::select_expr(with_embedding),
        similarity = SIMILARITY_FUNCTION,
        points = config.points_table,
        documents = config.documents_table,
    );

    let vector_param = serde_json::to_string(vector)
        .map_err(|e| DocvecError::Validation(format!("Failed to encode query vector: {}", e)))?;

    Ok(BoundQuery::new(sql)
        .bind(SqlValue::Text(vector_param))
        .bind(SqlValue::Integer(top_k as i64)))
}
