
use tracing::warn;

use crate::config::JoinPolicy;
use crate::documents::models::{Document, Point};
use crate::search::SearchHit;
use crate::storage::RawRow;
use crate::{DocvecError, Result};

/// Convert raw result rows into search hits, preserving row order.
///
/// Point and document are built from the same row; each constructor ignores
/// the columns that belong to the other. Any row that fails to materialize
/// aborts the whole batch, so callers get either a complete result set or a
/// fault, never a partial one.
///
/// Under a left join, a point whose document row is missing materializes
/// with `document: None`; under an inner join such points never reach this
/// layer because the join drops them.
#[inline]
pub fn materialize_hits(rows: &[RawRow], join_policy: JoinPolicy) -> Result<Vec<SearchHit>> {
    rows.iter()
        .map(|row| materialize_hit(row, join_policy))
        .collect()
}

fn materialize_hit(row: &RawRow, join_policy: JoinPolicy) -> Result<SearchHit> {
    let point = Point::from_row(row)?;

    let document = if join_policy == JoinPolicy::Left && document_side_is_null(row) {
        warn!(
            "Point {} references missing document {}",
            point.point_id, point.document_id
        );
        None
    } else {
        Some(Document::from_row(row)?)
    };

    let score = relevance_score(row)?;

    Ok(SearchHit {
        point,
        document,
        score,
    })
}

/// A left join reports a missing document row as NULLs in every document
/// column; `name` is NOT NULL in the schema, so it is the discriminator.
fn document_side_is_null(row: &RawRow) -> bool {
    matches!(
        row.get("document_name"),
        None | Some(serde_json::Value::Null)
    )
}

fn relevance_score(row: &RawRow) -> Result<f32> {
    match row.get("relevance_score") {
        Some(value) => value.as_f64().map(|score| score as f32).ok_or_else(|| {
            DocvecError::Validation(format!(
                "Column relevance_score must be numeric, got: {}",
                value
            ))
        }),
        None => Err(DocvecError::Validation(
            "Column relevance_score is missing from the result row".to_string(),
        )),
    }
}
