//! The two fixed column sets a similarity query may project. Exactly one is
//! used per query; the embedding column is the only difference, so callers
//! control payload size without changing the result shape.
//!
//! Aliases keep the two metadata blobs and the document attributes apart
//! when point and document back the same row.

use itertools::Itertools;

pub const COLUMNS_WITH_EMBEDDING: &[&str] = &[
    "p.point_id",
    "p.document_id",
    "p.chunk_index",
    "p.chunk_text",
    "p.embedding",
    "p.metadata AS point_metadata",
    "d.name AS document_name",
    "d.content AS document_content",
    "d.metadata AS document_metadata",
    "d.created_at AS document_created_at",
    "d.updated_at AS document_updated_at",
];

pub const COLUMNS_WITHOUT_EMBEDDING: &[&str] = &[
    "p.point_id",
    "p.document_id",
    "p.chunk_index",
    "p.chunk_text",
    "p.metadata AS point_metadata",
    "d.name AS document_name",
    "d.content AS document_content",
    "d.metadata AS document_metadata",
    "d.created_at AS document_created_at",
    "d.updated_at AS document_updated_at",
];

/// The SELECT expression for the requested column set.
#[inline]
pub fn select_expr(with_embedding: bool) -> String {
    let columns = if with_embedding {
        COLUMNS_WITH_EMBEDDING
    } else {
        COLUMNS_WITHOUT_EMBEDDING
    };
    columns.iter().join(", ")
}
