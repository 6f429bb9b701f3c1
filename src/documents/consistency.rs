//! Referential-integrity checks between documents and points.
//!
//! The lifecycle layer keeps the two relations consistent, but outside
//! writers sharing the database can leave points behind whose document is
//! gone. Search handles such orphans per the configured join policy; this
//! module is where they become visible as a hard fault.

use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::storage::{BoundQuery, StorageEngine};
use crate::{DocvecError, Result};

/// A point whose owning document row is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedPoint {
    pub point_id: String,
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Points referencing a document that no longer exists.
    pub orphaned_points: Vec<OrphanedPoint>,
    /// Documents that own no points at all.
    pub empty_documents: Vec<String>,
}

impl IntegrityReport {
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.orphaned_points.is_empty() && self.empty_documents.is_empty()
    }
}

/// Scan for orphaned points and point-less documents.
#[inline]
pub async fn validate_integrity(
    storage: &dyn StorageEngine,
    storage_config: &StorageConfig,
) -> Result<IntegrityReport> {
    debug!("Validating document/point referential integrity");

    let orphan_rows = storage
        .fetch_all(BoundQuery::new(format!(
            "SELECT p.point_id, p.document_id \
             FROM {points} AS p \
             LEFT JOIN {documents} AS d ON p.document_id = d.document_id \
             WHERE d.document_id IS NULL",
            points = storage_config.points_table,
            documents = storage_config.documents_table,
        )))
        .await?;

    let orphaned_points = orphan_rows
        .iter()
        .map(|row| {
            Ok(OrphanedPoint {
                point_id: text_column(row, "point_id")?,
                document_id: text_column(row, "document_id")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let empty_rows = storage
        .fetch_all(BoundQuery::new(format!(
            "SELECT d.document_id \
             FROM {documents} AS d \
             LEFT JOIN {points} AS p ON p.document_id = d.document_id \
             WHERE p.point_id IS NULL",
            points = storage_config.points_table,
            documents = storage_config.documents_table,
        )))
        .await?;

    let empty_documents = empty_rows
        .iter()
        .map(|row| text_column(row, "document_id"))
        .collect::<Result<Vec<_>>>()?;

    let report = IntegrityReport {
        orphaned_points,
        empty_documents,
    };

    if !report.is_consistent() {
        warn!(
            "Integrity check found {} orphaned points and {} empty documents",
            report.orphaned_points.len(),
            report.empty_documents.len()
        );
    }

    Ok(report)
}

/// Fail with a referential fault if any point references a missing
/// document.
#[inline]
pub async fn ensure_referential_integrity(
    storage: &dyn StorageEngine,
    storage_config: &StorageConfig,
) -> Result<()> {
    let report = validate_integrity(storage, storage_config).await?;

    match report.orphaned_points.into_iter().next() {
        Some(orphan) => Err(DocvecError::Referential {
            point_id: orphan.point_id,
            document_id: orphan.document_id,
        }),
        None => Ok(()),
    }
}

/// Delete every orphaned point. Returns the number of points removed.
#[inline]
pub async fn cleanup_orphaned_points(
    storage: &dyn StorageEngine,
    storage_config: &StorageConfig,
) -> Result<u64> {
    let removed = storage
        .execute(BoundQuery::new(format!(
            "DELETE FROM {points} WHERE document_id NOT IN \
             (SELECT document_id FROM {documents})",
            points = storage_config.points_table,
            documents = storage_config.documents_table,
        )))
        .await?;

    if removed > 0 {
        warn!("Cleaned up {} orphaned points", removed);
    }

    Ok(removed)
}

fn text_column(row: &crate::storage::RawRow, column: &str) -> Result<String> {
    match row.get(column) {
        Some(serde_json::Value::String(text)) => Ok(text.clone()),
        other => Err(DocvecError::Storage(format!(
            "Integrity query returned an unexpected {} value: {:?}",
            column, other
        ))),
    }
}
