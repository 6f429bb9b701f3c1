//! Schema templates for the documents and points relations.
//!
//! Table names come from validated configuration, so they are spliced as
//! identifiers; everything else is fixed. Embeddings are stored as JSON text
//! arrays, which the sqlite-vec functions accept directly. Metadata columns
//! are nullable JSON text; a NULL decodes to an empty map at read time.

use crate::config::StorageConfig;

/// All statements needed to bring a database up to the current schema,
/// in execution order.
#[inline]
pub fn schema_statements(config: &StorageConfig) -> Vec<String> {
    vec![
        create_documents_table(&config.documents_table),
        create_points_table(&config.points_table, &config.documents_table),
        create_points_document_index(&config.points_table),
    ]
}

fn create_documents_table(documents_table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {documents_table} (
            document_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"
    )
}

fn create_points_table(points_table: &str, documents_table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {points_table} (
            point_id TEXT PRIMARY KEY,
            document_id TEXT NOT NULL
                REFERENCES {documents_table}(document_id) ON DELETE CASCADE,
            chunk_index INTEGER NOT NULL,
            chunk_text TEXT NOT NULL,
            embedding TEXT NOT NULL,
            metadata TEXT
        )"
    )
}

fn create_points_document_index(points_table: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS idx_{points_table}_document_id \
         ON {points_table}(document_id)"
    )
}
