
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{RawRow, SqlValue};
use crate::{DocvecError, Result};

/// Free-form key-value metadata. Always materialized, never null; absent
/// input decodes to an empty map.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A retrievable unit derived from one chunk of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub point_id: String,
    pub document_id: String,
    pub chunk_index: i64,
    pub chunk_text: String,
    /// Empty when the search that produced this point did not request
    /// embeddings.
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

/// A logical unit of text owning one or more points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub name: String,
    pub content: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document to be ingested. When `document_id` is absent one is assigned
/// during ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub document_id: Option<String>,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl DocumentInput {
    #[inline]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            document_id: None,
            name: name.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Point {
    /// Build a point from a raw result row. The row may carry columns this
    /// constructor does not look at; they are ignored.
    #[inline]
    pub fn from_row(row: &RawRow) -> Result<Self> {
        Ok(Self {
            point_id: required_text(row, "point_id")?,
            document_id: required_text(row, "document_id")?,
            chunk_index: required_integer(row, "chunk_index")?,
            chunk_text: required_text(row, "chunk_text")?,
            embedding: decode_embedding(row.get("embedding"))?,
            metadata: decode_metadata(row.get("point_metadata"), "point_metadata")?,
        })
    }

    #[inline]
    pub fn mint_id() -> String {
        format!("pt-{}", Uuid::new_v4())
    }
}

impl Document {
    /// Build a document from a raw result row using the `document_`-prefixed
    /// aliases the search projection and the by-id lookup both emit.
    #[inline]
    pub fn from_row(row: &RawRow) -> Result<Self> {
        Ok(Self {
            document_id: required_text(row, "document_id")?,
            name: required_text(row, "document_name")?,
            content: required_text(row, "document_content")?,
            metadata: decode_metadata(row.get("document_metadata"), "document_metadata")?,
            created_at: required_timestamp(row, "document_created_at")?,
            updated_at: required_timestamp(row, "document_updated_at")?,
        })
    }

    #[inline]
    pub fn mint_id() -> String {
        format!("doc-{}", Uuid::new_v4())
    }
}

/// Decode a text-encoded metadata blob. NULL, missing, and empty-string
/// blobs all decode to an empty map; anything else must be a JSON object.
#[inline]
pub fn decode_metadata(value: Option<&serde_json::Value>, column: &str) -> Result<Metadata> {
    let Some(value) = value else {
        return Ok(Metadata::new());
    };

    let text = match value {
        serde_json::Value::Null => return Ok(Metadata::new()),
        serde_json::Value::String(text) => text,
        other => {
            return Err(DocvecError::Validation(format!(
                "Column {} holds a non-text metadata blob: {}",
                column, other
            )));
        }
    };

    if text.trim().is_empty() {
        return Ok(Metadata::new());
    }

    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(DocvecError::Validation(format!(
            "Column {} must decode to a JSON object, got: {}",
            column, other
        ))),
        Err(e) => Err(DocvecError::Validation(format!(
            "Column {} holds malformed JSON: {}",
            column, e
        ))),
    }
}

/// Encode a metadata map for storage. Empty maps are stored as NULL so the
/// NULL-to-empty read path is the one real data exercises.
#[inline]
pub fn encode_metadata(metadata: &Metadata) -> SqlValue {
    if metadata.is_empty() {
        SqlValue::Null
    } else {
        SqlValue::Text(serde_json::Value::Object(metadata.clone()).to_string())
    }
}

fn decode_embedding(value: Option<&serde_json::Value>) -> Result<Vec<f32>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::String(text) => serde_json::from_str(text).map_err(|e| {
            DocvecError::Validation(format!("Column embedding holds a malformed vector: {}", e))
        }),
        other => Err(DocvecError::Validation(format!(
            "Column embedding holds a non-text value: {}",
            other
        ))),
    }
}

fn required_text(row: &RawRow, column: &str) -> Result<String> {
    match row.get(column) {
        Some(serde_json::Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(DocvecError::Validation(format!(
            "Column {} must be text, got: {}",
            column, other
        ))),
        None => Err(DocvecError::Validation(format!(
            "Column {} is missing from the result row",
            column
        ))),
    }
}

fn required_integer(row: &RawRow, column: &str) -> Result<i64> {
    match row.get(column) {
        Some(value) => value.as_i64().ok_or_else(|| {
            DocvecError::Validation(format!("Column {} must be an integer, got: {}", column, value))
        }),
        None => Err(DocvecError::Validation(format!(
            "Column {} is missing from the result row",
            column
        ))),
    }
}

fn required_timestamp(row: &RawRow, column: &str) -> Result<DateTime<Utc>> {
    let text = required_text(row, column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            DocvecError::Validation(format!("Column {} holds an invalid timestamp: {}", column, e))
        })
}
