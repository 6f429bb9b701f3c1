use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocvecError>;

#[derive(Error, Debug)]
pub enum DocvecError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Point {point_id} references missing document {document_id}")]
    Referential {
        point_id: String,
        document_id: String,
    },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod client;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod search;
pub mod storage;

pub use client::Client;
pub use documents::models::{Document, DocumentInput, Metadata, Point};
pub use search::{SearchHit, SearchRequest};
