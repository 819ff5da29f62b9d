//! Error types for the ingestion pipeline.

use metabridge_catalog_client::ClientError;

/// Errors that can occur while ingesting CSV metadata.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Catalog API failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] ClientError),

    /// Object store failure (list or fetch)
    #[error("Object store error: {0}")]
    Store(#[from] object_store::Error),

    /// CSV parsing / schema inference failure
    #[error("CSV inference error: {0}")]
    Csv(#[from] arrow_schema::ArrowError),

    /// Invalid key-name filter pattern
    #[error("Invalid key pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Invalid ingestion configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
