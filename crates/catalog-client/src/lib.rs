//! Metabridge Catalog Client SDK
//!
//! A Rust HTTP client for the metabridge metadata catalog REST API. The
//! catalog stores connections, databases, schemas, tables, columns, and
//! lineage edges (Process / ColumnProcess), each uniquely identified by a
//! hierarchical qualified name.
//!
//! # Features
//!
//! - **HTTP Client**: asset search, batch save (create-or-update), fetch by
//!   qualified name
//! - **Automatic Retries**: exponential backoff for transient failures (5xx,
//!   429, connect/timeout); 4xx errors are fatal
//! - **Get-or-create**: [`AssetResolver`] looks every asset up by its
//!   identifying key before creating it, so re-runs never duplicate assets
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use metabridge_catalog_client::{
//!     AssetResolver, CatalogClient, ClientConfig, ConnectionSpec, ConnectorType,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(
//!         ClientConfig::builder("https://catalog.example.com")
//!             .api_token("mb_your_api_token")
//!             .timeout(Duration::from_secs(30))
//!             .build()?,
//!     )?;
//!
//!     let resolver = AssetResolver::new(&client);
//!     let connection = resolver
//!         .ensure_connection(&ConnectionSpec {
//!             name: "s3-landing".to_string(),
//!             connector: ConnectorType::S3,
//!             admin_groups: vec!["data-platform".to_string()],
//!             admin_users: vec![],
//!         })
//!         .await?;
//!     println!("connection: {}", connection.qualified_name);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T, ClientError>`. Retryable errors are
//! retried inside the client with exponential backoff; everything else
//! propagates to the caller as a fatal condition for that asset.

pub mod assets;
pub mod client;
pub mod config;
pub mod error;
pub mod resolver;
pub mod types;

// Re-exports for convenience
pub use assets::{
    connection_qualified_name_of, Asset, AssetRef, Column, ColumnProcess, Connection,
    ConnectorType, Database, Process, Schema, Table,
};
pub use client::{CatalogClient, SharedClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ClientError, Result};
pub use resolver::{AssetResolver, ConnectionSpec};
pub use types::{
    ApiError, AttributeFilter, HealthResponse, MutationResponse, SaveRequest, SearchRequest,
    SearchResults,
};
