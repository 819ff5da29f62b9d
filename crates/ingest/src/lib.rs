//! Metabridge Ingestion
//!
//! Batch ingestion of structural metadata from CSV files in an object store
//! into the metadata catalog. The pipeline is a single linear pass:
//!
//! 1. ensure the connection, database, and schema assets exist
//!    (lookup-before-create);
//! 2. list the bucket (prefix + key-name regex) or take the configured
//!    explicit object list;
//! 3. per object: fetch, infer the CSV column layout, ensure the table,
//!    batch-create missing columns, then patch each column's data type.
//!
//! There is no internal concurrency and no local persistence; the remote
//! catalog is the only state, and idempotent lookups make re-runs safe.

pub mod error;
pub mod infer;
pub mod pipeline;
pub mod store;

pub use error::{IngestError, Result};
pub use infer::{catalog_type, infer_columns, InferredColumn};
pub use pipeline::{table_name_for_key, IngestConfig, IngestJob, IngestReport};
pub use store::CsvObjectStore;
