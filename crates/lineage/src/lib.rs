//! Metabridge Lineage
//!
//! Infers and materializes lineage edges between tables and columns across
//! three platform tiers (Postgres, object store, warehouse) by exact name
//! matching. For each adjacent tier pair, tables with equal names get one
//! table-level Process edge, and their equally named columns get one
//! ColumnProcess edge each, parented to that Process.
//!
//! The pipeline runs in two phases:
//!
//! - [`LineageJob::discover`] resolves the configured connections and
//!   enumerates their tables, so a caller can display the inventory and ask
//!   for confirmation;
//! - [`LineageJob::establish`] matches and writes the edges, looking each
//!   edge up by its derived qualified name first. Re-invoking on an
//!   already-linked pair creates nothing new.

pub mod matcher;
pub mod pipeline;
pub mod writer;

pub use matcher::{match_by_name, MatchOutcome, MatchedPair, NamedAsset};
pub use pipeline::{LineageConfig, LineageDiscovery, LineageJob, LineageReport, TierTables};
pub use writer::{ColumnLinkStats, LineageWriter, LinkOutcome};
