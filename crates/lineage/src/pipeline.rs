//! The lineage pipeline: discover tiers, then establish edges.
//!
//! Discovery and establishment are separate phases so the caller can show
//! the discovered tables and gate the writes behind a confirmation prompt.

use crate::matcher::match_by_name;
use crate::writer::LineageWriter;
use metabridge_catalog_client::{AssetResolver, CatalogClient, Result, Table};
use tracing::{info, warn};

/// Names of the three connections participating in lineage.
#[derive(Debug, Clone)]
pub struct LineageConfig {
    /// Postgres source tier connection name
    pub postgres_connection: String,
    /// Object-store middle tier connection name
    pub object_store_connection: String,
    /// Warehouse target tier connection name
    pub warehouse_connection: String,
}

/// One tier's discovered state.
#[derive(Debug, Clone)]
pub struct TierTables {
    /// Configured connection name
    pub connection_name: String,
    /// Resolved qualified name; `None` when the connection was not found
    pub connection_qualified_name: Option<String>,
    /// Tables enumerated under the connection
    pub tables: Vec<Table>,
}

/// All three tiers' discovered state.
#[derive(Debug, Clone)]
pub struct LineageDiscovery {
    pub postgres: TierTables,
    pub object_store: TierTables,
    pub warehouse: TierTables,
}

impl LineageDiscovery {
    /// The tiers in flow order.
    pub fn tiers(&self) -> [&TierTables; 3] {
        [&self.postgres, &self.object_store, &self.warehouse]
    }
}

/// Counts from one establishment run.
#[derive(Debug, Clone, Default)]
pub struct LineageReport {
    pub processes_created: usize,
    pub processes_existing: usize,
    pub column_processes_created: usize,
    pub column_processes_existing: usize,
    pub unmatched_tables: usize,
    pub unmatched_columns: usize,
}

/// The lineage job, spanning discovery and establishment.
pub struct LineageJob {
    client: CatalogClient,
    config: LineageConfig,
}

impl LineageJob {
    pub fn new(client: CatalogClient, config: LineageConfig) -> Self {
        Self { client, config }
    }

    /// Resolve the three connections and enumerate their tables.
    ///
    /// A missing connection yields an empty tier (warned), so discovery
    /// itself never fails on absent configuration targets.
    pub async fn discover(&self) -> Result<LineageDiscovery> {
        Ok(LineageDiscovery {
            postgres: self.discover_tier(&self.config.postgres_connection).await?,
            object_store: self
                .discover_tier(&self.config.object_store_connection)
                .await?,
            warehouse: self.discover_tier(&self.config.warehouse_connection).await?,
        })
    }

    async fn discover_tier(&self, connection_name: &str) -> Result<TierTables> {
        let resolver = AssetResolver::new(&self.client);

        match resolver.find_connection(connection_name).await? {
            Some(connection) => {
                let tables = resolver.list_tables(&connection.qualified_name).await?;
                info!(
                    connection = %connection_name,
                    tables = tables.len(),
                    "Enumerated tables"
                );
                Ok(TierTables {
                    connection_name: connection_name.to_string(),
                    connection_qualified_name: Some(connection.qualified_name),
                    tables,
                })
            }
            None => {
                warn!(connection = %connection_name, "Connection not found");
                Ok(TierTables {
                    connection_name: connection_name.to_string(),
                    connection_qualified_name: None,
                    tables: Vec::new(),
                })
            }
        }
    }

    /// Write lineage for the adjacent tier pairs: Postgres to object store,
    /// then object store to warehouse.
    pub async fn establish(&self, discovery: &LineageDiscovery) -> Result<LineageReport> {
        let mut report = LineageReport::default();

        self.establish_between(&discovery.postgres, &discovery.object_store, &mut report)
            .await?;
        self.establish_between(&discovery.object_store, &discovery.warehouse, &mut report)
            .await?;

        info!(
            processes_created = report.processes_created,
            processes_existing = report.processes_existing,
            column_processes_created = report.column_processes_created,
            column_processes_existing = report.column_processes_existing,
            "Lineage establishment completed"
        );
        Ok(report)
    }

    async fn establish_between(
        &self,
        source: &TierTables,
        target: &TierTables,
        report: &mut LineageReport,
    ) -> Result<()> {
        let Some(target_connection_qn) = target.connection_qualified_name.as_deref() else {
            warn!(
                source = %source.connection_name,
                target = %target.connection_name,
                "Target connection unresolved, skipping tier pair"
            );
            return Ok(());
        };

        let writer = LineageWriter::new(&self.client);
        let outcome = match_by_name(&source.tables, &target.tables);

        for pair in &outcome.pairs {
            info!(
                source = %pair.source.name,
                target = %pair.target.name,
                "Matched tables, establishing lineage"
            );

            let link = writer
                .link_tables(pair.source, pair.target, target_connection_qn)
                .await?;
            if link.created {
                report.processes_created += 1;
            } else {
                report.processes_existing += 1;
            }

            let stats = writer
                .link_columns(
                    pair.source,
                    pair.target,
                    &link.process_guid,
                    target_connection_qn,
                )
                .await?;
            report.column_processes_created += stats.created;
            report.column_processes_existing += stats.existing;
            report.unmatched_columns += stats.unmatched;
        }

        for table in &outcome.unmatched_source {
            warn!(
                table = %table.name,
                target_tier = %target.connection_name,
                "No matching table in target tier"
            );
        }
        report.unmatched_tables += outcome.unmatched_source.len();

        Ok(())
    }
}
