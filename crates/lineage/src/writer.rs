//! Lineage-edge creation against the catalog.
//!
//! One Process per matched table pair, one ColumnProcess per matched column
//! pair, each looked up by its derived qualified name before creation so
//! re-invoking on an already-linked pair creates nothing new.

use crate::matcher::match_by_name;
use metabridge_catalog_client::{
    Asset, AssetResolver, CatalogClient, ClientError, ColumnProcess, Process, Result, Table,
};
use tracing::{debug, info, warn};

/// Result of linking one table pair.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
    /// GUID of the (created or pre-existing) Process
    pub process_guid: String,
    /// Whether this run created the Process
    pub created: bool,
}

/// Column-level linking counts for one table pair.
#[derive(Debug, Clone, Default)]
pub struct ColumnLinkStats {
    pub created: usize,
    pub existing: usize,
    pub unmatched: usize,
}

/// Writes Process and ColumnProcess edges.
pub struct LineageWriter<'a> {
    client: &'a CatalogClient,
}

impl<'a> LineageWriter<'a> {
    pub fn new(client: &'a CatalogClient) -> Self {
        Self { client }
    }

    /// Ensure a table-level lineage edge exists between two tables.
    ///
    /// The edge is attributed to `connection_qualified_name` (the target
    /// tier's connection).
    pub async fn link_tables(
        &self,
        source: &Table,
        target: &Table,
        connection_qualified_name: &str,
    ) -> Result<LinkOutcome> {
        let resolver = AssetResolver::new(self.client);
        let qualified_name =
            Process::qualified_name_for(connection_qualified_name, &source.name, &target.name);

        if let Some(existing) = resolver.find_process(&qualified_name).await? {
            info!(
                source = %source.name,
                target = %target.name,
                "Table lineage already exists"
            );
            let process_guid = existing.guid.ok_or_else(|| {
                ClientError::InvalidResponse(format!(
                    "Process '{}' has no GUID",
                    qualified_name
                ))
            })?;
            return Ok(LinkOutcome {
                process_guid,
                created: false,
            });
        }

        let process = Process::link(source, target, connection_qualified_name)?;
        let response = self.client.save_one(Asset::Process(process)).await?;
        let process_guid = response
            .first_created("Process")
            .and_then(|a| a.guid())
            .map(String::from)
            .ok_or_else(|| {
                ClientError::InvalidResponse(format!(
                    "Save response did not report a created Process for '{}'",
                    qualified_name
                ))
            })?;

        info!(
            source = %source.name,
            target = %target.name,
            process_guid = %process_guid,
            "Created table lineage"
        );
        Ok(LinkOutcome {
            process_guid,
            created: true,
        })
    }

    /// Ensure column-level lineage edges exist for a matched table pair.
    ///
    /// Enumerates both tables' columns, matches them by name, and creates one
    /// ColumnProcess per matched pair under the given parent Process.
    pub async fn link_columns(
        &self,
        source_table: &Table,
        target_table: &Table,
        process_guid: &str,
        connection_qualified_name: &str,
    ) -> Result<ColumnLinkStats> {
        let resolver = AssetResolver::new(self.client);
        let source_columns = resolver.list_columns(&source_table.qualified_name).await?;
        let target_columns = resolver.list_columns(&target_table.qualified_name).await?;

        let outcome = match_by_name(&source_columns, &target_columns);
        let mut stats = ColumnLinkStats {
            unmatched: outcome.unmatched_source.len(),
            ..Default::default()
        };

        for pair in &outcome.pairs {
            let qualified_name = ColumnProcess::qualified_name_for(
                connection_qualified_name,
                &pair.source.name,
                &pair.target.name,
            );

            if resolver.find_column_process(&qualified_name).await?.is_some() {
                debug!(
                    source = %pair.source.name,
                    target = %pair.target.name,
                    "Column lineage already exists"
                );
                stats.existing += 1;
                continue;
            }

            let edge = ColumnProcess::link(
                pair.source,
                pair.target,
                process_guid,
                connection_qualified_name,
            )?;
            self.client.save_one(Asset::ColumnProcess(edge)).await?;
            info!(
                source = %pair.source.name,
                target = %pair.target.name,
                "Created column lineage"
            );
            stats.created += 1;
        }

        for column in &outcome.unmatched_source {
            warn!(
                column = %column.name,
                table = %source_table.name,
                "No matching target column"
            );
        }

        Ok(stats)
    }
}
