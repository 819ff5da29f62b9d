//! The ingestion pipeline: object store listing to catalog assets.
//!
//! One linear pass: ensure the connection, database, and schema exist, then
//! for every CSV object infer its columns and materialize a table with them.
//! Columns are created in two phases the way the catalog expects them: a
//! batch create without data types, then a per-column patch of the inferred
//! type. All creates go through the resolver's lookup-before-create, so a
//! second run (or a re-run after a failure) produces no duplicate assets.

use crate::error::{IngestError, Result};
use crate::infer::{infer_columns, InferredColumn};
use crate::store::CsvObjectStore;
use metabridge_catalog_client::{
    Asset, AssetResolver, CatalogClient, ClientError, Column, ConnectionSpec,
};
use regex::Regex;
use std::collections::HashSet;
use tracing::{info, warn};

/// Configuration for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Connection to ingest under (created if absent)
    pub connection: ConnectionSpec,
    /// Database name under the connection
    pub database: String,
    /// Schema name under the database
    pub schema: String,
    /// Key prefix to list under
    pub prefix: String,
    /// Regex a key must match to be ingested
    pub key_pattern: String,
    /// Explicit object keys; when non-empty, listing is bypassed
    pub objects: Vec<String>,
}

impl IngestConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.connection.name.is_empty() {
            return Err(IngestError::Config(
                "connection name cannot be empty".to_string(),
            ));
        }
        if self.database.is_empty() {
            return Err(IngestError::Config(
                "database name cannot be empty".to_string(),
            ));
        }
        if self.schema.is_empty() {
            return Err(IngestError::Config(
                "schema name cannot be empty".to_string(),
            ));
        }
        if self.objects.is_empty() {
            // The pattern is only consulted when listing
            Regex::new(&self.key_pattern)?;
        }
        Ok(())
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Qualified name of the connection ingested under
    pub connection_qualified_name: String,
    /// Tables processed (found or created)
    pub tables_processed: usize,
    /// Columns newly created
    pub columns_created: usize,
    /// Column data types patched
    pub columns_updated: usize,
    /// Object keys skipped for having no valid columns
    pub skipped: Vec<String>,
}

struct ObjectOutcome {
    columns_created: usize,
    columns_updated: usize,
}

/// The ingestion job.
pub struct IngestJob {
    client: CatalogClient,
    store: CsvObjectStore,
    config: IngestConfig,
}

impl IngestJob {
    /// Create a new job, validating the configuration.
    pub fn new(client: CatalogClient, store: CsvObjectStore, config: IngestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            store,
            config,
        })
    }

    /// Run the pipeline to completion.
    ///
    /// A failure for any asset is fatal for the run; whatever was already
    /// created stays in place and a re-run picks it up by lookup.
    pub async fn run(&self) -> Result<IngestReport> {
        let resolver = AssetResolver::new(&self.client);

        let connection = resolver.ensure_connection(&self.config.connection).await?;
        let database = resolver
            .ensure_database(&self.config.database, &connection.qualified_name)
            .await?;
        let schema = resolver
            .ensure_schema(&self.config.schema, &database.qualified_name)
            .await?;

        let keys = if !self.config.objects.is_empty() {
            self.config.objects.clone()
        } else {
            let pattern = Regex::new(&self.config.key_pattern)?;
            self.store.list_keys(&self.config.prefix, &pattern).await?
        };

        let mut report = IngestReport {
            connection_qualified_name: connection.qualified_name.clone(),
            ..Default::default()
        };

        if keys.is_empty() {
            warn!(bucket = %self.store.bucket(), "No CSV objects to ingest");
            return Ok(report);
        }

        for key in &keys {
            match self
                .ingest_object(&resolver, key, &schema.qualified_name)
                .await?
            {
                Some(outcome) => {
                    report.tables_processed += 1;
                    report.columns_created += outcome.columns_created;
                    report.columns_updated += outcome.columns_updated;
                }
                None => report.skipped.push(key.clone()),
            }
        }

        info!(
            tables = report.tables_processed,
            columns_created = report.columns_created,
            columns_updated = report.columns_updated,
            skipped = report.skipped.len(),
            "Ingestion completed"
        );
        Ok(report)
    }

    /// Ingest one CSV object: infer columns, ensure the table, materialize
    /// the columns. Returns `None` when the object holds no valid columns.
    async fn ingest_object(
        &self,
        resolver: &AssetResolver<'_>,
        key: &str,
        schema_qualified_name: &str,
    ) -> Result<Option<ObjectOutcome>> {
        info!(key = %key, "Processing CSV object");

        let data = self.store.fetch(key).await?;
        let columns = infer_columns(&data, None)?;
        if columns.is_empty() {
            warn!(key = %key, "No valid columns found, skipping");
            return Ok(None);
        }

        let table_name = table_name_for_key(key);
        let table = resolver
            .ensure_table(&table_name, schema_qualified_name)
            .await?;

        // Phase 1: batch-create the columns the table doesn't have yet,
        // without data types.
        let existing = resolver.list_columns(&table.qualified_name).await?;
        let existing_names: HashSet<String> =
            existing.iter().map(|c| c.name.to_lowercase()).collect();

        let to_create: Vec<Asset> = columns
            .iter()
            .filter(|c| !existing_names.contains(&c.name.to_lowercase()))
            .map(|c| Asset::Column(Column::new(&c.name, &table.qualified_name, c.order)))
            .collect();

        let mut columns_created = 0;
        if !to_create.is_empty() {
            let response = self.client.save(to_create).await?;
            columns_created = response.created_count("Column");
            info!(
                table = %table.name,
                created = columns_created,
                "Created columns"
            );
        }

        // Phase 2: fetch each column back and patch its inferred data type.
        let columns_updated = self.patch_data_types(&table.qualified_name, &columns).await?;

        Ok(Some(ObjectOutcome {
            columns_created,
            columns_updated,
        }))
    }

    async fn patch_data_types(
        &self,
        table_qualified_name: &str,
        columns: &[InferredColumn],
    ) -> Result<usize> {
        let mut updated = 0;
        for col in columns {
            let column_qn = format!("{}/{}", table_qualified_name, col.name);
            let asset = self
                .client
                .get_by_qualified_name("Column", &column_qn)
                .await?;
            let mut column = asset.into_column().ok_or_else(|| {
                ClientError::InvalidResponse(format!(
                    "Expected a Column at '{}', got a different asset type",
                    column_qn
                ))
            })?;

            column.data_type = Some(col.data_type.clone());
            self.client.save_one(Asset::Column(column)).await?;
            updated += 1;
            info!(
                column = %col.name,
                data_type = %col.data_type,
                "Updated column data type"
            );
        }
        Ok(updated)
    }
}

/// Derive the table name from an object key: path separators become
/// underscores and a trailing `.csv` is stripped.
pub fn table_name_for_key(key: &str) -> String {
    let flattened = key.replace('/', "_");
    flattened
        .strip_suffix(".csv")
        .unwrap_or(&flattened)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use metabridge_catalog_client::ConnectorType;

    fn test_config() -> IngestConfig {
        IngestConfig {
            connection: ConnectionSpec {
                name: "s3-landing".to_string(),
                connector: ConnectorType::S3,
                admin_groups: vec![],
                admin_users: vec![],
            },
            database: "landing".to_string(),
            schema: "raw".to_string(),
            prefix: "landing".to_string(),
            key_pattern: r"\.csv$".to_string(),
            objects: vec![],
        }
    }

    #[test]
    fn test_table_name_for_key() {
        assert_eq!(table_name_for_key("landing/orders.csv"), "landing_orders");
        assert_eq!(table_name_for_key("orders.csv"), "orders");
        assert_eq!(
            table_name_for_key("a/b/customers.csv"),
            "a_b_customers"
        );
        // Non-CSV suffixes are left alone
        assert_eq!(table_name_for_key("orders.tsv"), "orders.tsv");
    }

    #[test]
    fn test_config_validation() {
        assert!(test_config().validate().is_ok());

        let mut config = test_config();
        config.database.clear();
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.key_pattern = "[".to_string();
        assert!(config.validate().is_err());

        // A broken pattern is fine when explicit objects bypass listing
        let mut config = test_config();
        config.key_pattern = "[".to_string();
        config.objects = vec!["landing/orders.csv".to_string()];
        assert!(config.validate().is_ok());
    }
}
