//! Metabridge CLI
//!
//! Two batch jobs against the metadata catalog:
//! - `ingest`: CSV structural metadata from the object store into the catalog
//! - `lineage`: name-matched table/column lineage across the three tiers

use anyhow::Result;
use clap::{Parser, Subcommand};
use metabridge_catalog_client::{CatalogClient, ConnectionSpec, ConnectorType};
use metabridge_ingest::{CsvObjectStore, IngestConfig, IngestJob};
use metabridge_lineage::{LineageConfig, LineageDiscovery, LineageJob};
use std::time::Duration;

mod config;
mod logging;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "metabridge")]
#[command(version, about = "Catalog metadata ingestion and lineage stitching", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        env = "METABRIDGE_CONFIG",
        default_value = "metabridge.toml",
        global = true
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest CSV structural metadata from the object store into the catalog
    Ingest,

    /// Discover tables across tiers and write name-matched lineage edges
    Lineage {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let app_config = AppConfig::load(&cli.config)?;
    logging::init_logging(&app_config.logging.file, &app_config.logging.level)?;

    let result = match cli.command {
        Commands::Ingest => run_ingest(&app_config).await,
        Commands::Lineage { yes } => run_lineage(&app_config, yes).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Run failed");
    }
    result
}

fn build_client(config: &AppConfig) -> Result<CatalogClient> {
    let mut builder = CatalogClient::builder(&config.catalog.base_url)
        .timeout(Duration::from_secs(config.catalog.timeout));
    if let Some(ref token) = config.catalog.api_token {
        builder = builder.api_token(token);
    }
    Ok(CatalogClient::new(builder.build()?)?)
}

async fn run_ingest(config: &AppConfig) -> Result<()> {
    config.validate_for_ingest()?;

    let client = build_client(config)?;
    let store = CsvObjectStore::anonymous(
        &config.ingest.bucket,
        config.ingest.region.as_deref(),
    )?;

    let job = IngestJob::new(
        client,
        store,
        IngestConfig {
            connection: ConnectionSpec {
                name: config.connections.object_store.clone(),
                connector: ConnectorType::S3,
                admin_groups: config.ingest.admin_groups.clone(),
                admin_users: config.ingest.admin_users.clone(),
            },
            database: config.ingest.database.clone(),
            schema: config.ingest.schema.clone(),
            prefix: config.ingest.prefix.clone(),
            key_pattern: config.ingest.key_pattern.clone(),
            objects: config.ingest.objects.clone(),
        },
    )?;

    let report = job.run().await?;

    println!(
        "\nIngestion completed under '{}':",
        report.connection_qualified_name
    );
    println!("  tables processed:  {}", report.tables_processed);
    println!("  columns created:   {}", report.columns_created);
    println!("  data types set:    {}", report.columns_updated);
    if !report.skipped.is_empty() {
        println!("  skipped objects:   {}", report.skipped.len());
        for key in &report.skipped {
            println!("    - {}", key);
        }
    }

    Ok(())
}

async fn run_lineage(config: &AppConfig, yes: bool) -> Result<()> {
    let client = build_client(config)?;
    let job = LineageJob::new(
        client,
        LineageConfig {
            postgres_connection: config.connections.postgres.clone(),
            object_store_connection: config.connections.object_store.clone(),
            warehouse_connection: config.connections.warehouse.clone(),
        },
    );

    let discovery = job.discover().await?;
    print_discovery(&discovery);

    if !yes && !confirm("Proceed with lineage creation?") {
        println!("Aborting.");
        return Ok(());
    }

    let report = job.establish(&discovery).await?;

    println!("\nLineage establishment completed:");
    println!(
        "  table edges:   {} created, {} already present",
        report.processes_created, report.processes_existing
    );
    println!(
        "  column edges:  {} created, {} already present",
        report.column_processes_created, report.column_processes_existing
    );
    if report.unmatched_tables > 0 || report.unmatched_columns > 0 {
        println!(
            "  unmatched:     {} tables, {} columns",
            report.unmatched_tables, report.unmatched_columns
        );
    }

    Ok(())
}

fn print_discovery(discovery: &LineageDiscovery) {
    for tier in discovery.tiers() {
        match tier.connection_qualified_name {
            Some(_) => {
                println!(
                    "\nFound {} tables under connection '{}':",
                    tier.tables.len(),
                    tier.connection_name
                );
                for table in &tier.tables {
                    println!("  - {}", table.name);
                }
            }
            None => {
                println!("\nConnection '{}' not found.", tier.connection_name);
            }
        }
    }
}

/// Interactive confirmation prompt.
fn confirm(prompt: &str) -> bool {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .unwrap_or(false)
}
