//! CLI configuration management.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the catalog API token.
pub const API_TOKEN_ENV: &str = "METABRIDGE_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Catalog API endpoint and credentials
    pub catalog: CatalogSection,

    /// Connection names per platform tier
    pub connections: ConnectionsSection,

    /// Ingestion source settings
    #[serde(default)]
    pub ingest: IngestSection,

    /// Log destination and level
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    /// Base URL of the catalog API
    pub base_url: String,

    /// API token (overridable via METABRIDGE_API_TOKEN)
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionsSection {
    /// Postgres tier connection name
    pub postgres: String,

    /// Object-store tier connection name
    pub object_store: String,

    /// Warehouse tier connection name
    pub warehouse: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestSection {
    /// Source bucket name
    #[serde(default)]
    pub bucket: String,

    /// Bucket region
    pub region: Option<String>,

    /// Key prefix to list under
    #[serde(default)]
    pub prefix: String,

    /// Regex a key must match to be ingested
    #[serde(default = "default_key_pattern")]
    pub key_pattern: String,

    /// Explicit object keys; bypasses listing when non-empty
    #[serde(default)]
    pub objects: Vec<String>,

    /// Database name to ingest under
    #[serde(default = "default_database")]
    pub database: String,

    /// Schema name to ingest under
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Admin groups for a newly created connection
    #[serde(default)]
    pub admin_groups: Vec<String>,

    /// Admin users for a newly created connection
    #[serde(default)]
    pub admin_users: Vec<String>,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: None,
            prefix: String::new(),
            key_pattern: default_key_pattern(),
            objects: Vec::new(),
            database: default_database(),
            schema: default_schema(),
            admin_groups: Vec::new(),
            admin_users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log file path (appended to)
    #[serde(default = "default_log_file")]
    pub file: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_key_pattern() -> String {
    r"\.csv$".to_string()
}

fn default_database() -> String {
    "landing".to_string()
}

fn default_schema() -> String {
    "raw".to_string()
}

fn default_log_file() -> String {
    "metabridge.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.is_empty() {
                config.catalog.api_token = Some(token);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment overrides).
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.catalog.base_url.is_empty() {
            bail!("catalog.base_url must be set");
        }
        if self.catalog.api_token.as_deref().unwrap_or("").is_empty() {
            bail!(
                "catalog.api_token must be set (in the config file or via {})",
                API_TOKEN_ENV
            );
        }
        if self.connections.postgres.is_empty()
            || self.connections.object_store.is_empty()
            || self.connections.warehouse.is_empty()
        {
            bail!("all three connection names must be set under [connections]");
        }
        Ok(())
    }

    /// Validate the settings the ingest command additionally needs.
    pub fn validate_for_ingest(&self) -> Result<()> {
        if self.ingest.bucket.is_empty() {
            bail!("ingest.bucket must be set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
        [catalog]
        base_url = "https://catalog.example.com"
        api_token = "mb_token"

        [connections]
        postgres = "pg-prod"
        object_store = "s3-landing"
        warehouse = "wh-prod"

        [ingest]
        bucket = "landing-bucket"
        prefix = "landing"
        admin_groups = ["data-platform"]

        [logging]
        file = "/var/log/metabridge.log"
        level = "debug"
    "#;

    #[test]
    fn test_full_config_parses() {
        let config = AppConfig::from_toml(FULL_CONFIG).unwrap();

        assert_eq!(config.catalog.base_url, "https://catalog.example.com");
        assert_eq!(config.catalog.timeout, 30);
        assert_eq!(config.connections.object_store, "s3-landing");
        assert_eq!(config.ingest.bucket, "landing-bucket");
        assert_eq!(config.ingest.key_pattern, r"\.csv$");
        assert_eq!(config.ingest.database, "landing");
        assert_eq!(config.ingest.schema, "raw");
        assert_eq!(config.ingest.admin_groups, vec!["data-platform"]);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate_for_ingest().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [catalog]
            base_url = "https://catalog.example.com"
            api_token = "mb_token"

            [connections]
            postgres = "pg"
            object_store = "s3"
            warehouse = "wh"
        "#,
        )
        .unwrap();

        assert_eq!(config.ingest.key_pattern, r"\.csv$");
        assert_eq!(config.logging.file, "metabridge.log");
        assert_eq!(config.logging.level, "info");
        // No bucket configured, so the ingest command must refuse to run
        assert!(config.validate_for_ingest().is_err());
    }

    #[test]
    fn test_missing_api_token_is_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [catalog]
            base_url = "https://catalog.example.com"

            [connections]
            postgres = "pg"
            object_store = "s3"
            warehouse = "wh"
        "#,
        );

        let err = result.unwrap_err().to_string();
        assert!(err.contains("api_token"));
    }

    #[test]
    fn test_missing_connection_name_is_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [catalog]
            base_url = "https://catalog.example.com"
            api_token = "mb_token"

            [connections]
            postgres = "pg"
            object_store = ""
            warehouse = "wh"
        "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metabridge.toml");
        std::fs::write(&path, FULL_CONFIG).unwrap();

        let config = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.connections.postgres, "pg-prod");
    }

    #[test]
    fn test_load_missing_file_fails_with_context() {
        let err = AppConfig::load("/nonexistent/metabridge.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
