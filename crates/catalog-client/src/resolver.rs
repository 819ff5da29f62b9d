//! Get-or-create resolution of catalog assets.
//!
//! Every create in both pipelines goes through this module: look the asset up
//! by its identifying key (name + parent qualified name), return it if the
//! catalog already has it, otherwise persist a new one. Exactly one create
//! call per missing asset, zero for existing ones. That lookup-before-create
//! contract is what makes a re-run after a partial failure safe.

use crate::assets::{
    Asset, Column, ColumnProcess, Connection, ConnectorType, Database, Process, Schema, Table,
};
use crate::client::CatalogClient;
use crate::error::{ClientError, Result};
use crate::types::SearchRequest;
use tracing::info;

/// Page size when enumerating tables under a connection.
const TABLE_PAGE_SIZE: usize = 1000;

/// Page size when enumerating columns under a table.
const COLUMN_PAGE_SIZE: usize = 100;

/// Identity and admin settings for a connection to ensure.
#[derive(Debug, Clone)]
pub struct ConnectionSpec {
    /// Connection display name
    pub name: String,
    /// Connector platform
    pub connector: ConnectorType,
    /// Admin groups stamped on a newly created connection
    pub admin_groups: Vec<String>,
    /// Admin users stamped on a newly created connection
    pub admin_users: Vec<String>,
}

/// Lookup-before-create access to catalog assets.
pub struct AssetResolver<'a> {
    client: &'a CatalogClient,
}

impl<'a> AssetResolver<'a> {
    pub fn new(client: &'a CatalogClient) -> Self {
        Self { client }
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Retrieve an existing connection by name, if present.
    ///
    /// Connection names are compared case-insensitively, and the match is
    /// re-verified client-side against the returned asset.
    pub async fn find_connection(&self, name: &str) -> Result<Option<Connection>> {
        let request = SearchRequest::assets("Connection")
            .filter_case_insensitive("name", name)
            .limit(1);
        let results = self.client.search(&request).await?;

        Ok(results
            .entities
            .into_iter()
            .filter_map(|a| match a {
                Asset::Connection(c) => Some(c),
                _ => None,
            })
            .find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    /// Return the connection with the given name, creating it if absent.
    pub async fn ensure_connection(&self, spec: &ConnectionSpec) -> Result<Connection> {
        if let Some(existing) = self.find_connection(&spec.name).await? {
            info!(
                name = %existing.name,
                qualified_name = %existing.qualified_name,
                "Found existing connection"
            );
            return Ok(existing);
        }

        let connection = Connection::new(
            &spec.name,
            spec.connector,
            spec.admin_groups.clone(),
            spec.admin_users.clone(),
        );
        let response = self.client.save_one(Asset::Connection(connection)).await?;
        let created = extract_created(&response.assets_created, Asset::as_connection, "Connection")?;
        info!(
            name = %created.name,
            qualified_name = %created.qualified_name,
            "Created connection"
        );
        Ok(created)
    }

    // =========================================================================
    // Databases / Schemas / Tables
    // =========================================================================

    /// Retrieve an existing database by name under a connection, if present.
    pub async fn find_database(
        &self,
        name: &str,
        connection_qualified_name: &str,
    ) -> Result<Option<Database>> {
        let request = SearchRequest::assets("Database")
            .filter_case_insensitive("name", name)
            .filter("connectionQualifiedName", connection_qualified_name)
            .limit(1);
        let results = self.client.search(&request).await?;

        Ok(results
            .entities
            .into_iter()
            .filter_map(|a| match a {
                Asset::Database(d) => Some(d),
                _ => None,
            })
            .find(|d| d.name.eq_ignore_ascii_case(name)))
    }

    /// Return the named database under a connection, creating it if absent.
    pub async fn ensure_database(
        &self,
        name: &str,
        connection_qualified_name: &str,
    ) -> Result<Database> {
        if let Some(existing) = self.find_database(name, connection_qualified_name).await? {
            info!(qualified_name = %existing.qualified_name, "Found existing database");
            return Ok(existing);
        }

        let database = Database::new(name, connection_qualified_name);
        let response = self.client.save_one(Asset::Database(database)).await?;
        let created = extract_created(&response.assets_created, Asset::as_database, "Database")?;
        info!(qualified_name = %created.qualified_name, "Created database");
        Ok(created)
    }

    /// Retrieve an existing schema by name under a database, if present.
    pub async fn find_schema(
        &self,
        name: &str,
        database_qualified_name: &str,
    ) -> Result<Option<Schema>> {
        let request = SearchRequest::assets("Schema")
            .filter_case_insensitive("name", name)
            .filter("databaseQualifiedName", database_qualified_name)
            .limit(1);
        let results = self.client.search(&request).await?;

        Ok(results
            .entities
            .into_iter()
            .filter_map(|a| match a {
                Asset::Schema(s) => Some(s),
                _ => None,
            })
            .find(|s| s.name.eq_ignore_ascii_case(name)))
    }

    /// Return the named schema under a database, creating it if absent.
    pub async fn ensure_schema(
        &self,
        name: &str,
        database_qualified_name: &str,
    ) -> Result<Schema> {
        if let Some(existing) = self.find_schema(name, database_qualified_name).await? {
            info!(qualified_name = %existing.qualified_name, "Found existing schema");
            return Ok(existing);
        }

        let schema = Schema::new(name, database_qualified_name);
        let response = self.client.save_one(Asset::Schema(schema)).await?;
        let created = extract_created(&response.assets_created, Asset::as_schema, "Schema")?;
        info!(qualified_name = %created.qualified_name, "Created schema");
        Ok(created)
    }

    /// Retrieve an existing table by name under a schema, if present.
    pub async fn find_table(
        &self,
        name: &str,
        schema_qualified_name: &str,
    ) -> Result<Option<Table>> {
        let request = SearchRequest::assets("Table")
            .filter_case_insensitive("name", name)
            .filter("schemaQualifiedName", schema_qualified_name)
            .limit(1);
        let results = self.client.search(&request).await?;

        Ok(results
            .entities
            .into_iter()
            .filter_map(|a| match a {
                Asset::Table(t) => Some(t),
                _ => None,
            })
            .find(|t| t.name.eq_ignore_ascii_case(name)))
    }

    /// Return the named table under a schema, creating it if absent.
    pub async fn ensure_table(&self, name: &str, schema_qualified_name: &str) -> Result<Table> {
        if let Some(existing) = self.find_table(name, schema_qualified_name).await? {
            info!(qualified_name = %existing.qualified_name, "Found existing table");
            return Ok(existing);
        }

        let table = Table::new(name, schema_qualified_name);
        let response = self.client.save_one(Asset::Table(table)).await?;
        let created = extract_created(&response.assets_created, Asset::as_table, "Table")?;
        info!(qualified_name = %created.qualified_name, "Created table");
        Ok(created)
    }

    // =========================================================================
    // Enumeration
    // =========================================================================

    /// List all tables under a connection.
    pub async fn list_tables(&self, connection_qualified_name: &str) -> Result<Vec<Table>> {
        let request = SearchRequest::assets("Table")
            .filter("connectionQualifiedName", connection_qualified_name)
            .limit(TABLE_PAGE_SIZE);
        let results = self.client.search(&request).await?;
        Ok(results
            .entities
            .into_iter()
            .filter_map(Asset::into_table)
            .collect())
    }

    /// List all columns of a table.
    pub async fn list_columns(&self, table_qualified_name: &str) -> Result<Vec<Column>> {
        let request = SearchRequest::assets("Column")
            .filter("tableQualifiedName", table_qualified_name)
            .limit(COLUMN_PAGE_SIZE);
        let results = self.client.search(&request).await?;
        Ok(results
            .entities
            .into_iter()
            .filter_map(Asset::into_column)
            .collect())
    }

    // =========================================================================
    // Lineage Edges
    // =========================================================================

    /// Retrieve a table-level lineage edge by its qualified name, if present.
    pub async fn find_process(&self, qualified_name: &str) -> Result<Option<Process>> {
        let request = SearchRequest::assets("Process")
            .filter("qualifiedName", qualified_name)
            .limit(1);
        let results = self.client.search(&request).await?;
        Ok(results
            .entities
            .into_iter()
            .find_map(|a| match a {
                Asset::Process(p) => Some(p),
                _ => None,
            }))
    }

    /// Retrieve a column-level lineage edge by its qualified name, if present.
    pub async fn find_column_process(&self, qualified_name: &str) -> Result<Option<ColumnProcess>> {
        let request = SearchRequest::assets("ColumnProcess")
            .filter("qualifiedName", qualified_name)
            .limit(1);
        let results = self.client.search(&request).await?;
        Ok(results
            .entities
            .into_iter()
            .find_map(|a| match a {
                Asset::ColumnProcess(p) => Some(p),
                _ => None,
            }))
    }
}

/// Pull the created asset of the expected type out of a save response.
fn extract_created<T: Clone>(
    created: &[Asset],
    downcast: impl Fn(&Asset) -> Option<&T>,
    type_name: &str,
) -> Result<T> {
    created
        .iter()
        .find_map(|a| downcast(a))
        .cloned()
        .ok_or_else(|| {
            ClientError::InvalidResponse(format!(
                "Save response did not report a created {}",
                type_name
            ))
        })
}
