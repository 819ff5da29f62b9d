//! Catalog asset model.
//!
//! These types mirror the catalog's entity JSON and carry the qualified-name
//! derivation rules. Every asset is uniquely identified within the catalog by
//! its qualified name, which is derived from its ancestors' qualified names:
//!
//! ```text
//! Connection   default/{connector}/{name}
//! Database     {connection_qn}/{name}
//! Schema       {database_qn}/{name}
//! Table        {schema_qn}/{name}
//! Column       {table_qn}/{name}
//! ```
//!
//! Lineage edges (`Process`, `ColumnProcess`) hang off a connection and are
//! keyed by the names of the assets they link, so looking one up before
//! creating it is enough to keep re-runs from duplicating edges.

use serde::{Deserialize, Serialize};

/// Connector platforms participating in ingestion and lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorType {
    /// PostgreSQL source tier
    Postgres,
    /// Object-store tier
    S3,
    /// Warehouse target tier
    Snowflake,
}

impl ConnectorType {
    /// Returns the string representation used in qualified names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::Postgres => "postgres",
            ConnectorType::S3 => "s3",
            ConnectorType::Snowflake => "snowflake",
        }
    }
}

impl std::fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConnectorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(ConnectorType::Postgres),
            "s3" => Ok(ConnectorType::S3),
            "snowflake" => Ok(ConnectorType::Snowflake),
            _ => Err(format!("Unknown connector type: {}", s)),
        }
    }
}

/// A typed reference to another asset by GUID, as used in lineage edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    /// Catalog type name of the referenced asset
    pub type_name: String,
    /// GUID of the referenced asset
    pub guid: String,
}

impl AssetRef {
    /// Reference a table by GUID.
    pub fn table(guid: impl Into<String>) -> Self {
        Self {
            type_name: "Table".to_string(),
            guid: guid.into(),
        }
    }

    /// Reference a column by GUID.
    pub fn column(guid: impl Into<String>) -> Self {
        Self {
            type_name: "Column".to_string(),
            guid: guid.into(),
        }
    }

    /// Reference a process by GUID.
    pub fn process(guid: impl Into<String>) -> Self {
        Self {
            type_name: "Process".to_string(),
            guid: guid.into(),
        }
    }
}

/// A named integration endpoint for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Server-assigned GUID (absent on assets not yet persisted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    /// Display name, unique per connector
    pub name: String,
    /// Unique qualified name
    pub qualified_name: String,
    /// Connector platform
    pub connector_name: ConnectorType,
    /// Groups granted admin rights on a newly created connection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admin_groups: Vec<String>,
    /// Users granted admin rights on a newly created connection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admin_users: Vec<String>,
}

impl Connection {
    /// Build a new connection asset for creation.
    pub fn new(
        name: impl Into<String>,
        connector: ConnectorType,
        admin_groups: Vec<String>,
        admin_users: Vec<String>,
    ) -> Self {
        let name = name.into();
        Self {
            guid: None,
            qualified_name: Self::qualified_name_for(connector, &name),
            name,
            connector_name: connector,
            admin_groups,
            admin_users,
        }
    }

    /// Derive the qualified name for a connection.
    pub fn qualified_name_for(connector: ConnectorType, name: &str) -> String {
        format!("default/{}/{}", connector.as_str(), name)
    }
}

/// A database container under a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub name: String,
    pub qualified_name: String,
    /// Qualified name of the parent connection
    pub connection_qualified_name: String,
}

impl Database {
    /// Build a new database asset under the given connection.
    pub fn new(name: impl Into<String>, connection_qualified_name: impl Into<String>) -> Self {
        let name = name.into();
        let connection_qualified_name = connection_qualified_name.into();
        Self {
            guid: None,
            qualified_name: child_qualified_name(&connection_qualified_name, &name),
            name,
            connection_qualified_name,
        }
    }
}

/// A schema container under a database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub name: String,
    pub qualified_name: String,
    /// Qualified name of the parent database
    pub database_qualified_name: String,
    /// Qualified name of the owning connection
    pub connection_qualified_name: String,
}

impl Schema {
    /// Build a new schema asset under the given database.
    pub fn new(name: impl Into<String>, database_qualified_name: impl Into<String>) -> Self {
        let name = name.into();
        let database_qualified_name = database_qualified_name.into();
        Self {
            guid: None,
            qualified_name: child_qualified_name(&database_qualified_name, &name),
            connection_qualified_name: connection_qualified_name_of(&database_qualified_name),
            name,
            database_qualified_name,
        }
    }
}

/// A table, belonging to a schema (ingested tables) or enumerated directly
/// under a connection (lineage matching).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub name: String,
    pub qualified_name: String,
    /// Qualified name of the parent schema, if the table sits under one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_qualified_name: Option<String>,
    /// Qualified name of the owning connection
    pub connection_qualified_name: String,
}

impl Table {
    /// Build a new table asset under the given schema.
    pub fn new(name: impl Into<String>, schema_qualified_name: impl Into<String>) -> Self {
        let name = name.into();
        let schema_qualified_name = schema_qualified_name.into();
        Self {
            guid: None,
            qualified_name: child_qualified_name(&schema_qualified_name, &name),
            connection_qualified_name: connection_qualified_name_of(&schema_qualified_name),
            name,
            schema_qualified_name: Some(schema_qualified_name),
        }
    }
}

/// A column belonging to exactly one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub name: String,
    pub qualified_name: String,
    /// Qualified name of the parent table
    pub table_qualified_name: String,
    /// Inferred data type in the catalog's vocabulary, patched after creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// 1-based position within the table
    pub order: i32,
}

impl Column {
    /// Build a new column asset under the given table, without a data type.
    ///
    /// The data type is patched in a second pass once the column exists.
    pub fn new(
        name: impl Into<String>,
        table_qualified_name: impl Into<String>,
        order: i32,
    ) -> Self {
        let name = name.into();
        let table_qualified_name = table_qualified_name.into();
        Self {
            guid: None,
            qualified_name: child_qualified_name(&table_qualified_name, &name),
            name,
            table_qualified_name,
            data_type: None,
            order,
        }
    }
}

/// A table-level lineage edge: data in the output tables derives from the
/// input tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub name: String,
    pub qualified_name: String,
    /// Connection this edge is attributed to
    pub connection_qualified_name: String,
    /// Source table references
    pub inputs: Vec<AssetRef>,
    /// Target table references
    pub outputs: Vec<AssetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Process {
    /// Build a table-level lineage edge between two persisted tables.
    ///
    /// Both tables must carry a GUID (i.e. come from the catalog, not from a
    /// local constructor).
    pub fn link(
        source: &Table,
        target: &Table,
        connection_qualified_name: impl Into<String>,
    ) -> crate::error::Result<Self> {
        let source_guid = require_guid(&source.guid, "Table", &source.name)?;
        let target_guid = require_guid(&target.guid, "Table", &target.name)?;
        let connection_qualified_name = connection_qualified_name.into();
        Ok(Self {
            guid: None,
            name: edge_name(&source.name, &target.name),
            qualified_name: Self::qualified_name_for(
                &connection_qualified_name,
                &source.name,
                &target.name,
            ),
            connection_qualified_name,
            inputs: vec![AssetRef::table(source_guid)],
            outputs: vec![AssetRef::table(target_guid)],
            description: Some(format!("Lineage from {} to {}", source.name, target.name)),
        })
    }

    /// Derive the qualified name for a table-level lineage edge.
    pub fn qualified_name_for(connection_qn: &str, source: &str, target: &str) -> String {
        format!("{}/process_{}_{}", connection_qn, source, target)
    }
}

/// A column-level lineage edge, parented to a table-level [`Process`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProcess {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub name: String,
    pub qualified_name: String,
    /// Connection this edge is attributed to
    pub connection_qualified_name: String,
    /// Source column references
    pub inputs: Vec<AssetRef>,
    /// Target column references
    pub outputs: Vec<AssetRef>,
    /// The table-level process this column edge belongs to
    pub process: AssetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnProcess {
    /// Build a column-level lineage edge between two persisted columns.
    pub fn link(
        source: &Column,
        target: &Column,
        parent_process_guid: impl Into<String>,
        connection_qualified_name: impl Into<String>,
    ) -> crate::error::Result<Self> {
        let source_guid = require_guid(&source.guid, "Column", &source.name)?;
        let target_guid = require_guid(&target.guid, "Column", &target.name)?;
        let connection_qualified_name = connection_qualified_name.into();
        Ok(Self {
            guid: None,
            name: edge_name(&source.name, &target.name),
            qualified_name: Self::qualified_name_for(
                &connection_qualified_name,
                &source.name,
                &target.name,
            ),
            connection_qualified_name,
            inputs: vec![AssetRef::column(source_guid)],
            outputs: vec![AssetRef::column(target_guid)],
            process: AssetRef::process(parent_process_guid),
            description: Some(format!("Lineage from {} to {}", source.name, target.name)),
        })
    }

    /// Derive the qualified name for a column-level lineage edge.
    pub fn qualified_name_for(connection_qn: &str, source: &str, target: &str) -> String {
        format!("{}/column_process_{}_{}", connection_qn, source, target)
    }
}

/// Any catalog asset, discriminated by the `typeName` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "typeName")]
pub enum Asset {
    Connection(Connection),
    Database(Database),
    Schema(Schema),
    Table(Table),
    Column(Column),
    Process(Process),
    ColumnProcess(ColumnProcess),
}

impl Asset {
    /// The asset's display name.
    pub fn name(&self) -> &str {
        match self {
            Asset::Connection(a) => &a.name,
            Asset::Database(a) => &a.name,
            Asset::Schema(a) => &a.name,
            Asset::Table(a) => &a.name,
            Asset::Column(a) => &a.name,
            Asset::Process(a) => &a.name,
            Asset::ColumnProcess(a) => &a.name,
        }
    }

    /// The asset's unique qualified name.
    pub fn qualified_name(&self) -> &str {
        match self {
            Asset::Connection(a) => &a.qualified_name,
            Asset::Database(a) => &a.qualified_name,
            Asset::Schema(a) => &a.qualified_name,
            Asset::Table(a) => &a.qualified_name,
            Asset::Column(a) => &a.qualified_name,
            Asset::Process(a) => &a.qualified_name,
            Asset::ColumnProcess(a) => &a.qualified_name,
        }
    }

    /// The catalog type name, as it appears on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            Asset::Connection(_) => "Connection",
            Asset::Database(_) => "Database",
            Asset::Schema(_) => "Schema",
            Asset::Table(_) => "Table",
            Asset::Column(_) => "Column",
            Asset::Process(_) => "Process",
            Asset::ColumnProcess(_) => "ColumnProcess",
        }
    }

    /// Server-assigned GUID, if the asset has been persisted.
    pub fn guid(&self) -> Option<&str> {
        match self {
            Asset::Connection(a) => a.guid.as_deref(),
            Asset::Database(a) => a.guid.as_deref(),
            Asset::Schema(a) => a.guid.as_deref(),
            Asset::Table(a) => a.guid.as_deref(),
            Asset::Column(a) => a.guid.as_deref(),
            Asset::Process(a) => a.guid.as_deref(),
            Asset::ColumnProcess(a) => a.guid.as_deref(),
        }
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            Asset::Connection(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_database(&self) -> Option<&Database> {
        match self {
            Asset::Database(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Asset::Schema(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Asset::Table(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Asset::Column(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_process(&self) -> Option<&Process> {
        match self {
            Asset::Process(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_column_process(&self) -> Option<&ColumnProcess> {
        match self {
            Asset::ColumnProcess(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            Asset::Table(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_column(self) -> Option<Column> {
        match self {
            Asset::Column(a) => Some(a),
            _ => None,
        }
    }
}

/// Join a parent qualified name and a child name.
fn child_qualified_name(parent_qn: &str, name: &str) -> String {
    format!("{}/{}", parent_qn, name)
}

/// Extract the connection qualified name (first three segments) from any
/// descendant's qualified name.
pub fn connection_qualified_name_of(qualified_name: &str) -> String {
    qualified_name
        .split('/')
        .take(3)
        .collect::<Vec<_>>()
        .join("/")
}

fn edge_name(source: &str, target: &str) -> String {
    format!("{} -> {}", source, target)
}

fn require_guid(
    guid: &Option<String>,
    type_name: &str,
    name: &str,
) -> crate::error::Result<String> {
    guid.clone().ok_or_else(|| {
        crate::error::ClientError::Validation(format!(
            "{} '{}' has no GUID; only persisted assets can be linked",
            type_name, name
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted_table(name: &str, guid: &str) -> Table {
        let mut table = Table::new(name, "default/postgres/pg-prod/appdb/public");
        table.guid = Some(guid.to_string());
        table
    }

    #[test]
    fn test_connection_qualified_name() {
        let conn = Connection::new("pg-prod", ConnectorType::Postgres, vec![], vec![]);
        assert_eq!(conn.qualified_name, "default/postgres/pg-prod");
        assert!(conn.guid.is_none());
    }

    #[test]
    fn test_hierarchy_qualified_names() {
        let db = Database::new("appdb", "default/postgres/pg-prod");
        assert_eq!(db.qualified_name, "default/postgres/pg-prod/appdb");

        let schema = Schema::new("public", &db.qualified_name);
        assert_eq!(schema.qualified_name, "default/postgres/pg-prod/appdb/public");
        assert_eq!(schema.connection_qualified_name, "default/postgres/pg-prod");

        let table = Table::new("orders", &schema.qualified_name);
        assert_eq!(
            table.qualified_name,
            "default/postgres/pg-prod/appdb/public/orders"
        );
        assert_eq!(table.connection_qualified_name, "default/postgres/pg-prod");

        let column = Column::new("order_id", &table.qualified_name, 1);
        assert_eq!(
            column.qualified_name,
            "default/postgres/pg-prod/appdb/public/orders/order_id"
        );
        assert_eq!(column.order, 1);
        assert!(column.data_type.is_none());
    }

    #[test]
    fn test_process_link() {
        let source = persisted_table("orders", "guid-src");
        let target = persisted_table("orders", "guid-tgt");

        let process = Process::link(&source, &target, "default/s3/s3-landing").unwrap();
        assert_eq!(process.name, "orders -> orders");
        assert_eq!(
            process.qualified_name,
            "default/s3/s3-landing/process_orders_orders"
        );
        assert_eq!(process.inputs, vec![AssetRef::table("guid-src")]);
        assert_eq!(process.outputs, vec![AssetRef::table("guid-tgt")]);
    }

    #[test]
    fn test_process_link_requires_guid() {
        let source = Table::new("orders", "default/postgres/pg-prod/appdb/public");
        let target = persisted_table("orders", "guid-tgt");

        let err = Process::link(&source, &target, "default/s3/s3-landing").unwrap_err();
        assert!(err.to_string().contains("no GUID"));
    }

    #[test]
    fn test_column_process_qualified_name() {
        let qn = ColumnProcess::qualified_name_for("default/s3/s3-landing", "id", "id");
        assert_eq!(qn, "default/s3/s3-landing/column_process_id_id");
    }

    #[test]
    fn test_asset_roundtrip_through_type_tag() {
        let table = persisted_table("orders", "guid-1");
        let asset = Asset::Table(table.clone());

        let json = serde_json::to_string(&asset).unwrap();
        assert!(json.contains(r#""typeName":"Table""#));
        assert!(json.contains(r#""qualifiedName":"default/postgres/pg-prod/appdb/public/orders""#));

        let parsed: Asset = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_table(), Some(&table));
        assert_eq!(parsed.type_name(), "Table");
    }

    #[test]
    fn test_connection_qualified_name_of() {
        assert_eq!(
            connection_qualified_name_of("default/postgres/pg-prod/appdb/public/orders"),
            "default/postgres/pg-prod"
        );
        assert_eq!(
            connection_qualified_name_of("default/s3/s3-landing"),
            "default/s3/s3-landing"
        );
    }

    #[test]
    fn test_connector_type_from_str() {
        assert_eq!("postgres".parse::<ConnectorType>().unwrap(), ConnectorType::Postgres);
        assert_eq!("S3".parse::<ConnectorType>().unwrap(), ConnectorType::S3);
        assert!("oracle".parse::<ConnectorType>().is_err());
    }
}
