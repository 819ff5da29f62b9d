//! Integration tests for the ingestion pipeline using wiremock and an
//! in-memory object store.
//!
//! The key property under test: re-running ingestion produces no duplicate
//! assets, because every create is preceded by a qualified-name lookup.

use metabridge_catalog_client::{CatalogClient, ClientConfig, ConnectionSpec, ConnectorType};
use metabridge_ingest::{CsvObjectStore, IngestConfig, IngestJob};
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORDERS_CSV: &[u8] = b"order_id,customer_name\n1,Alice\n2,Bob\n";

// ============================================================================
// Test Helpers
// ============================================================================

fn test_client(server: &MockServer) -> CatalogClient {
    let config = ClientConfig::builder(server.uri())
        .timeout(Duration::from_secs(5))
        .max_retries(0)
        .build()
        .unwrap();
    CatalogClient::new(config).unwrap()
}

async fn seeded_store() -> CsvObjectStore {
    let memory = InMemory::new();
    memory
        .put(
            &ObjectPath::from("landing/orders.csv"),
            PutPayload::from_static(ORDERS_CSV),
        )
        .await
        .unwrap();
    CsvObjectStore::with_store(Arc::new(memory), "test-bucket")
}

fn test_config() -> IngestConfig {
    IngestConfig {
        connection: ConnectionSpec {
            name: "s3-landing".to_string(),
            connector: ConnectorType::S3,
            admin_groups: vec!["data-platform".to_string()],
            admin_users: vec![],
        },
        database: "landing".to_string(),
        schema: "raw".to_string(),
        prefix: "landing".to_string(),
        key_pattern: r"\.csv$".to_string(),
        objects: vec![],
    }
}

fn connection_json() -> serde_json::Value {
    serde_json::json!({
        "typeName": "Connection",
        "guid": "c-1",
        "name": "s3-landing",
        "qualifiedName": "default/s3/s3-landing",
        "connectorName": "s3"
    })
}

fn database_json() -> serde_json::Value {
    serde_json::json!({
        "typeName": "Database",
        "guid": "d-1",
        "name": "landing",
        "qualifiedName": "default/s3/s3-landing/landing",
        "connectionQualifiedName": "default/s3/s3-landing"
    })
}

fn schema_json() -> serde_json::Value {
    serde_json::json!({
        "typeName": "Schema",
        "guid": "s-1",
        "name": "raw",
        "qualifiedName": "default/s3/s3-landing/landing/raw",
        "databaseQualifiedName": "default/s3/s3-landing/landing",
        "connectionQualifiedName": "default/s3/s3-landing"
    })
}

fn table_json() -> serde_json::Value {
    serde_json::json!({
        "typeName": "Table",
        "guid": "t-1",
        "name": "landing_orders",
        "qualifiedName": "default/s3/s3-landing/landing/raw/landing_orders",
        "schemaQualifiedName": "default/s3/s3-landing/landing/raw",
        "connectionQualifiedName": "default/s3/s3-landing"
    })
}

fn column_json(name: &str, guid: &str, order: i32) -> serde_json::Value {
    serde_json::json!({
        "typeName": "Column",
        "guid": guid,
        "name": name,
        "qualifiedName": format!("default/s3/s3-landing/landing/raw/landing_orders/{}", name),
        "tableQualifiedName": "default/s3/s3-landing/landing/raw/landing_orders",
        "order": order
    })
}

/// Mock a search for one asset type.
async fn mock_search(server: &MockServer, type_name: &str, entities: Vec<serde_json::Value>) {
    let total = entities.len();
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(serde_json::json!({"typeName": type_name})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total": total,
            "entities": entities
        })))
        .mount(server)
        .await;
}

// ============================================================================
// First Run: everything is created
// ============================================================================

#[tokio::test]
async fn test_first_run_creates_all_assets() {
    let server = MockServer::start().await;

    // Nothing exists yet
    mock_search(&server, "Connection", vec![]).await;
    mock_search(&server, "Database", vec![]).await;
    mock_search(&server, "Schema", vec![]).await;
    mock_search(&server, "Table", vec![]).await;
    mock_search(&server, "Column", vec![]).await;

    // Data-type patches: mounted first so they win over the generic save mocks
    Mock::given(method("POST"))
        .and(path("/assets"))
        .and(body_string_contains("dataType"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "assetsUpdated": [column_json("order_id", "col-1", 1)]
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/assets"))
        .and(body_partial_json(
            serde_json::json!({"entities": [{"typeName": "Connection"}]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "assetsCreated": [connection_json()]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/assets"))
        .and(body_partial_json(
            serde_json::json!({"entities": [{"typeName": "Database"}]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "assetsCreated": [database_json()]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/assets"))
        .and(body_partial_json(
            serde_json::json!({"entities": [{"typeName": "Schema"}]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "assetsCreated": [schema_json()]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/assets"))
        .and(body_partial_json(
            serde_json::json!({"entities": [{"typeName": "Table"}]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "assetsCreated": [table_json()]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Batch column create (no data types yet)
    Mock::given(method("POST"))
        .and(path("/assets"))
        .and(body_partial_json(
            serde_json::json!({"entities": [{"typeName": "Column"}]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "assetsCreated": [
                column_json("order_id", "col-1", 1),
                column_json("customer_name", "col-2", 2)
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Column fetch-back for the data-type patch
    Mock::given(method("GET"))
        .and(query_param("type", "Column"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(column_json("order_id", "col-1", 1)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let job = IngestJob::new(test_client(&server), seeded_store().await, test_config()).unwrap();
    let report = job.run().await.unwrap();

    assert_eq!(report.connection_qualified_name, "default/s3/s3-landing");
    assert_eq!(report.tables_processed, 1);
    assert_eq!(report.columns_created, 2);
    assert_eq!(report.columns_updated, 2);
    assert!(report.skipped.is_empty());
}

// ============================================================================
// Second Run: nothing is created again
// ============================================================================

#[tokio::test]
async fn test_rerun_creates_no_duplicate_assets() {
    let server = MockServer::start().await;

    // Everything already exists in the catalog
    mock_search(&server, "Connection", vec![connection_json()]).await;
    mock_search(&server, "Database", vec![database_json()]).await;
    mock_search(&server, "Schema", vec![schema_json()]).await;
    mock_search(&server, "Table", vec![table_json()]).await;
    mock_search(
        &server,
        "Column",
        vec![
            column_json("order_id", "col-1", 1),
            column_json("customer_name", "col-2", 2),
        ],
    )
    .await;

    // Data-type patches still run (each run re-infers and overwrites)
    Mock::given(method("POST"))
        .and(path("/assets"))
        .and(body_string_contains("dataType"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "assetsUpdated": [column_json("order_id", "col-1", 1)]
        })))
        .expect(2)
        .mount(&server)
        .await;

    // No create-style save may happen on a re-run
    Mock::given(method("POST"))
        .and(path("/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("type", "Column"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(column_json("order_id", "col-1", 1)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let job = IngestJob::new(test_client(&server), seeded_store().await, test_config()).unwrap();
    let report = job.run().await.unwrap();

    assert_eq!(report.tables_processed, 1);
    assert_eq!(report.columns_created, 0);
    assert_eq!(report.columns_updated, 2);
}

// ============================================================================
// Explicit object list bypasses listing
// ============================================================================

#[tokio::test]
async fn test_explicit_objects_bypass_listing() {
    let server = MockServer::start().await;

    mock_search(&server, "Connection", vec![connection_json()]).await;
    mock_search(&server, "Database", vec![database_json()]).await;
    mock_search(&server, "Schema", vec![schema_json()]).await;
    mock_search(&server, "Table", vec![table_json()]).await;
    mock_search(
        &server,
        "Column",
        vec![
            column_json("order_id", "col-1", 1),
            column_json("customer_name", "col-2", 2),
        ],
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/assets"))
        .and(body_string_contains("dataType"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("type", "Column"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(column_json("order_id", "col-1", 1)),
        )
        .mount(&server)
        .await;

    // The store only holds landing/orders.csv; the explicit list names it
    // directly, so listing (and the broken pattern) is never consulted.
    let mut config = test_config();
    config.key_pattern = "[".to_string();
    config.objects = vec!["landing/orders.csv".to_string()];

    let job = IngestJob::new(test_client(&server), seeded_store().await, config).unwrap();
    let report = job.run().await.unwrap();

    assert_eq!(report.tables_processed, 1);
}
