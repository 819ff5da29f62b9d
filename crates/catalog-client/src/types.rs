//! Request and response types for the catalog API.
//!
//! These types mirror the API's JSON structures and are used for
//! serialization of search/save requests and deserialization of responses.

use crate::assets::Asset;
use serde::{Deserialize, Serialize};

/// Default page size for searches.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// An attribute equality filter within a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    /// Attribute to compare (e.g. "name", "connectionQualifiedName")
    pub attribute: String,
    /// Value the attribute must equal
    pub value: String,
    /// Whether the comparison ignores case
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub case_insensitive: bool,
}

/// A search for active assets of one type, narrowed by attribute filters.
///
/// Built fluently, the way every lookup in the two pipelines uses it:
///
/// ```
/// use metabridge_catalog_client::SearchRequest;
///
/// let request = SearchRequest::assets("Table")
///     .filter("connectionQualifiedName", "default/s3/s3-landing")
///     .limit(1000);
/// assert_eq!(request.type_name, "Table");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Catalog type name to search for
    pub type_name: String,
    /// Attribute equality filters, all of which must match
    #[serde(default)]
    pub filters: Vec<AttributeFilter>,
    /// Maximum number of entities to return
    pub limit: usize,
}

impl SearchRequest {
    /// Start a search for active assets of the given type.
    pub fn assets(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            filters: Vec::new(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Add a case-sensitive attribute equality filter.
    pub fn filter(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(AttributeFilter {
            attribute: attribute.into(),
            value: value.into(),
            case_insensitive: false,
        });
        self
    }

    /// Add a case-insensitive attribute equality filter.
    pub fn filter_case_insensitive(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.filters.push(AttributeFilter {
            attribute: attribute.into(),
            value: value.into(),
            case_insensitive: true,
        });
        self
    }

    /// Set the maximum number of entities to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Search response: matching active assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Total number of matches
    pub total: usize,
    /// Matching assets (up to the requested limit)
    #[serde(default)]
    pub entities: Vec<Asset>,
}

impl SearchResults {
    /// The first returned asset, if any.
    pub fn into_first(self) -> Option<Asset> {
        self.entities.into_iter().next()
    }
}

/// Body of a save (create-or-update) request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Assets to persist
    pub entities: Vec<Asset>,
}

/// Result of a save: which assets were created and which were updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    #[serde(default)]
    pub assets_created: Vec<Asset>,
    #[serde(default)]
    pub assets_updated: Vec<Asset>,
}

impl MutationResponse {
    /// The first created asset of the given type name, if any.
    pub fn first_created(&self, type_name: &str) -> Option<&Asset> {
        self.assets_created
            .iter()
            .find(|a| a.type_name() == type_name)
    }

    /// Number of created assets of the given type name.
    pub fn created_count(&self, type_name: &str) -> usize {
        self.assets_created
            .iter()
            .filter(|a| a.type_name() == type_name)
            .count()
    }
}

/// Structured error body the API sends on failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable failure description
    pub error: String,
    /// Machine-readable code, when the server assigns one
    pub code: Option<String>,
    /// Server-side request id
    pub request_id: Option<String>,
    /// Free-form extra context
    pub details: Option<serde_json::Value>,
}

/// Body of the liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy", "degraded", or "unhealthy"
    pub status: String,
    /// Server build version
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Connection, ConnectorType};

    #[test]
    fn test_search_request_serialization() {
        let request = SearchRequest::assets("Connection")
            .filter_case_insensitive("name", "pg-prod")
            .limit(1);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["typeName"], "Connection");
        assert_eq!(json["limit"], 1);
        assert_eq!(json["filters"][0]["attribute"], "name");
        assert_eq!(json["filters"][0]["caseInsensitive"], true);
    }

    #[test]
    fn test_case_sensitive_filter_omits_flag() {
        let request = SearchRequest::assets("Table").filter("name", "orders");
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("caseInsensitive"));
    }

    #[test]
    fn test_search_results_deserialize() {
        let json = r#"{
            "total": 1,
            "entities": [
                {
                    "typeName": "Connection",
                    "guid": "abc-123",
                    "name": "pg-prod",
                    "qualifiedName": "default/postgres/pg-prod",
                    "connectorName": "postgres"
                }
            ]
        }"#;

        let results: SearchResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.total, 1);
        let asset = results.into_first().unwrap();
        let conn = asset.as_connection().unwrap();
        assert_eq!(conn.guid.as_deref(), Some("abc-123"));
        assert_eq!(conn.connector_name, ConnectorType::Postgres);
    }

    #[test]
    fn test_mutation_response_helpers() {
        let response = MutationResponse {
            assets_created: vec![Asset::Connection(Connection::new(
                "pg-prod",
                ConnectorType::Postgres,
                vec![],
                vec![],
            ))],
            assets_updated: vec![],
        };

        assert!(response.first_created("Connection").is_some());
        assert!(response.first_created("Table").is_none());
        assert_eq!(response.created_count("Connection"), 1);
    }

    #[test]
    fn test_mutation_response_defaults() {
        let response: MutationResponse = serde_json::from_str("{}").unwrap();
        assert!(response.assets_created.is_empty());
        assert!(response.assets_updated.is_empty());
    }

    #[test]
    fn test_api_error_deserialize() {
        let json = r#"{
            "error": "Asset not found",
            "code": "NOT_FOUND",
            "request_id": "req-12345"
        }"#;

        let error: ApiError = serde_json::from_str(json).unwrap();
        assert_eq!(error.error, "Asset not found");
        assert_eq!(error.code, Some("NOT_FOUND".to_string()));
        assert_eq!(error.request_id, Some("req-12345".to_string()));
    }
}
