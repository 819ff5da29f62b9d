//! HTTP access to the catalog API.
//!
//! One thin client over `reqwest`, wrapped in retry middleware with
//! exponential backoff. Transient failures (5xx, 429, connect/timeout) retry
//! inside the middleware; every other non-success status maps onto a
//! [`ClientError`] variant and surfaces to the caller unchanged. This is the
//! only retry layer in the system.

use crate::assets::Asset;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{
    ApiError, HealthResponse, MutationResponse, SaveRequest, SearchRequest, SearchResults,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    policies::ExponentialBackoff, RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use std::sync::Arc;
use std::time::Duration;

/// Arc-wrapped client for shared ownership.
pub type SharedClient = Arc<CatalogClient>;

/// Client for the catalog's search, save, and fetch endpoints.
pub struct CatalogClient {
    http: ClientWithMiddleware,
    config: ClientConfig,
}

impl CatalogClient {
    /// Shorthand for [`ClientConfig::builder`].
    pub fn builder(base_url: impl Into<String>) -> crate::config::ClientConfigBuilder {
        crate::config::ClientConfigBuilder::new(base_url)
    }

    /// Build a client from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("metabridge-client")),
        );
        if let Some(token) = config.api_token.as_deref() {
            let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ClientError::Config("API token is not header-safe".to_string()))?;
            headers.insert(AUTHORIZATION, bearer);
        }

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.tls_verify)
            .build()?;

        let backoff = ExponentialBackoff::builder()
            .retry_bounds(config.retry_initial_delay, config.retry_max_delay)
            .build_with_max_retries(config.max_retries);

        let http = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                backoff,
                TransientOnly,
            ))
            .build();

        Ok(Self { http, config })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Probe the API's health endpoint.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health").await
    }

    /// Search for active assets.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        self.post("/search", request).await
    }

    /// Save (create or update) a batch of assets in one call.
    pub async fn save(&self, assets: Vec<Asset>) -> Result<MutationResponse> {
        self.post("/assets", &SaveRequest { entities: assets }).await
    }

    /// Save a single asset.
    pub async fn save_one(&self, asset: Asset) -> Result<MutationResponse> {
        self.save(vec![asset]).await
    }

    /// Fetch one asset by its qualified name.
    pub async fn get_by_qualified_name(
        &self,
        type_name: &str,
        qualified_name: &str,
    ) -> Result<Asset> {
        let path = format!(
            "/assets/{}?type={}",
            urlencoding::encode(qualified_name),
            urlencoding::encode(type_name)
        );
        self.get(&path).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.dispatch(Method::GET, path, None).await
    }

    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.dispatch(Method::POST, path, Some(serde_json::to_vec(body)?))
            .await
    }

    /// Send one request and decode the JSON response.
    async fn dispatch<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<T> {
        let url = format!("{}{}", self.config.base_url, path);
        let started = std::time::Instant::now();

        let mut request = self.http.request(method.clone(), &url);
        if let Some(bytes) = body {
            request = request.body(bytes);
        }

        let response = request.send().await?;
        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        tracing::debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            request_id = ?request_id,
            "catalog request"
        );

        if !status.is_success() {
            return Err(read_failure(response, method, path, request_id).await);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::InvalidResponse(format!(
                "{} (body: {})",
                e,
                String::from_utf8_lossy(&bytes)
            ))
        })
    }
}

/// Turn a non-success response into the matching [`ClientError`].
///
/// Prefers the structured [`ApiError`] body when the server sent one; falls
/// back to the raw body, then to the status line.
async fn read_failure(
    response: reqwest::Response,
    method: Method,
    path: &str,
    header_request_id: Option<String>,
) -> ClientError {
    let status = response.status();
    let retry_after = parse_retry_after(response.headers());

    let body = response.bytes().await.ok();
    let api_error: Option<ApiError> = body.as_ref().and_then(|b| serde_json::from_slice(b).ok());

    let message = match (&api_error, &body) {
        (Some(e), _) => e.error.clone(),
        (None, Some(b)) => String::from_utf8_lossy(b).to_string(),
        (None, None) => status.to_string(),
    };
    let request_id = api_error
        .and_then(|e| e.request_id)
        .or(header_request_id);

    tracing::warn!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        request_id = ?request_id,
        error = %message,
        "catalog request failed"
    );

    status_to_error(status, message, request_id, retry_after)
}

/// Map an HTTP status onto the error taxonomy.
fn status_to_error(
    status: StatusCode,
    message: String,
    request_id: Option<String>,
    retry_after: Option<Duration>,
) -> ClientError {
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited {
            retry_after,
            request_id,
        },
        other => ClientError::ServerError {
            status: other.as_u16(),
            message,
            request_id,
        },
    }
}

/// Parse a `Retry-After` header in either RFC 7231 form: delta-seconds or an
/// HTTP-date. Dates already in the past collapse to zero.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get("retry-after")?.to_str().ok()?;

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = httpdate::parse_http_date(value).ok()?;
    Some(
        date.duration_since(std::time::SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}

/// Retry classification for the middleware: transient network faults, 5xx,
/// and 429 retry; everything else fails immediately.
///
/// A retried save converges on the same catalog state as the original
/// request, because saves are upserts keyed by qualified name.
struct TransientOnly;

impl RetryableStrategy for TransientOnly {
    fn handle(&self, result: &reqwest_middleware::Result<reqwest::Response>) -> Option<Retryable> {
        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    Some(Retryable::Transient)
                } else if status.is_success() {
                    None
                } else {
                    Some(Retryable::Fatal)
                }
            }
            Err(reqwest_middleware::Error::Reqwest(e)) if e.is_timeout() || e.is_connect() => {
                Some(Retryable::Transient)
            }
            Err(_) => Some(Retryable::Fatal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_from_valid_config() {
        let config = ClientConfig::builder("http://localhost:3000")
            .api_token("mb_token")
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        assert!(CatalogClient::new(config).is_ok());
    }

    #[test]
    fn retry_after_delta_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("42"));

        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_http_date_in_the_past_is_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );

        assert_eq!(parse_retry_after(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn retry_after_garbage_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("soonish"));

        assert_eq!(parse_retry_after(&headers), None);
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn status_mapping_covers_the_taxonomy() {
        assert!(matches!(
            status_to_error(StatusCode::NOT_FOUND, "gone".to_string(), None, None),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            status_to_error(StatusCode::CONFLICT, "race".to_string(), None, None),
            ClientError::Conflict(_)
        ));

        let err = status_to_error(
            StatusCode::BAD_GATEWAY,
            "upstream".to_string(),
            Some("req-7".to_string()),
            None,
        );
        assert!(err.is_retryable());
        assert_eq!(err.request_id(), Some("req-7"));
    }
}
