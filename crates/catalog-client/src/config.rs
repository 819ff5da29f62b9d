//! Client configuration.
//!
//! A [`ClientConfig`] is assembled through its builder and checked by
//! [`ClientConfig::validate`] before any HTTP client is built from it, so a
//! bad base URL or inverted retry bounds fail fast instead of on the first
//! request.

use crate::error::{ClientError, Result};
use std::fmt;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

/// Settings for a [`CatalogClient`](crate::CatalogClient).
///
/// The `Debug` implementation masks the API token, so a config struct can be
/// logged without leaking the credential.
#[derive(Clone)]
pub struct ClientConfig {
    /// Catalog API base URL, scheme included
    pub base_url: String,
    /// Bearer token sent on every request; `None` for unauthenticated use
    pub api_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry attempts for transient failures
    pub max_retries: u32,
    /// First backoff delay
    pub retry_initial_delay: Duration,
    /// Backoff ceiling
    pub retry_max_delay: Duration,
    /// Verify TLS certificates; disable only against test servers
    pub tls_verify: bool,
    /// User-Agent header value
    pub user_agent: String,
}

impl ClientConfig {
    /// Timeouts below this are rejected by [`validate`](Self::validate).
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

    /// Start building a configuration for the given base URL.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::Config("base_url is empty".to_string()));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("base_url does not parse: {}", e)))?;

        if self.timeout < Self::MIN_TIMEOUT {
            return Err(ClientError::Config(format!(
                "timeout {:?} is below the minimum of {:?}",
                self.timeout,
                Self::MIN_TIMEOUT
            )));
        }

        if self.retry_initial_delay > self.retry_max_delay {
            return Err(ClientError::Config(format!(
                "retry_initial_delay {:?} exceeds retry_max_delay {:?}",
                self.retry_initial_delay, self.retry_max_delay
            )));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_initial_delay: DEFAULT_RETRY_INITIAL_DELAY,
            retry_max_delay: DEFAULT_RETRY_MAX_DELAY,
            tls_verify: true,
            user_agent: format!("metabridge-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "***REDACTED***"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_initial_delay", &self.retry_initial_delay)
            .field("retry_max_delay", &self.retry_max_delay)
            .field("tls_verify", &self.tls_verify)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                base_url: base_url.into(),
                ..ClientConfig::default()
            },
        }
    }

    /// Bearer token for the `Authorization` header.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(token.into());
        self
    }

    /// Per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Retry attempts for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// First backoff delay.
    pub fn retry_initial_delay(mut self, delay: Duration) -> Self {
        self.config.retry_initial_delay = delay;
        self
    }

    /// Backoff ceiling.
    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.config.retry_max_delay = delay;
        self
    }

    /// Toggle TLS certificate verification.
    pub fn tls_verify(mut self, verify: bool) -> Self {
        self.config.tls_verify = verify;
        self
    }

    /// Override the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Validate and return the finished configuration.
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
