//! Outbound HTTP client builder with middleware.

use std::time::Duration;

use reqwest_middleware::ClientBuilder as MiddlewareClientBuilder;
use reqwest_retry::RetryTransientMiddleware;

use super::BackoffPolicy;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout, applied to every outbound call.
    pub timeout: Duration,
    /// Maximum number of retries on transient failures.
    pub max_retries: u32,
    /// User agent string.
    pub user_agent: String,
    /// Total time retries may span. Unbounded when `None`.
    pub retry_budget: Option<Duration>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            user_agent: format!("campaign-relay/{}", env!("CARGO_PKG_VERSION")),
            retry_budget: None,
        }
    }
}

/// HTTP client with retry middleware, shared by OAuth vendors and output integrations.
pub type HttpClient = reqwest_middleware::ClientWithMiddleware;

/// Builder for outbound HTTP clients.
///
/// Provides a fluent API for constructing HTTP clients with:
/// - A request-level timeout so background work stays bounded
/// - Retry logic with exponential backoff
/// - A stable user agent
pub struct ClientBuilder {
    config: HttpClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Bound the total time spent retrying one request.
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.config.retry_budget = Some(budget);
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent)
            .build()?;

        let mut retry_policy = BackoffPolicy::new(self.config.max_retries);
        if let Some(budget) = self.config.retry_budget {
            retry_policy = retry_policy.with_budget(budget);
        }
        let client_with_middleware = MiddlewareClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(client_with_middleware)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let builder = ClientBuilder::new();
        assert_eq!(builder.config.timeout, Duration::from_secs(10));
        assert_eq!(builder.config.max_retries, 2);
    }

    #[test]
    fn test_builder_with_timeout() {
        let builder = ClientBuilder::new().with_timeout(Duration::from_secs(3));
        assert_eq!(builder.config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_builder_with_retry_budget() {
        let builder = ClientBuilder::new().with_retry_budget(Duration::from_secs(15));
        assert_eq!(builder.config.retry_budget, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_builder_with_max_retries() {
        let builder = ClientBuilder::new().with_max_retries(0);
        assert_eq!(builder.config.max_retries, 0);
    }

    #[tokio::test]
    async fn test_build_client() {
        let result = ClientBuilder::new().build();
        assert!(result.is_ok());
    }
}
