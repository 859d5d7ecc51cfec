//! API key authentication for output integrations.

use reqwest_middleware::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

/// Authentication method for HTTP requests.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    /// Custom header with optional prefix (e.g., "api-key: xxx")
    ApiKeyHeader {
        header_name: String,
        prefix: Option<String>,
    },
    /// Standard Bearer token
    BearerToken,
}

/// Trait for authenticating outbound HTTP requests.
///
/// Implementations handle integration-specific patterns like:
/// - Resend, AWeber: `Authorization: Bearer xxx`
/// - Brevo: `api-key: xxx`
pub trait ProviderAuth: Send + Sync {
    /// Get the authentication method used by this integration.
    fn auth_method(&self) -> AuthMethod;

    /// Apply authentication to a request builder.
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder;
}

/// API key authentication implementation.
///
/// Supports custom header names and prefixes, or the standard bearer scheme.
///
/// # Examples
///
/// ```rust,ignore
/// // Brevo: api-key: xxx
/// let auth = ApiKeyAuth::header(SecretString::new(key), "api-key", "");
///
/// // Resend: Authorization: Bearer xxx
/// let auth = ApiKeyAuth::bearer(SecretString::new(key));
/// ```
pub struct ApiKeyAuth {
    api_key: SecretString,
    method: AuthMethod,
}

impl ApiKeyAuth {
    /// Authenticate with `Authorization: Bearer <key>`.
    pub fn bearer(api_key: SecretString) -> Self {
        Self {
            api_key,
            method: AuthMethod::BearerToken,
        }
    }

    /// Authenticate with a custom header and an optional value prefix.
    pub fn header(api_key: SecretString, header_name: &str, prefix: &str) -> Self {
        Self {
            api_key,
            method: AuthMethod::ApiKeyHeader {
                header_name: header_name.to_string(),
                prefix: Some(prefix.to_string()).filter(|p| !p.is_empty()),
            },
        }
    }

    /// Get a reference to the API key.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }
}

impl ProviderAuth for ApiKeyAuth {
    fn auth_method(&self) -> AuthMethod {
        self.method.clone()
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.method {
            AuthMethod::BearerToken => request.bearer_auth(self.api_key.expose_secret()),
            AuthMethod::ApiKeyHeader {
                header_name,
                prefix,
            } => {
                let auth_value = if let Some(prefix) = prefix {
                    format!("{} {}", prefix, self.api_key.expose_secret())
                } else {
                    self.api_key.expose_secret().to_string()
                };
                request.header(header_name.as_str(), auth_value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_auth_method() {
        let auth = ApiKeyAuth::bearer(SecretString::new("test_key".to_string()));
        assert_eq!(auth.auth_method(), AuthMethod::BearerToken);
        assert_eq!(auth.api_key().expose_secret(), "test_key");
    }

    #[test]
    fn test_header_auth_without_prefix() {
        let auth = ApiKeyAuth::header(SecretString::new("test_key".to_string()), "api-key", "");
        assert_eq!(
            auth.auth_method(),
            AuthMethod::ApiKeyHeader {
                header_name: "api-key".to_string(),
                prefix: None,
            }
        );
    }

    #[test]
    fn test_header_auth_with_prefix() {
        let auth = ApiKeyAuth::header(
            SecretString::new("test_key".to_string()),
            "Authorization",
            "Token",
        );
        assert_eq!(
            auth.auth_method(),
            AuthMethod::ApiKeyHeader {
                header_name: "Authorization".to_string(),
                prefix: Some("Token".to_string()),
            }
        );
    }
}
