//! Google OAuth provider implementation.

use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};

use crate::error::{oauth_error, Error, ErrorKind, OAuthErrorKind};
use crate::http::HttpClient;
use crate::oauth::{NormalizedResult, OAuthClientConfig, ProviderName};

const SCOPES: &str = "email profile";

/// Google endpoint URLs, overridable for tests.
#[derive(Debug, Clone)]
pub struct GoogleUrls {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleUrls {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Google OAuth provider.
pub struct Provider {
    config: OAuthClientConfig,
    urls: GoogleUrls,
    http_client: HttpClient,
}

impl Provider {
    /// Create a new Google OAuth provider.
    pub fn new(config: OAuthClientConfig, urls: GoogleUrls, http_client: HttpClient) -> Self {
        Self {
            config,
            urls,
            http_client,
        }
    }
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn name(&self) -> ProviderName {
        ProviderName::Google
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.urls.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, Error> {
        let request = TokenExchangeRequest {
            code,
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            redirect_uri: &self.config.redirect_uri,
            grant_type: "authorization_code",
        };

        debug!("Exchanging Google OAuth code for an access token");

        let response = self
            .http_client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach Google token endpoint: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::OAuth(OAuthErrorKind::Network),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Google token exchange rejected with status {status}");
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!("Google token endpoint returned {status}"),
            ));
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
        })?;

        Ok(tokens.access_token)
    }

    async fn identity(&self, access_token: &str) -> Result<NormalizedResult, Error> {
        let response = self
            .http_client
            .get(&self.urls.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach Google userinfo endpoint: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::OAuth(OAuthErrorKind::Network),
                }
            })?;

        if !response.status().is_success() {
            return Err(oauth_error(
                OAuthErrorKind::InvalidResponse,
                &format!("Google userinfo returned {}", response.status()),
            ));
        }

        let info: GoogleUserInfo = response.json().await.map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
        })?;

        Ok(NormalizedResult {
            display_name: info.name.unwrap_or_default().trim().to_string(),
            email_address: info.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientBuilder;
    use crate::oauth::Provider as _;

    fn provider(base: &str) -> Provider {
        Provider::new(
            OAuthClientConfig {
                client_id: "client-123".to_string(),
                client_secret: "shh".to_string(),
                redirect_uri: "https://relay.example/callback/google".to_string(),
            },
            GoogleUrls {
                auth_url: format!("{base}/auth"),
                token_url: format!("{base}/token"),
                userinfo_url: format!("{base}/userinfo"),
            },
            ClientBuilder::new().with_max_retries(0).build().unwrap(),
        )
    }

    #[test]
    fn test_authorization_url_carries_state_and_scopes() {
        let url = provider("https://accounts.example").authorization_url("nonce-1");
        assert!(url.starts_with("https://accounts.example/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Frelay.example%2Fcallback%2Fgoogle"));
        assert!(url.contains("scope=email%20profile"));
        assert!(url.contains("state=nonce-1"));
        assert!(url.contains("response_type=code"));
    }

    #[tokio::test]
    async fn test_resolve_exchanges_code_and_fetches_identity() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("code".into(), "auth-code".into()),
                mockito::Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at-1","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;
        let userinfo_mock = server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"1","email":"ada@example.com","name":" Ada Lovelace "}"#)
            .create_async()
            .await;

        let result = provider(&server.url()).resolve("auth-code").await.unwrap();

        assert_eq!(
            result,
            NormalizedResult {
                display_name: "Ada Lovelace".to_string(),
                email_address: "ada@example.com".to_string(),
            }
        );
        token_mock.assert_async().await;
        userinfo_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_code_is_token_exchange_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let err = provider(&server.url()).exchange_code("bad").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed)
        );
    }
}
