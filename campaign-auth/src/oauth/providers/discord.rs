//! Discord OAuth provider implementation.

use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};

use crate::error::{oauth_error, Error, ErrorKind, OAuthErrorKind};
use crate::http::HttpClient;
use crate::oauth::{NormalizedResult, OAuthClientConfig, ProviderName};

const SCOPES: &str = "email identify";

/// Discord endpoint URLs, overridable for tests.
#[derive(Debug, Clone)]
pub struct DiscordUrls {
    pub auth_url: String,
    pub token_url: String,
    pub identity_url: String,
}

impl Default for DiscordUrls {
    fn default() -> Self {
        Self {
            auth_url: "https://discord.com/oauth2/authorize".to_string(),
            token_url: "https://discord.com/api/oauth2/token".to_string(),
            identity_url: "https://discord.com/api/v10/users/@me".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    // Absent when the email scope was not granted.
    #[serde(default)]
    email: Option<String>,
}

impl DiscordUser {
    fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.username.trim())
    }
}

/// Discord OAuth provider.
pub struct Provider {
    config: OAuthClientConfig,
    urls: DiscordUrls,
    http_client: HttpClient,
}

impl Provider {
    pub fn new(config: OAuthClientConfig, urls: DiscordUrls, http_client: HttpClient) -> Self {
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
        ProviderName::Discord
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&scope={}&state={}&redirect_uri={}&prompt=consent",
            self.urls.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
            urlencoding::encode(&self.config.redirect_uri),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, Error> {
        let request = TokenExchangeRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            grant_type: "authorization_code",
            code,
            redirect_uri: &self.config.redirect_uri,
        };

        debug!("Exchanging Discord OAuth code for an access token");

        let response = self
            .http_client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach Discord token endpoint: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::OAuth(OAuthErrorKind::Network),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Discord token exchange rejected with status {status}");
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!("Discord token endpoint returned {status}"),
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
            .get(&self.urls.identity_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::OAuth(OAuthErrorKind::Network),
            })?;

        if !response.status().is_success() {
            return Err(oauth_error(
                OAuthErrorKind::InvalidResponse,
                &format!("Discord identity returned {}", response.status()),
            ));
        }

        let user: DiscordUser = response.json().await.map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
        })?;

        let email_address = user.email.clone().ok_or_else(|| {
            oauth_error(
                OAuthErrorKind::InvalidResponse,
                "Discord identity has no email address",
            )
        })?;

        Ok(NormalizedResult {
            display_name: user.display_name().to_string(),
            email_address,
        })
    }
}
