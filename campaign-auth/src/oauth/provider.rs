//! OAuth provider trait and types.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{oauth_error, Error, OAuthErrorKind};

/// Closed set of identity providers a campaign can send visitors through.
///
/// The canonical names ("Google", "Discord") are case sensitive and are what campaign
/// tokens carry. URL path segments use the lowercase slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderName {
    Google,
    Discord,
}

impl ProviderName {
    pub const ALL: [ProviderName; 2] = [ProviderName::Google, ProviderName::Discord];

    /// Canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Google => "Google",
            ProviderName::Discord => "Discord",
        }
    }

    /// Lowercase identifier used in routes such as `/callback/google`.
    pub fn slug(&self) -> &'static str {
        match self {
            ProviderName::Google => "google",
            ProviderName::Discord => "discord",
        }
    }

    /// Resolve a route segment back into a provider.
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.slug() == slug)
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| oauth_error(OAuthErrorKind::UnknownProvider, "unknown provider name"))
    }
}

/// Identity of a visitor as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub display_name: String,
    pub email_address: String,
}

/// Client registration shared by every provider.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Fixed callback URI registered with the vendor.
    pub redirect_uri: String,
}

/// Trait for OAuth 2.0 identity providers.
///
/// Implementations differ only in endpoint URLs, scopes and the shape of the identity payload.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> ProviderName;

    /// Build the vendor consent URL carrying `state` as the anti-forgery value.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, Error>;

    /// Fetch the visitor's identity with an access token.
    async fn identity(&self, access_token: &str) -> Result<NormalizedResult, Error>;

    /// Complete the callback: exchange the code, then fetch the identity.
    async fn resolve(&self, code: &str) -> Result<NormalizedResult, Error> {
        let access_token = self.exchange_code(code).await?;
        self.identity(&access_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name_parses_canonical_only() {
        assert_eq!("Google".parse::<ProviderName>().unwrap(), ProviderName::Google);
        assert_eq!("Discord".parse::<ProviderName>().unwrap(), ProviderName::Discord);
        assert!("google".parse::<ProviderName>().is_err());
        assert!("Twitter".parse::<ProviderName>().is_err());
        assert!("".parse::<ProviderName>().is_err());
    }

    #[test]
    fn test_slug_roundtrip() {
        for provider in ProviderName::ALL {
            assert_eq!(ProviderName::from_slug(provider.slug()), Some(provider));
        }
        assert_eq!(ProviderName::from_slug("Google"), None);
    }
}
