//! Registry of the identity providers this deployment has credentials for.

use std::collections::HashMap;
use std::sync::Arc;

use campaign_auth::http::HttpClient;
use campaign_auth::oauth::providers::{discord, google};
use campaign_auth::oauth::{OAuthClientConfig, Provider, ProviderName};
use log::*;
use service::config::Config;

use crate::error::{campaign_error, CampaignErrorKind, Error};
use crate::state_carrier::CarriedState;

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderName, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every provider whose client id and secret are configured.
    pub fn from_config(config: &Config, http_client: HttpClient) -> Self {
        let mut registry = Self::new();

        match config.google_credentials() {
            Some((client_id, client_secret)) => registry.register(Arc::new(google::Provider::new(
                OAuthClientConfig {
                    client_id,
                    client_secret,
                    redirect_uri: config.callback_url(ProviderName::Google.slug()),
                },
                google::GoogleUrls {
                    auth_url: config.google_auth_url.clone(),
                    token_url: config.google_token_url.clone(),
                    userinfo_url: config.google_userinfo_url.clone(),
                },
                http_client.clone(),
            ))),
            None => warn!("Google credentials not configured, Google campaigns are disabled"),
        }

        match config.discord_credentials() {
            Some((client_id, client_secret)) => {
                registry.register(Arc::new(discord::Provider::new(
                    OAuthClientConfig {
                        client_id,
                        client_secret,
                        redirect_uri: config.callback_url(ProviderName::Discord.slug()),
                    },
                    discord::DiscordUrls {
                        auth_url: config.discord_auth_url.clone(),
                        token_url: config.discord_token_url.clone(),
                        identity_url: config.discord_identity_url.clone(),
                    },
                    http_client,
                )))
            }
            None => warn!("Discord credentials not configured, Discord campaigns are disabled"),
        }

        registry
    }

    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        info!("Registered identity provider {}", provider.name());
        self.providers.insert(provider.name(), provider);
    }

    pub fn get(&self, name: ProviderName) -> Option<Arc<dyn Provider>> {
        self.providers.get(&name).cloned()
    }

    pub fn contains(&self, name: ProviderName) -> bool {
        self.providers.contains_key(&name)
    }

    /// Vendor consent URL for this attempt, with the attempt's nonce as the OAuth `state`.
    ///
    /// A provider without credentials is treated like an unknown one.
    pub fn redirect_url(&self, carried: &CarriedState) -> Result<String, Error> {
        let provider = self.get(carried.state.provider_name).ok_or_else(|| {
            warn!(
                "Campaign uses unregistered provider {}",
                carried.state.provider_name
            );
            campaign_error(CampaignErrorKind::InvalidToken)
        })?;
        Ok(provider.authorization_url(&carried.nonce))
    }
}
