//! One campaign attempt end to end: link issuance, entry, and the provider callback.
//!
//! Entry and callback never fail towards the visitor. Whatever goes wrong before the state is
//! accepted ends in a redirect to the catch-all URL. Once it is accepted the visitor is sent to
//! the campaign's redirect URL immediately, and the code exchange, the subscriber record and
//! the output fan-out continue in the background.

use std::sync::Arc;
use std::time::Duration;

use campaign_auth::crypto::{constant_time_eq, random_token};
use campaign_auth::http::ClientBuilder;
use campaign_auth::oauth::{Provider, ProviderName};
use log::*;
use serde::Deserialize;
use service::config::Config;

use crate::campaign::CampaignState;
use crate::codec::Codec;
use crate::dispatcher::Dispatcher;
use crate::error::{campaign_error, invalid, CampaignErrorKind, Error};
use crate::output::{OutputFactory, OutputSettings};
use crate::provider::ProviderRegistry;
use crate::state_carrier::{CarriedState, SealedCookie, StateCarrier};
use crate::store::CampaignStore;
use crate::Id;

/// Where to send the visitor, and the cookies to set on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    pub cookies: Vec<SealedCookie>,
}

/// Query string a provider appends when sending the visitor back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set instead of `code` when the visitor declined consent.
    pub error: Option<String>,
}

pub struct CampaignRelay {
    codec: Codec,
    carrier: StateCarrier,
    providers: ProviderRegistry,
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn CampaignStore>,
    catch_all: String,
    campaign_base_url: String,
    operator_api_key: Option<String>,
}

impl CampaignRelay {
    /// Wires every campaign component from configuration. Fails on a bad secret.
    pub fn from_config(config: &Config, store: Arc<dyn CampaignStore>) -> Result<Self, Error> {
        let http_client = ClientBuilder::new()
            .with_timeout(Duration::from_secs(config.outbound_timeout_secs))
            .with_max_retries(config.outbound_max_retries)
            .with_retry_budget(Duration::from_secs(config.output_timeout_secs))
            .build()?;

        let codec = Codec::new(config.crypto_secret().as_bytes())?;
        let carrier = StateCarrier::new(
            config.cookie_secret().as_bytes(),
            Duration::from_secs(config.cookie_max_age_secs),
        )?;
        let providers = ProviderRegistry::from_config(config, http_client.clone());
        let factory = OutputFactory::new(OutputSettings::from_config(config), http_client);
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            factory,
            config.dispatch_concurrency,
            Duration::from_secs(config.output_timeout_secs),
        ));

        Ok(Self {
            codec,
            carrier,
            providers,
            dispatcher,
            store,
            catch_all: config.catch_all_redirect_url().to_string(),
            campaign_base_url: config.campaign_base_url(),
            operator_api_key: config.operator_api_key().map(str::to_string),
        })
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn catch_all_url(&self) -> &str {
        &self.catch_all
    }

    /// True when `presented` is the configured operator key. Without a key nobody is authorized.
    pub fn authorizes_operator(&self, presented: &str) -> bool {
        self.operator_api_key
            .as_deref()
            .is_some_and(|key| constant_time_eq(key, presented))
    }

    /// Builds the shareable link for `state`.
    ///
    /// The provider must be configured and the list must exist. Outputs are not checked here;
    /// missing ones are skipped at delivery time.
    pub async fn issue_link(&self, state: &CampaignState) -> Result<String, Error> {
        if !self.providers.contains(state.provider_name) {
            return Err(invalid(&format!(
                "provider {} is not configured",
                state.provider_name
            )));
        }
        if !state.redirect_url.is_empty() {
            url::Url::parse(&state.redirect_url)
                .map_err(|_| invalid("redirectUrl is not an absolute URL"))?;
        }

        let list_id =
            Id::parse_str(&state.list_id).map_err(|_| invalid("listId is not a valid id"))?;
        let list = self.store.list_by_id(list_id).await?;

        let token = self.codec.encode(state)?;
        info!(
            "Issued {} campaign link for list {}",
            state.provider_name, list.id
        );
        Ok(format!(
            "{}?c={}",
            self.campaign_base_url,
            urlencoding::encode(&token)
        ))
    }

    /// Entry through a campaign link.
    pub fn begin_from_token(&self, token: &str) -> Redirect {
        match self.codec.decode(token) {
            Ok(state) => self.begin(state),
            Err(_) => {
                info!("Campaign entry with an invalid token");
                self.to_catch_all(Vec::new())
            }
        }
    }

    /// Entry with the campaign spelled out in the URL instead of a token.
    pub fn begin_direct(
        &self,
        provider_slug: &str,
        list_id: &str,
        output_ids: Vec<String>,
        redirect_url: Option<String>,
    ) -> Redirect {
        let Some(provider_name) = ProviderName::from_slug(provider_slug) else {
            info!("Direct campaign entry for unknown provider {provider_slug}");
            return self.to_catch_all(Vec::new());
        };
        // Nothing vetted this URL, so anything that is not absolute is dropped.
        let redirect_url = redirect_url
            .filter(|url| url::Url::parse(url).is_ok())
            .unwrap_or_default();
        self.begin(CampaignState::new(
            list_id,
            provider_name,
            output_ids,
            redirect_url,
        ))
    }

    fn begin(&self, state: CampaignState) -> Redirect {
        let carried = CarriedState::new(state, random_token());

        let sealed = self
            .providers
            .redirect_url(&carried)
            .and_then(|location| Ok((location, self.carrier.seal(&carried)?)));

        match sealed {
            Ok((location, cookies)) => {
                debug!(
                    "Sending visitor to {} for list {}",
                    carried.state.provider_name, carried.state.list_id
                );
                Redirect { location, cookies }
            }
            Err(e) => {
                warn!("Could not start campaign attempt: {e:?}");
                self.to_catch_all(Vec::new())
            }
        }
    }

    /// Handles the provider sending the visitor back to `/callback/{provider_slug}`.
    ///
    /// `cookie` returns the raw value of a request cookie by name. The returned redirect always
    /// clears the state cookies.
    pub fn complete<F>(&self, provider_slug: &str, params: CallbackParams, cookie: F) -> Redirect
    where
        F: Fn(&str) -> Option<String>,
    {
        let cleared = self.carrier.cleared();

        let carried = match self.carrier.open(cookie) {
            Ok(carried) => carried,
            Err(e) => {
                info!("Callback without usable campaign state: {e:?}");
                return self.to_catch_all(cleared);
            }
        };

        if ProviderName::from_slug(provider_slug) != Some(carried.state.provider_name) {
            info!(
                "Callback on {provider_slug} for a {} campaign",
                carried.state.provider_name
            );
            return self.to_catch_all(cleared);
        }

        let redirect = Redirect {
            location: carried.state.redirect_or(&self.catch_all).to_string(),
            cookies: cleared,
        };

        // Checked before the code is ever sent to the provider.
        let state_matches = params
            .state
            .as_deref()
            .is_some_and(|state| constant_time_eq(state, &carried.nonce));
        if !state_matches {
            warn!(
                "{:?} on {provider_slug} callback, dropping attempt",
                CampaignErrorKind::ForgeryStateMismatch
            );
            return redirect;
        }

        if let Some(error) = params.error {
            info!("Visitor did not consent on {provider_slug}: {error}");
            return redirect;
        }

        let Some(code) = params.code.filter(|code| !code.is_empty()) else {
            warn!("Callback on {provider_slug} carried no code");
            return redirect;
        };

        let Some(provider) = self.providers.get(carried.state.provider_name) else {
            warn!("Provider {provider_slug} is no longer configured");
            return redirect;
        };

        let store = Arc::clone(&self.store);
        let dispatcher = Arc::clone(&self.dispatcher);
        let state = carried.state;
        let spawned = self.dispatcher.spawn(async move {
            if let Err(e) = capture(provider, store, dispatcher, state, code).await {
                warn!("Campaign attempt aborted after redirect: {e:?}");
            }
        });
        if let Err(e) = spawned {
            error!("Could not schedule campaign capture: {e:?}");
        }

        redirect
    }

    fn to_catch_all(&self, cookies: Vec<SealedCookie>) -> Redirect {
        Redirect {
            location: self.catch_all.clone(),
            cookies,
        }
    }
}

/// Exchanges the code for the visitor's identity and hands it to the dispatcher.
async fn capture(
    provider: Arc<dyn Provider>,
    store: Arc<dyn CampaignStore>,
    dispatcher: Arc<Dispatcher>,
    state: CampaignState,
    code: String,
) -> Result<(), Error> {
    let result = provider
        .resolve(&code)
        .await
        .map_err(|e| Error::from(e).or_campaign(CampaignErrorKind::VendorExchangeFailure))?;
    debug!(
        "{} identified visitor as {}",
        provider.name(),
        result.email_address
    );

    // The list's owner scopes which outputs may be delivered to.
    let list_id = Id::parse_str(&state.list_id)
        .map_err(|_| campaign_error(CampaignErrorKind::RecordFailure))?;
    let list = store
        .list_by_id(list_id)
        .await
        .map_err(|e| e.into_campaign(CampaignErrorKind::RecordFailure))?;

    // Runs inside this tracked task so a shutdown drain waits for both branches.
    dispatcher
        .record_and_dispatch(&state, result, list.user_id)
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::store::MemoryStore;
    use crate::{email_lists, outputs};
    use clap::Parser;
    use entity::output_kind::OutputKind;
    use std::collections::HashMap;

    const CATCH_ALL: &str = "https://bing.com";

    struct Fixture {
        relay: CampaignRelay,
        store: Arc<MemoryStore>,
        server: mockito::ServerGuard,
        list: email_lists::Model,
    }

    async fn fixture() -> Fixture {
        let server = mockito::Server::new_async().await;
        let url = server.url();
        let config = Config::parse_from([
            "campaign_relay".to_string(),
            "--hostname".to_string(),
            "relay.example".to_string(),
            "--crypto-secret".to_string(),
            "123456789_123456789_123456789_12".to_string(),
            "--cookie-secret".to_string(),
            "abcdefghij_abcdefghij_abcdefghij".to_string(),
            "--google-client-id".to_string(),
            "gid".to_string(),
            "--google-client-secret".to_string(),
            "gsecret".to_string(),
            "--google-auth-url".to_string(),
            format!("{url}/auth"),
            "--google-token-url".to_string(),
            format!("{url}/token"),
            "--google-userinfo-url".to_string(),
            format!("{url}/userinfo"),
            "--outbound-max-retries".to_string(),
            "0".to_string(),
            "--operator-api-key".to_string(),
            "op-key".to_string(),
        ]);

        let store = Arc::new(MemoryStore::new());
        let now = chrono::Utc::now();
        let list = email_lists::Model {
            id: Id::new_v4(),
            user_id: Id::new_v4(),
            name: "Launch".to_string(),
            description: None,
            created_at: now.into(),
            updated_at: now.into(),
        };
        store.add_list(list.clone());

        let relay = CampaignRelay::from_config(&config, store.clone()).unwrap();
        Fixture {
            relay,
            store,
            server,
            list,
        }
    }

    fn add_webhook(fx: &Fixture, path: &str) -> String {
        let now = chrono::Utc::now();
        let output = outputs::Model {
            id: Id::new_v4(),
            user_id: fx.list.user_id,
            output_kind: OutputKind::Webhook,
            name: path.to_string(),
            list_id: None,
            api_key: None,
            target: Some(format!("{}/{path}", fx.server.url())),
            msg_fmt: None,
            omit_ad_tracking: false,
            created_at: now.into(),
            updated_at: now.into(),
        };
        fx.store.add_output(output.clone());
        output.id.to_string()
    }

    fn jar(cookies: &[SealedCookie]) -> HashMap<String, String> {
        cookies
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    fn nonce_of(location: &str) -> String {
        url::Url::parse(location)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn token_of(link: &str) -> String {
        url::Url::parse(link)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "c")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn issue_link_builds_campaign_url() {
        let fx = fixture().await;
        let state = CampaignState::new(fx.list.id.to_string(), ProviderName::Google, vec![], "");
        let link = fx.relay.issue_link(&state).await.unwrap();
        assert!(link.starts_with("https://relay.example/c?c="));
    }

    #[tokio::test]
    async fn issue_link_rejects_unconfigured_provider_and_unknown_list() {
        let fx = fixture().await;

        let discord = CampaignState::new(fx.list.id.to_string(), ProviderName::Discord, vec![], "");
        let err = fx.relay.issue_link(&discord).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );

        let missing = CampaignState::new(Id::new_v4().to_string(), ProviderName::Google, vec![], "");
        let err = fx.relay.issue_link(&missing).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
    }

    #[tokio::test]
    async fn only_the_configured_operator_key_is_authorized() {
        let fx = fixture().await;
        assert!(fx.relay.authorizes_operator("op-key"));
        assert!(!fx.relay.authorizes_operator("op-kex"));
        assert!(!fx.relay.authorizes_operator(""));
    }

    #[tokio::test]
    async fn invalid_token_goes_to_catch_all_without_cookies() {
        let fx = fixture().await;
        let redirect = fx.relay.begin_from_token("garbage");
        assert_eq!(redirect.location, CATCH_ALL);
        assert!(redirect.cookies.is_empty());
    }

    #[tokio::test]
    async fn entry_redirects_to_provider_with_nonce_and_cookies() {
        let fx = fixture().await;
        let state = CampaignState::new(fx.list.id.to_string(), ProviderName::Google, vec![], "");
        let link = fx.relay.issue_link(&state).await.unwrap();

        let redirect = fx.relay.begin_from_token(&token_of(&link));
        assert!(redirect.location.starts_with(&format!("{}/auth?", fx.server.url())));
        assert_eq!(redirect.cookies.len(), 6);
        assert_eq!(nonce_of(&redirect.location).len(), 64);
    }

    #[tokio::test]
    async fn direct_entry_for_unknown_provider_goes_to_catch_all() {
        let fx = fixture().await;
        let redirect = fx.relay.begin_direct("myspace", "list-1", vec![], None);
        assert_eq!(redirect.location, CATCH_ALL);
    }

    #[tokio::test]
    async fn direct_entry_starts_attempt_and_drops_relative_redirects() {
        let fx = fixture().await;
        let redirect = fx.relay.begin_direct(
            "google",
            &fx.list.id.to_string(),
            vec!["out-a".to_string()],
            Some("/thanks".to_string()),
        );
        assert!(redirect.location.starts_with(&format!("{}/auth?", fx.server.url())));

        let cookies = jar(&redirect.cookies);
        let carried = fx.relay.carrier.open(|name| cookies.get(name).cloned()).unwrap();
        assert_eq!(carried.state.redirect_url, "");
        assert_eq!(carried.state.output_ids, vec!["out-a".to_string()]);
    }

    #[tokio::test]
    async fn callback_records_once_and_notifies_every_output() {
        let mut fx = fixture().await;
        let token = fx
            .server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"at-1","token_type":"Bearer"}"#)
            .create_async()
            .await;
        let userinfo = fx
            .server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at-1")
            .with_status(200)
            .with_body(r#"{"email":"ada@example.com","name":"Ada"}"#)
            .create_async()
            .await;
        let out_a = fx.server.mock("POST", "/out-a").with_status(200).create_async().await;
        let out_b = fx.server.mock("POST", "/out-b").with_status(200).create_async().await;
        let ids = vec![add_webhook(&fx, "out-a"), add_webhook(&fx, "out-b")];

        let state = CampaignState::new(
            fx.list.id.to_string(),
            ProviderName::Google,
            ids,
            "https://site.example/thanks",
        );
        let link = fx.relay.issue_link(&state).await.unwrap();
        let entry = fx.relay.begin_from_token(&token_of(&link));
        let cookies = jar(&entry.cookies);

        let redirect = fx.relay.complete(
            "google",
            CallbackParams {
                code: Some("code-1".to_string()),
                state: Some(nonce_of(&entry.location)),
                error: None,
            },
            |name| cookies.get(name).cloned(),
        );
        assert_eq!(redirect.location, "https://site.example/thanks");
        assert!(redirect.cookies.iter().all(|c| c.max_age.is_zero()));

        fx.relay.dispatcher().drain().await;
        token.assert_async().await;
        userinfo.assert_async().await;
        out_a.assert_async().await;
        out_b.assert_async().await;

        let subscribers = fx.store.subscribers();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].email_addr, "ada@example.com");
        assert_eq!(subscribers[0].user_id, fx.list.user_id);
    }

    #[tokio::test]
    async fn forged_state_records_nothing() {
        let mut fx = fixture().await;
        let token = fx
            .server
            .mock("POST", "/token")
            .expect(0)
            .create_async()
            .await;
        let hook = fx.server.mock("POST", "/hook").expect(0).create_async().await;
        let ids = vec![add_webhook(&fx, "hook")];

        let state = CampaignState::new(
            fx.list.id.to_string(),
            ProviderName::Google,
            ids,
            "https://site.example/thanks",
        );
        let link = fx.relay.issue_link(&state).await.unwrap();
        let entry = fx.relay.begin_from_token(&token_of(&link));
        let cookies = jar(&entry.cookies);

        for forged in [Some("not-the-nonce".to_string()), None] {
            let redirect = fx.relay.complete(
                "google",
                CallbackParams {
                    code: Some("code-1".to_string()),
                    state: forged,
                    error: None,
                },
                |name| cookies.get(name).cloned(),
            );
            assert_eq!(redirect.location, "https://site.example/thanks");
        }

        fx.relay.dispatcher().drain().await;
        token.assert_async().await;
        hook.assert_async().await;
        assert!(fx.store.subscribers().is_empty());
    }

    #[tokio::test]
    async fn callback_without_cookies_goes_to_catch_all() {
        let fx = fixture().await;
        let redirect = fx.relay.complete(
            "google",
            CallbackParams {
                code: Some("code-1".to_string()),
                state: Some("anything".to_string()),
                error: None,
            },
            |_| None,
        );
        assert_eq!(redirect.location, CATCH_ALL);
        assert_eq!(redirect.cookies.len(), 6);
    }

    #[tokio::test]
    async fn callback_on_other_provider_goes_to_catch_all() {
        let fx = fixture().await;
        let state = CampaignState::new(fx.list.id.to_string(), ProviderName::Google, vec![], "");
        let entry = fx.relay.begin(state);
        let cookies = jar(&entry.cookies);

        let redirect = fx.relay.complete(
            "discord",
            CallbackParams {
                code: Some("code-1".to_string()),
                state: Some(nonce_of(&entry.location)),
                error: None,
            },
            |name| cookies.get(name).cloned(),
        );
        assert_eq!(redirect.location, CATCH_ALL);
    }

    #[tokio::test]
    async fn vendor_failure_records_nothing() {
        let mut fx = fixture().await;
        let _token = fx
            .server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let state = CampaignState::new(fx.list.id.to_string(), ProviderName::Google, vec![], "");
        let entry = fx.relay.begin(state);
        let cookies = jar(&entry.cookies);

        let redirect = fx.relay.complete(
            "google",
            CallbackParams {
                code: Some("stale".to_string()),
                state: Some(nonce_of(&entry.location)),
                error: None,
            },
            |name| cookies.get(name).cloned(),
        );
        assert_eq!(redirect.location, CATCH_ALL);

        fx.relay.dispatcher().drain().await;
        assert!(fx.store.subscribers().is_empty());
    }
}
