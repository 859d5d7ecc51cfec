//! AWeber: adds the subscriber to a list under an account.

use async_trait::async_trait;
use campaign_auth::api_key::{ApiKeyAuth, ProviderAuth};
use campaign_auth::http::HttpClient;
use entity::output_kind::OutputKind;
use secrecy::SecretString;
use serde::Serialize;

use super::deliver;
use crate::error::Error;
use crate::output::Output;
use crate::Id;

/// Tag recorded in AWeber's ad tracking field unless the output opts out.
const AD_TRACKING: &str = "campaign-relay";

#[derive(Debug, Serialize)]
struct AddSubscriberRequest<'a> {
    email: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ad_tracking: Option<&'a str>,
}

pub struct AWeberOutput {
    pub id: Id,
    pub account_id: String,
    pub list_id: String,
    pub access_token: String,
    pub omit_ad_tracking: bool,
    pub base_url: String,
    pub http_client: HttpClient,
}

#[async_trait]
impl Output for AWeberOutput {
    fn kind(&self) -> OutputKind {
        OutputKind::Aweber
    }

    fn id(&self) -> Id {
        self.id
    }

    async fn handle(&self, email_addr: &str, name: &str) -> Result<(), Error> {
        let url = format!(
            "{}/accounts/{}/lists/{}/subscribers",
            self.base_url,
            urlencoding::encode(&self.account_id),
            urlencoding::encode(&self.list_id)
        );
        let body = AddSubscriberRequest {
            email: email_addr,
            name: name.trim(),
            ad_tracking: (!self.omit_ad_tracking).then_some(AD_TRACKING),
        };

        let auth = ApiKeyAuth::bearer(SecretString::new(self.access_token.clone()));
        deliver(auth.authenticate(self.http_client.post(&url).json(&body)), "AWeber").await
    }
}
