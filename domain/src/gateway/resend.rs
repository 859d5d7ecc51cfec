//! Resend: creates a contact in an audience.

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

#[derive(Debug, Serialize)]
struct CreateContactRequest<'a> {
    email: &'a str,
    first_name: &'a str,
    unsubscribed: bool,
}

pub struct ResendOutput {
    pub id: Id,
    pub audience_id: String,
    pub api_key: String,
    pub base_url: String,
    pub http_client: HttpClient,
}

#[async_trait]
impl Output for ResendOutput {
    fn kind(&self) -> OutputKind {
        OutputKind::Resend
    }

    fn id(&self) -> Id {
        self.id
    }

    async fn handle(&self, email_addr: &str, name: &str) -> Result<(), Error> {
        let url = format!(
            "{}/audiences/{}/contacts",
            self.base_url,
            urlencoding::encode(&self.audience_id)
        );
        let body = CreateContactRequest {
            email: email_addr,
            first_name: name.trim(),
            unsubscribed: false,
        };

        let auth = ApiKeyAuth::bearer(SecretString::new(self.api_key.clone()));
        deliver(auth.authenticate(self.http_client.post(&url).json(&body)), "Resend").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CampaignErrorKind;
    use campaign_auth::http::ClientBuilder;

    fn output(base_url: String) -> ResendOutput {
        ResendOutput {
            id: Id::new_v4(),
            audience_id: "aud-1".to_string(),
            api_key: "re_123".to_string(),
            base_url,
            http_client: ClientBuilder::new().with_max_retries(0).build().unwrap(),
        }
    }

    #[tokio::test]
    async fn creates_contact_in_audience() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audiences/aud-1/contacts")
            .match_header("authorization", "Bearer re_123")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "email": "ada@example.com",
                "first_name": "Ada"
            })))
            .with_status(200)
            .with_body(r#"{"object":"contact","id":"c-1"}"#)
            .create_async()
            .await;

        output(server.url())
            .handle("ada@example.com", "Ada")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_request_is_delivery_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/audiences/aud-1/contacts")
            .with_status(422)
            .with_body(r#"{"message":"invalid email"}"#)
            .create_async()
            .await;

        let err = output(server.url())
            .handle("not-an-email", "Ada")
            .await
            .unwrap_err();
        assert_eq!(
            err.campaign_kind(),
            Some(CampaignErrorKind::OutputDeliveryFailure)
        );
    }
}
