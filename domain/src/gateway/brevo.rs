//! Brevo: creates (or updates) a contact and adds it to a list.

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
#[serde(rename_all = "camelCase")]
struct CreateContactRequest<'a> {
    email: &'a str,
    attributes: ContactAttributes<'a>,
    list_ids: [i64; 1],
    update_enabled: bool,
}

#[derive(Debug, Serialize)]
struct ContactAttributes<'a> {
    #[serde(rename = "FIRSTNAME")]
    first_name: &'a str,
}

pub struct BrevoOutput {
    pub id: Id,
    pub list_id: i64,
    pub api_key: String,
    pub base_url: String,
    pub http_client: HttpClient,
}

#[async_trait]
impl Output for BrevoOutput {
    fn kind(&self) -> OutputKind {
        OutputKind::Brevo
    }

    fn id(&self) -> Id {
        self.id
    }

    async fn handle(&self, email_addr: &str, name: &str) -> Result<(), Error> {
        let url = format!("{}/contacts", self.base_url);
        let body = CreateContactRequest {
            email: email_addr,
            attributes: ContactAttributes {
                first_name: name.trim(),
            },
            list_ids: [self.list_id],
            update_enabled: true,
        };

        // Brevo expects the raw key in an `api-key` header.
        let auth = ApiKeyAuth::header(SecretString::new(self.api_key.clone()), "api-key", "");
        deliver(auth.authenticate(self.http_client.post(&url).json(&body)), "Brevo").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_auth::http::ClientBuilder;

    #[tokio::test]
    async fn posts_contact_with_api_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/contacts")
            .match_header("api-key", "xkeysib-1")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "email": "ada@example.com",
                "attributes": { "FIRSTNAME": "Ada" },
                "listIds": [7],
                "updateEnabled": true
            })))
            .with_status(201)
            .create_async()
            .await;

        let output = BrevoOutput {
            id: Id::new_v4(),
            list_id: 7,
            api_key: "xkeysib-1".to_string(),
            base_url: server.url(),
            http_client: ClientBuilder::new().with_max_retries(0).build().unwrap(),
        };

        output.handle("ada@example.com", "Ada").await.unwrap();
        mock.assert_async().await;
    }
}
