//! Webhook: posts the subscriber to an arbitrary URL.
//!
//! Without a message format the body is JSON `{"emailAddr": ..., "name": ...}`; with one it
//! is the rendered template as plain text. When a signing secret is configured the body's
//! HMAC-SHA256 goes in `X-Campaign-Signature` as `sha256=<hex>`.

use async_trait::async_trait;
use campaign_auth::crypto::sign_hex;
use campaign_auth::http::HttpClient;
use entity::output_kind::OutputKind;
use serde::Serialize;

use super::deliver;
use crate::error::Error;
use crate::output::{interpolate, Output};
use crate::Id;

pub const SIGNATURE_HEADER: &str = "X-Campaign-Signature";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    email_addr: &'a str,
    name: &'a str,
}

pub struct WebhookOutput {
    pub id: Id,
    pub url: url::Url,
    pub msg_fmt: Option<String>,
    pub signing_secret: Option<String>,
    pub http_client: HttpClient,
}

impl WebhookOutput {
    fn body(&self, email_addr: &str, name: &str) -> Result<(String, &'static str), Error> {
        match &self.msg_fmt {
            Some(fmt) => Ok((interpolate(fmt, name, email_addr), "text/plain; charset=utf-8")),
            None => {
                let payload = WebhookPayload {
                    email_addr,
                    name: name.trim(),
                };
                let json = serde_json::to_string(&payload).map_err(|e| Error {
                    source: Some(Box::new(e)),
                    error_kind: crate::error::DomainErrorKind::Internal(
                        crate::error::InternalErrorKind::Other("webhook payload".to_string()),
                    ),
                })?;
                Ok((json, "application/json"))
            }
        }
    }
}

#[async_trait]
impl Output for WebhookOutput {
    fn kind(&self) -> OutputKind {
        OutputKind::Webhook
    }

    fn id(&self) -> Id {
        self.id
    }

    async fn handle(&self, email_addr: &str, name: &str) -> Result<(), Error> {
        let (body, content_type) = self.body(email_addr, name)?;

        let mut request = self
            .http_client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, content_type);

        if let Some(secret) = &self.signing_secret {
            let signature = sign_hex(secret, body.as_bytes())?;
            request = request.header(SIGNATURE_HEADER, format!("sha256={signature}"));
        }

        deliver(request.body(body), "webhook").await
    }
}
