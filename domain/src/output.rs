//! Output integrations that receive newly captured subscribers.
//!
//! Every configured output row becomes an `Output` trait object through `OutputFactory`.
//! The dispatcher only ever sees the uniform `handle(email_addr, name)` contract, so adding
//! an integration means adding a gateway and one arm in `OutputFactory::build`.

use async_trait::async_trait;
use campaign_auth::http::HttpClient;
use entity::output_kind::OutputKind;
use entity::outputs;
use service::config::Config;

use crate::error::{config_error, Error};
use crate::gateway::{aweber, brevo, resend, telegram, webhook};
use crate::Id;

/// Telegram text used when an output has no `msg_fmt`.
pub const DEFAULT_TELEGRAM_FORMAT: &str = "New subscriber: {{ name }} <{{ emailAddr }}>";

#[async_trait]
pub trait Output: Send + Sync {
    fn kind(&self) -> OutputKind;

    fn id(&self) -> Id;

    /// Delivers one subscriber. Any non-2xx response is an error.
    async fn handle(&self, email_addr: &str, name: &str) -> Result<(), Error>;
}

/// Shared settings every gateway draws from.
#[derive(Clone)]
pub struct OutputSettings {
    pub aweber_base_url: String,
    pub resend_base_url: String,
    pub brevo_base_url: String,
    pub telegram_base_url: String,
    pub telegram_bot_token: Option<String>,
    pub webhook_signing_secret: Option<String>,
}

impl OutputSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            aweber_base_url: config.aweber_base_url.clone(),
            resend_base_url: config.resend_base_url.clone(),
            brevo_base_url: config.brevo_base_url.clone(),
            telegram_base_url: config.telegram_base_url.clone(),
            telegram_bot_token: config.telegram_bot_token(),
            webhook_signing_secret: config.webhook_signing_secret(),
        }
    }
}

/// Turns stored output rows into deliverable outputs.
#[derive(Clone)]
pub struct OutputFactory {
    settings: OutputSettings,
    http_client: HttpClient,
}

impl OutputFactory {
    pub fn new(settings: OutputSettings, http_client: HttpClient) -> Self {
        Self {
            settings,
            http_client,
        }
    }

    /// Fails with a config error when the row lacks a column its kind needs.
    pub fn build(&self, model: outputs::Model) -> Result<Box<dyn Output>, Error> {
        let http_client = self.http_client.clone();
        let output: Box<dyn Output> = match model.output_kind {
            OutputKind::Aweber => Box::new(aweber::AWeberOutput {
                id: model.id,
                account_id: required(model.target, "AWeber account id")?,
                list_id: required(model.list_id, "AWeber list id")?,
                access_token: required(model.api_key, "AWeber access token")?,
                omit_ad_tracking: model.omit_ad_tracking,
                base_url: self.settings.aweber_base_url.clone(),
                http_client,
            }),
            OutputKind::Resend => Box::new(resend::ResendOutput {
                id: model.id,
                audience_id: required(model.list_id, "Resend audience id")?,
                api_key: required(model.api_key, "Resend API key")?,
                base_url: self.settings.resend_base_url.clone(),
                http_client,
            }),
            OutputKind::Brevo => {
                let list_id = required(model.list_id, "Brevo list id")?;
                Box::new(brevo::BrevoOutput {
                    id: model.id,
                    list_id: list_id
                        .parse()
                        .map_err(|_| config_error("Brevo list id must be numeric"))?,
                    api_key: required(model.api_key, "Brevo API key")?,
                    base_url: self.settings.brevo_base_url.clone(),
                    http_client,
                })
            }
            OutputKind::Telegram => Box::new(telegram::TelegramOutput {
                id: model.id,
                chat_id: required(model.target, "Telegram chat id")?,
                msg_fmt: model
                    .msg_fmt
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_FORMAT.to_string()),
                bot_token: model
                    .api_key
                    .or_else(|| self.settings.telegram_bot_token.clone())
                    .ok_or_else(|| config_error("Telegram bot token is not configured"))?,
                base_url: self.settings.telegram_base_url.clone(),
                http_client,
            }),
            OutputKind::Webhook => {
                let target = required(model.target, "webhook URL")?;
                let url = url::Url::parse(&target)
                    .map_err(|_| config_error("webhook URL is not a valid URL"))?;
                Box::new(webhook::WebhookOutput {
                    id: model.id,
                    url,
                    msg_fmt: model.msg_fmt.filter(|f| !f.trim().is_empty()),
                    signing_secret: self.settings.webhook_signing_secret.clone(),
                    http_client,
                })
            }
        };
        Ok(output)
    }
}

fn required(value: Option<String>, what: &str) -> Result<String, Error> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| config_error(&format!("{what} is missing")))
}

/// Renders `{{ name }}` and `{{ emailAddr }}` placeholders.
///
/// Whitespace inside the braces is ignored and unknown placeholders render as nothing.
/// An opening `{{` without a closing `}}` is kept as literal text.
pub fn interpolate(template: &str, name: &str, email_addr: &str) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        rendered.push_str(&rest[..start]);
        match rest[start + 2..start + 2 + len].trim() {
            "name" => rendered.push_str(name.trim()),
            "emailAddr" => rendered.push_str(email_addr),
            _ => {}
        }
        rest = &rest[start + 2 + len + 2..];
    }

    rendered.push_str(rest);
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_auth::http::ClientBuilder;

    fn factory() -> OutputFactory {
        OutputFactory::new(
            OutputSettings {
                aweber_base_url: "https://aweber.test".to_string(),
                resend_base_url: "https://resend.test".to_string(),
                brevo_base_url: "https://brevo.test".to_string(),
                telegram_base_url: "https://telegram.test".to_string(),
                telegram_bot_token: None,
                webhook_signing_secret: None,
            },
            ClientBuilder::new().build().unwrap(),
        )
    }

    fn row(kind: OutputKind) -> outputs::Model {
        let now = chrono::Utc::now();
        outputs::Model {
            id: Id::new_v4(),
            user_id: Id::new_v4(),
            output_kind: kind,
            name: format!("{kind} output"),
            list_id: None,
            api_key: None,
            target: None,
            msg_fmt: None,
            omit_ad_tracking: false,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn interpolate_fills_known_placeholders() {
        assert_eq!(
            interpolate("Hi {{name}} ({{ emailAddr }})!", " Ada ", "ada@example.com"),
            "Hi Ada (ada@example.com)!"
        );
    }

    #[test]
    fn interpolate_drops_unknown_placeholders() {
        assert_eq!(interpolate("a{{ nope }}b", "Ada", "x"), "ab");
    }

    #[test]
    fn interpolate_keeps_unclosed_braces() {
        assert_eq!(interpolate("{{ name }} {{ oops", "Ada", "x"), "Ada {{ oops");
        assert_eq!(interpolate("no placeholders", "Ada", "x"), "no placeholders");
    }

    #[test]
    fn build_rejects_rows_missing_required_columns() {
        for kind in [
            OutputKind::Aweber,
            OutputKind::Resend,
            OutputKind::Brevo,
            OutputKind::Telegram,
            OutputKind::Webhook,
        ] {
            assert!(factory().build(row(kind)).is_err(), "{kind} built without config");
        }
    }

    #[test]
    fn build_rejects_invalid_webhook_url() {
        let mut model = row(OutputKind::Webhook);
        model.target = Some("not a url".to_string());
        assert!(factory().build(model).is_err());
    }

    #[test]
    fn build_keeps_kind_and_id() {
        let mut model = row(OutputKind::Webhook);
        model.target = Some("https://hooks.example/new".to_string());
        let id = model.id;
        let output = factory().build(model).unwrap();
        assert_eq!(output.kind(), OutputKind::Webhook);
        assert_eq!(output.id(), id);
    }

    #[test]
    fn build_requires_numeric_brevo_list() {
        let mut model = row(OutputKind::Brevo);
        model.list_id = Some("seven".to_string());
        model.api_key = Some("key".to_string());
        assert!(factory().build(model.clone()).is_err());

        model.list_id = Some("7".to_string());
        assert!(factory().build(model).is_ok());
    }
}
