//! Telegram: posts a formatted message to a chat through a bot.

use async_trait::async_trait;
use campaign_auth::http::HttpClient;
use entity::output_kind::OutputKind;
use serde::Serialize;

use super::deliver;
use crate::error::Error;
use crate::output::{interpolate, Output};
use crate::Id;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
}

pub struct TelegramOutput {
    pub id: Id,
    pub chat_id: String,
    pub msg_fmt: String,
    pub bot_token: String,
    pub base_url: String,
    pub http_client: HttpClient,
}

#[async_trait]
impl Output for TelegramOutput {
    fn kind(&self) -> OutputKind {
        OutputKind::Telegram
    }

    fn id(&self) -> Id {
        self.id
    }

    async fn handle(&self, email_addr: &str, name: &str) -> Result<(), Error> {
        // The bot token is part of the path; never log this URL.
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text: interpolate(&self.msg_fmt, name, email_addr),
        };

        deliver(self.http_client.post(&url).json(&body), "Telegram").await
    }
}
