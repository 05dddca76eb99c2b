//! Telegram Bot API transport.
//!
//! Two methods are used: `getMe` to check the token at startup and
//! `sendMessage` for everything else. Failures are classified by HTTP
//! status so callers can tell "this message is bad" apart from "this bot
//! cannot talk to this chat".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram `sendMessage` text limit (UTF-8 characters).
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// 400: the text or chat id was not acceptable.
    #[error("Telegram rejected the message: {description}")]
    MalformedContent { description: String },
    /// 401/403/404: bad token, bot blocked, or chat not reachable.
    #[error("Telegram refused the bot credentials or chat: {description}")]
    Unauthorized { description: String },
    #[error("Telegram answered {status}: {description}")]
    Api {
        status: StatusCode,
        description: String,
    },
    /// Carries no URL: Bot API URLs embed the token.
    #[error("request to Telegram failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl DeliveryError {
    fn from_status(status: StatusCode, description: String) -> Self {
        match status.as_u16() {
            400 => Self::MalformedContent { description },
            401 | 403 | 404 => Self::Unauthorized { description },
            _ => Self::Api {
                status,
                description,
            },
        }
    }

    fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Subset of the `getMe` result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError>;

    /// Cheap call that fails with `Unauthorized` when the token is bad.
    async fn get_me(&self) -> Result<BotIdentity, DeliveryError>;
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: String, api_base: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("homework-bot/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        )
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DeliveryError> {
        let response = request.send().await.map_err(DeliveryError::transport)?;
        let status = response.status();
        let body = response.text().await.map_err(DeliveryError::transport)?;
        let parsed: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let description = parsed.and_then(|p| p.description).unwrap_or(body);
            return Err(DeliveryError::from_status(status, description));
        }

        match parsed {
            Some(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) => Ok(result),
            Some(ApiResponse { description, .. }) => Err(DeliveryError::Api {
                status,
                description: description.unwrap_or_else(|| "response not ok".to_string()),
            }),
            None => Err(DeliveryError::Api {
                status,
                description: format!("unreadable response: {}", body),
            }),
        }
    }
}

#[async_trait]
impl MessageTransport for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        let payload = json!({
            "chat_id": chat_id,
            "text": truncate_message(text, TELEGRAM_MESSAGE_LIMIT),
        });

        let request = self.client.post(self.method_url("sendMessage")).json(&payload);
        self.call::<serde_json::Value>(request).await?;

        debug!("Telegram message delivered to chat {}", chat_id);
        Ok(())
    }

    async fn get_me(&self) -> Result<BotIdentity, DeliveryError> {
        let request = self.client.get(self.method_url("getMe"));
        self.call(request).await
    }
}

/// Truncate a message to fit within the Telegram character limit.
pub fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let suffix = "\n\n[truncated]";
    let budget = limit.saturating_sub(suffix.len());
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{suffix}")
}
