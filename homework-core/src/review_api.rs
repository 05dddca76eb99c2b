//! Client for the Practicum homework status API.
//!
//! One call, one query: `GET <endpoint>?from_date=<cursor>` returns every
//! submission whose status changed after `cursor`, newest first, plus the
//! server's notion of "now" to use as the next cursor. Retrying is the
//! caller's business.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_REVIEW_API_URL: &str =
    "https://praktikum.yandex.ru/api/user_api/homework_statuses/";

/// Upper bound on one request, connect to last body byte.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Unix timestamp meaning "fetch everything newer than this instant".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PollCursor(pub u64);

impl PollCursor {
    /// Requests the whole submission history.
    pub const BEGINNING: PollCursor = PollCursor(0);

    /// Move to the server-reported cursor if there is one.
    ///
    /// A cursor never goes backwards: a reported value older than `self`
    /// is ignored.
    pub fn advance(self, reported: Option<PollCursor>) -> PollCursor {
        match reported {
            Some(next) => self.max(next),
            None => self,
        }
    }
}

impl fmt::Display for PollCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PollCursor {
    fn from(ts: u64) -> Self {
        Self(ts)
    }
}

/// One reviewed-homework entry as far as the bot cares about it.
///
/// Fields that are absent or not strings on the wire come through as `None`;
/// deciding what that means is up to [`crate::verdict`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionRecord {
    pub name: Option<String>,
    pub status_code: Option<String>,
}

impl SubmissionRecord {
    pub fn new(name: impl Into<String>, status_code: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            status_code: Some(status_code.into()),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            name: field("homework_name"),
            status_code: field("status"),
        }
    }
}

/// Response body of the status endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeworkStatuses {
    /// Raw JSON; records are read one at a time by `latest`.
    #[serde(default)]
    homeworks: Option<Vec<Value>>,
    #[serde(default)]
    current_date: Option<u64>,
}

impl HomeworkStatuses {
    pub fn homework_count(&self) -> usize {
        self.homeworks.as_ref().map_or(0, Vec::len)
    }

    /// The most recent submission. The API lists newest first.
    pub fn latest(&self) -> Option<SubmissionRecord> {
        self.homeworks
            .as_ref()
            .and_then(|records| records.first())
            .map(SubmissionRecord::from_json)
    }

    /// Cursor to use for the next request, if the server reported one.
    pub fn new_cursor(&self) -> Option<PollCursor> {
        self.current_date.map(PollCursor)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to review API failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("review API answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not decode review API response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Anything that can answer "what changed since `cursor`?".
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, cursor: PollCursor) -> Result<HomeworkStatuses, FetchError>;
}

#[derive(Clone)]
pub struct ReviewApiClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl ReviewApiClient {
    pub fn new(token: String, endpoint: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("homework-bot/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

#[async_trait]
impl StatusSource for ReviewApiClient {
    async fn fetch(&self, cursor: PollCursor) -> Result<HomeworkStatuses, FetchError> {
        debug!("Requesting homework statuses from_date={}", cursor);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("from_date", cursor.0)])
            .header("Authorization", format!("OAuth {}", self.token))
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::Transport)?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(FetchError::Decode)
    }
}
