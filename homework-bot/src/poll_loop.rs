//! The poll → interpret → notify loop.
//!
//! States: `Starting → Polling ⇄ BackingOff`. The loop owns the only piece
//! of mutable state in the bot, the cursor, and never exits on its own:
//! every error is classified once in [`PollLoop::back_off`] and answered
//! with the shorter backoff sleep.

use std::time::Duration;

use async_trait::async_trait;
use homework_core::{
    interpret, DeliveryError, FetchError, MessageTransport, PollCursor, Sanitizer, StatusSource,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{Config, StartFrom};
use crate::notifier::Notifier;

pub const STARTUP_ANNOUNCEMENT: &str = "Bot started!";
pub const ERROR_REPORT_PREFIX: &str = "Bot encountered an error";

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Current wall-clock time as a cursor.
pub fn current_cursor() -> PollCursor {
    PollCursor(u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Polling,
    BackingOff,
}

/// Which cadence an iteration ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    Main,
    Backoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Notified,
    NothingNew,
}

#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub poll_interval: Duration,
    pub backoff_interval: Duration,
    pub start_from: StartFrom,
}

impl From<&Config> for LoopSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
            backoff_interval: config.backoff_interval,
            start_from: config.start_from,
        }
    }
}

/// Everything that can go wrong inside one Polling iteration.
#[derive(Debug, Error)]
pub enum IterationError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// Log only; the chat is not reachable.
    Quiet,
    /// Tell the user what broke.
    Report,
}

impl IterationError {
    fn recovery(&self) -> Recovery {
        match self {
            Self::Delivery(DeliveryError::MalformedContent { .. })
            | Self::Delivery(DeliveryError::Unauthorized { .. }) => Recovery::Quiet,
            Self::Delivery(DeliveryError::Api { .. })
            | Self::Delivery(DeliveryError::Transport(_))
            | Self::Fetch(_) => Recovery::Report,
        }
    }
}

pub struct PollLoop<S, T, Z> {
    source: S,
    notifier: Notifier<T>,
    sleeper: Z,
    settings: LoopSettings,
    sanitizer: Sanitizer,
    cursor: PollCursor,
    state: LoopState,
}

impl<S, T, Z> PollLoop<S, T, Z>
where
    S: StatusSource,
    T: MessageTransport,
    Z: Sleeper,
{
    pub fn new(
        source: S,
        notifier: Notifier<T>,
        sleeper: Z,
        settings: LoopSettings,
        sanitizer: Sanitizer,
    ) -> Self {
        Self {
            source,
            notifier,
            sleeper,
            settings,
            sanitizer,
            cursor: PollCursor::BEGINNING,
            state: LoopState::Starting,
        }
    }

    pub fn cursor(&self) -> PollCursor {
        self.cursor
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Starting: check credentials, announce, place the cursor.
    ///
    /// Credential problems are logged, not fatal; the announcement is only
    /// attempted when `getMe` succeeded.
    pub async fn start(&mut self, now: PollCursor) {
        match self.notifier.verify().await {
            Ok(me) => {
                info!(
                    "Authorised with Telegram as {} (id {}), reporting to chat {}",
                    me.username.as_deref().unwrap_or(&me.first_name),
                    me.id,
                    self.notifier.chat_id()
                );
                self.notifier.notify(STARTUP_ANNOUNCEMENT).await;
            }
            Err(e) => {
                error!(
                    "Telegram authorisation check failed, skipping startup announcement: {}",
                    self.sanitizer.sanitize(&e.to_string())
                );
            }
        }

        self.cursor = self.settings.start_from.initial_cursor(now);
        self.state = LoopState::Polling;
        info!("Polling homework statuses from {}", self.cursor);
    }

    /// One Polling iteration without the trailing sleep.
    ///
    /// The cursor moves as soon as the fetch succeeds, so a record whose
    /// delivery fails is not sent again.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, IterationError> {
        let payload = self.source.fetch(self.cursor).await?;

        let previous = self.cursor;
        self.cursor = previous.advance(payload.new_cursor());
        if self.cursor != previous {
            debug!("Cursor advanced {} -> {}", previous, self.cursor);
        }

        let Some(record) = payload.latest() else {
            debug!("No new homework statuses");
            return Ok(PollOutcome::NothingNew);
        };

        if payload.homework_count() > 1 {
            debug!(
                "{} statuses changed, reporting only the most recent",
                payload.homework_count()
            );
        }

        let message = interpret(&record);
        self.notifier.deliver(&message).await?;
        Ok(PollOutcome::Notified)
    }

    /// One iteration plus its cadence sleep.
    pub async fn step(&mut self) -> Delay {
        self.state = LoopState::Polling;

        match self.poll_once().await {
            Ok(_) => {
                self.sleeper.sleep(self.settings.poll_interval).await;
                Delay::Main
            }
            Err(err) => {
                self.back_off(err).await;
                Delay::Backoff
            }
        }
    }

    /// BackingOff: the single place where iteration errors are handled.
    async fn back_off(&mut self, err: IterationError) {
        self.state = LoopState::BackingOff;
        let description = self.sanitizer.sanitize(&err.to_string());

        match err.recovery() {
            Recovery::Quiet => {
                error!(
                    "Telegram refused delivery, not reporting to chat: {}",
                    description
                );
            }
            Recovery::Report => {
                let report = format!("{}: {}", ERROR_REPORT_PREFIX, description);
                error!("{}", report);
                self.notifier.notify(&report).await;
            }
        }

        self.sleeper.sleep(self.settings.backoff_interval).await;
        self.state = LoopState::Polling;
    }

    /// Poll forever.
    pub async fn run(mut self) {
        loop {
            self.step().await;
        }
    }
}
