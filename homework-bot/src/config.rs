use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use homework_core::{PollCursor, DEFAULT_REVIEW_API_URL, DEFAULT_TELEGRAM_API_URL};
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_BACKOFF_INTERVAL: Duration = Duration::from_secs(150);
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} environment variable is required")]
    Missing { name: &'static str },
    #[error("{name}={value:?} is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the first request starts reading history from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartFrom {
    /// Only statuses that change after startup.
    #[default]
    Now,
    /// The whole history, `from_date=0`.
    Beginning,
}

impl StartFrom {
    pub fn initial_cursor(self, now: PollCursor) -> PollCursor {
        match self {
            StartFrom::Now => now,
            StartFrom::Beginning => PollCursor::BEGINNING,
        }
    }
}

impl FromStr for StartFrom {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "now" => Ok(StartFrom::Now),
            "beginning" => Ok(StartFrom::Beginning),
            _ => Err("expected `now` or `beginning`".to_string()),
        }
    }
}

/// Process configuration, built once before the loop starts and never
/// mutated afterwards.
#[derive(Clone)]
pub struct Config {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub poll_interval: Duration,
    pub backoff_interval: Duration,
    pub start_from: StartFrom,
    pub review_api_url: String,
    pub telegram_api_url: String,
    /// Directory for the rotating log files.
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let practicum_token = required(&lookup, "PRAKTIKUM_TOKEN")?;
        let telegram_token = required(&lookup, "TELEGRAM_TOKEN")?;
        let telegram_chat_id = required(&lookup, "TELEGRAM_CHAT_ID")?;

        let poll_interval = interval(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL)?;
        let backoff_interval =
            interval(&lookup, "BACKOFF_INTERVAL_SECS", DEFAULT_BACKOFF_INTERVAL)?;

        let start_from = match optional(&lookup, "START_FROM") {
            Some(value) => {
                value
                    .parse::<StartFrom>()
                    .map_err(|reason| ConfigError::Invalid {
                        name: "START_FROM",
                        value,
                        reason,
                    })?
            }
            None => StartFrom::default(),
        };

        let review_api_url = optional(&lookup, "REVIEW_API_URL")
            .unwrap_or_else(|| DEFAULT_REVIEW_API_URL.to_string());
        let telegram_api_url = optional(&lookup, "TELEGRAM_API_URL")
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());

        let log_dir = optional(&lookup, "LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));

        Ok(Config {
            practicum_token,
            telegram_token,
            telegram_chat_id,
            poll_interval,
            backoff_interval,
            start_from,
            review_api_url,
            telegram_api_url,
            log_dir,
        })
    }

    /// Secrets that must never reach logs or chat.
    pub fn secrets(&self) -> [&str; 2] {
        [self.practicum_token.as_str(), self.telegram_token.as_str()]
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("practicum_token", &"[REDACTED]")
            .field("telegram_token", &"[REDACTED]")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("poll_interval", &self.poll_interval)
            .field("backoff_interval", &self.backoff_interval)
            .field("start_from", &self.start_from)
            .field("review_api_url", &self.review_api_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

/// Blank values count as unset.
fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|s| !s.trim().is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::Missing { name })
}

fn interval<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = optional(lookup, name) else {
        return Ok(default);
    };

    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            value,
            reason: "must be at least one second".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("PRAKTIKUM_TOKEN", "practicum-secret"),
        ("TELEGRAM_TOKEN", "123:telegram-secret"),
        ("TELEGRAM_CHAT_ID", "42"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(vars(&REQUIRED)).unwrap();
        assert_eq!(config.practicum_token, "practicum-secret");
        assert_eq!(config.telegram_chat_id, "42");
        assert_eq!(config.poll_interval, Duration::from_secs(300));
        assert_eq!(config.backoff_interval, Duration::from_secs(150));
        assert_eq!(config.start_from, StartFrom::Now);
        assert_eq!(config.review_api_url, DEFAULT_REVIEW_API_URL);
        assert_eq!(config.telegram_api_url, DEFAULT_TELEGRAM_API_URL);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_each_required_variable_is_enforced() {
        for (missing, _) in REQUIRED {
            let present: Vec<(&str, &str)> = REQUIRED
                .iter()
                .copied()
                .filter(|(name, _)| *name != missing)
                .collect();
            let err = Config::from_lookup(vars(&present)).unwrap_err();
            assert_eq!(err, ConfigError::Missing { name: missing });
        }
    }

    #[test]
    fn test_blank_required_variable_is_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[1] = ("TELEGRAM_TOKEN", "   ");
        let err = Config::from_lookup(vars(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                name: "TELEGRAM_TOKEN"
            }
        );
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("POLL_INTERVAL_SECS", "60"),
            ("BACKOFF_INTERVAL_SECS", "10"),
            ("START_FROM", "Beginning"),
            ("REVIEW_API_URL", "http://localhost:8080/statuses/"),
            ("LOG_DIR", "/var/log/homework-bot"),
        ]);
        let config = Config::from_lookup(vars(&pairs)).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.backoff_interval, Duration::from_secs(10));
        assert_eq!(config.start_from, StartFrom::Beginning);
        assert_eq!(config.review_api_url, "http://localhost:8080/statuses/");
        assert_eq!(config.log_dir, PathBuf::from("/var/log/homework-bot"));
    }

    #[test]
    fn test_invalid_start_from() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("START_FROM", "yesterday"));
        let err = Config::from_lookup(vars(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "START_FROM",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_intervals() {
        for bad in ["0", "-5", "five"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("POLL_INTERVAL_SECS", bad));
            let err = Config::from_lookup(vars(&pairs)).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    name: "POLL_INTERVAL_SECS",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_initial_cursor() {
        let now = PollCursor(1_700_000_000);
        assert_eq!(StartFrom::Now.initial_cursor(now), now);
        assert_eq!(StartFrom::Beginning.initial_cursor(now), PollCursor(0));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = Config::from_lookup(vars(&REQUIRED)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("practicum-secret"));
        assert!(!debug.contains("telegram-secret"));
        assert!(debug.contains("42"));
    }
}
