pub mod review_api;
pub mod sanitizer;
pub mod telegram;
pub mod verdict;

pub use review_api::*;
pub use sanitizer::Sanitizer;
pub use telegram::{
    BotIdentity, DeliveryError, MessageTransport, TelegramClient, DEFAULT_TELEGRAM_API_URL,
};
pub use verdict::{classify, interpret, InterpretationAnomaly, Verdict};
