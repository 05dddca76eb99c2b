pub mod config;
pub mod logging;
pub mod notifier;
pub mod poll_loop;

pub use config::{Config, ConfigError, StartFrom};
pub use notifier::Notifier;
pub use poll_loop::{LoopSettings, LoopState, PollLoop, Sleeper, TokioSleeper};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub fn get_bot_version() -> String {
    // Pinned hash from the release pipeline wins over the one built detected
    let git_hash = option_env!("HOMEWORK_BOT_GIT_HASH").or(built_info::GIT_COMMIT_HASH);

    match git_hash {
        Some(hash) if hash.len() >= 8 => format!("{} ({})", built_info::PKG_VERSION, &hash[..8]),
        Some(hash) => format!("{} ({})", built_info::PKG_VERSION, hash),
        None => built_info::PKG_VERSION.to_string(),
    }
}
