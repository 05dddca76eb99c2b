use anyhow::{Context, Result};
use tracing::info;

use homework_bot::config::Config;
use homework_bot::logging::init_logging;
use homework_bot::poll_loop::current_cursor;
use homework_bot::{get_bot_version, LoopSettings, Notifier, PollLoop, TokioSleeper};
use homework_core::{ReviewApiClient, Sanitizer, TelegramClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration from environment")?;

    let _log_guard = init_logging(&config.log_dir)?;

    info!("Starting homework status bot {}", get_bot_version());
    info!("Loaded configuration: {:?}", config);

    let sanitizer = Sanitizer::new(config.secrets());

    let review_api =
        ReviewApiClient::new(config.practicum_token.clone(), config.review_api_url.clone())
            .context("Failed to create review API client")?;

    let telegram = TelegramClient::new(
        config.telegram_token.clone(),
        config.telegram_api_url.clone(),
    )
    .context("Failed to create Telegram client")?;

    let notifier = Notifier::new(
        telegram,
        config.telegram_chat_id.clone(),
        sanitizer.clone(),
    );

    let mut poll_loop = PollLoop::new(
        review_api,
        notifier,
        TokioSleeper,
        LoopSettings::from(&config),
        sanitizer,
    );

    poll_loop.start(current_cursor()).await;
    poll_loop.run().await;

    Ok(())
}
