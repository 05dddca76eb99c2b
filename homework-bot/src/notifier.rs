use homework_core::{BotIdentity, DeliveryError, MessageTransport, Sanitizer};
use tracing::{error, info};

/// Sends text to the single chat configured at startup.
pub struct Notifier<T> {
    transport: T,
    chat_id: String,
    sanitizer: Sanitizer,
}

impl<T: MessageTransport> Notifier<T> {
    pub fn new(transport: T, chat_id: impl Into<String>, sanitizer: Sanitizer) -> Self {
        Self {
            transport,
            chat_id: chat_id.into(),
            sanitizer,
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// One delivery attempt. The failure is logged here and handed back so
    /// the caller can decide how to recover.
    pub async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        info!("Sending message | {}", text);

        match self.transport.send_message(&self.chat_id, text).await {
            Ok(()) => {
                info!("Message delivered to chat {}", self.chat_id);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to deliver message to chat {}: {}",
                    self.chat_id,
                    self.sanitizer.sanitize(&e.to_string())
                );
                Err(e)
            }
        }
    }

    /// Best-effort delivery: failures are logged by `deliver` and dropped.
    pub async fn notify(&self, text: &str) {
        self.deliver(text).await.ok();
    }

    /// Check that the transport accepts our credentials.
    pub async fn verify(&self) -> Result<BotIdentity, DeliveryError> {
        self.transport.get_me().await
    }
}
