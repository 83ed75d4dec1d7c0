//! Operator notification over Telegram.
//!
//! Fire and forget: every send returns a bool and logs failures instead of
//! raising, so a broken notifier can never take the pipeline down with it.

use chrono::Utc;
use chrono_tz::America::New_York;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use shared_utils::env::{MissingEnvVarError, get_env_var};
use thiserror::Error;
use tracing::warn;

/// Failed to construct the notifier.
#[derive(Debug, Error)]
pub enum NotifierInitError {
    /// A required environment variable is not set.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Sends operator messages to a Telegram chat.
pub struct TelegramNotifier {
    client: Client,
    token: SecretString,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates the notifier. Reads `TELEGRAM_BOT_TOKEN` and
    /// `TELEGRAM_CHAT_ID` from the environment.
    pub fn new() -> Result<Self, NotifierInitError> {
        let token = SecretString::new(get_env_var("TELEGRAM_BOT_TOKEN")?.into());
        let chat_id = get_env_var("TELEGRAM_CHAT_ID")?;
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            token,
            chat_id,
        })
    }

    /// Sends a message, prefixed with an Eastern-time stamp. Returns whether
    /// the delivery succeeded; failures are logged, never raised.
    pub async fn send_message(&self, message: &str) -> bool {
        if message.is_empty() {
            return false;
        }

        let stamp = Utc::now()
            .with_timezone(&New_York)
            .format("%Y-%m-%d %H:%M:%S");
        let text = format!("[{stamp} EST]\n{message}");
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.token.expose_secret()
        );

        let result = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let body = response.text().await.unwrap_or_default();
                warn!(body, "telegram send failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "telegram send failed");
                false
            }
        }
    }

    /// Sends `message` marked as an error.
    pub async fn send_error(&self, message: &str) -> bool {
        self.send_message(&format!("❌ Error:\n{message}")).await
    }

    /// Sends `message` marked as a success.
    pub async fn send_success(&self, message: &str) -> bool {
        self.send_message(&format!("✅ Success:\n{message}")).await
    }

    /// Sends `message` marked as a warning.
    pub async fn send_warning(&self, message: &str) -> bool {
        self.send_message(&format!("⚠️ Warning:\n{message}")).await
    }
}
