//! Free-text summarization and trade-suggestion generation.
//!
//! The trait keeps the pipeline testable without network access; the only
//! production implementation calls the OpenAI chat-completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use shared_utils::env::{MissingEnvVarError, get_env_var};
use thiserror::Error;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4";

const SUMMARIZE_SYSTEM: &str = "You are a helpful assistant. You take news content as \
    input and generate a detailed summary. Do not include the original news content in \
    the summary.";

const SUGGEST_SYSTEM: &str = "The user is an intraday trader whose primary strategy is \
    shorting stocks. They will provide summaries of the latest news. If the news carries \
    very strong positive sentiment, list the risks and explain why shorting is not \
    advisable. If there is no news for the day, or the positive sentiment is weak, give \
    the user actionable suggestions.";

/// Produces a summary and a trade suggestion from free text. Best effort:
/// callers degrade to a placeholder suggestion on error.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// A short summary of `text`.
    async fn summarize(&self, text: &str) -> anyhow::Result<String>;

    /// A trade suggestion derived from `text` (typically a summary).
    async fn suggest(&self, text: &str) -> anyhow::Result<String>;
}

/// Failed to construct the OpenAI client.
#[derive(Debug, Error)]
pub enum SummarizerInitError {
    /// The API key environment variable is not set.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`Summarizer`] over the OpenAI chat-completions API.
pub struct OpenAiSummarizer {
    client: Client,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiSummarizer {
    /// Creates the client. Reads the API key from `OPENAI_API_KEY`.
    pub fn new() -> Result<Self, SummarizerInitError> {
        let api_key = SecretString::new(get_env_var("OPENAI_API_KEY")?.into());
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self { client, api_key })
    }

    async fn complete(&self, system: &str, prompt: &str) -> anyhow::Result<String> {
        let body = json!({
            "model": MODEL,
            "messages": [
                {"role": "developer", "content": system},
                {"role": "user", "content": prompt},
            ],
        });

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("chat completion failed ({status}): {text}");
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("chat completion returned no choices"))?;
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str) -> anyhow::Result<String> {
        let prompt = format!("Generate a short summary of the following news content:\n\n{text}");
        self.complete(SUMMARIZE_SYSTEM, &prompt).await
    }

    async fn suggest(&self, text: &str) -> anyhow::Result<String> {
        let prompt =
            format!("Generate a short suggestion based on the following news content:\n\n{text}");
        self.complete(SUGGEST_SYSTEM, &prompt).await
    }
}
