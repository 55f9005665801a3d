use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Ask the chat model for a reply to `messages`
    #[inline]
    pub fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(
            "Requesting completion from {} with {} messages",
            self.chat_model,
            messages.len()
        );

        let request = CompletionRequest {
            model: &self.chat_model,
            messages,
            temperature: self.temperature,
        };

        let url = self.endpoint("chat/completions")?;
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize completion request")?;

        let response_text = self
            .post_json(&url, &request_json)
            .context("Failed to get completion")?;

        let response: CompletionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse completion response")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("Completion response contained no message"))?;

        debug!("Received completion ({} chars)", content.len());
        Ok(content)
    }

    /// [`OpenAiClient::complete`] on the blocking thread pool
    #[inline]
    pub async fn complete_async(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.complete(&messages))
            .await
            .context("Completion task failed")?
    }
}
