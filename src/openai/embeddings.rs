use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::OpenAiClient;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Result of asking the service for an embedding
///
/// A failed call is an ordinary outcome rather than an error: callers skip
/// the item or fall back.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutcome {
    Embedded(Vec<f32>),
    Unavailable(String),
}

impl EmbeddingOutcome {
    #[inline]
    pub fn is_available(&self) -> bool {
        matches!(self, EmbeddingOutcome::Embedded(_))
    }
}

impl OpenAiClient {
    /// Embed one text, logging and absorbing any failure
    #[inline]
    pub fn embed(&self, text: &str) -> EmbeddingOutcome {
        if text.trim().is_empty() {
            warn!("Refusing to embed empty text");
            return EmbeddingOutcome::Unavailable("input text is empty".to_string());
        }

        match self.request_embedding(text) {
            Ok(embedding) => EmbeddingOutcome::Embedded(embedding),
            Err(e) => {
                warn!("Embedding request failed: {:#}", e);
                EmbeddingOutcome::Unavailable(format!("{:#}", e))
            }
        }
    }

    /// [`OpenAiClient::embed`] on the blocking thread pool
    #[inline]
    pub async fn embed_async(&self, text: String) -> EmbeddingOutcome {
        let client = self.clone();
        match tokio::task::spawn_blocking(move || client.embed(&text)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Embedding task failed: {}", e);
                EmbeddingOutcome::Unavailable(format!("embedding task failed: {}", e))
            }
        }
    }

    fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbedRequest {
            model: &self.embedding_model,
            input: text,
        };

        let url = self.endpoint("embeddings")?;
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response_text = self
            .post_json(&url, &request_json)
            .context("Failed to generate embedding")?;

        let response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}
