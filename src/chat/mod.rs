// Answer orchestration
// One cycle per question: embed, search the store, ask the chat model with or
// without the matched context, then log the exchange back into the store.


pub mod session;
pub mod terminal;

pub use session::ChatSession;

use tracing::{debug, error, info, warn};

use crate::config::RetrievalConfig;
use crate::database::{Collection, Database, QaPair};
use crate::openai::{ChatMessage, EmbeddingOutcome, OpenAiClient};
use crate::search::{ScoredRecord, SearchOutcome, SimilaritySearch};

pub const SYSTEM_PERSONA: &str = "You are a helpful assistant for SplitSmart.com users.";

/// Shown when the chat model could not be reached; never written to the log
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't get an answer right now.";

pub const GREETING: &str = "Hi! Welcome to Colorado Resilience. How can I help you today?";

/// User message that confines the model to the retrieved content
#[inline]
pub fn context_prompt(content: &str, question: &str) -> String {
    format!(
        "Use only this context to answer:\n\n{}\n\nUser: {}",
        content, question
    )
}

/// Where an answer came from
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSource {
    Context {
        collection: Collection,
        record_id: String,
        score: f32,
    },
    OpenDomain,
    /// The completion call failed and the fallback reply was used
    Unavailable,
}

impl std::fmt::Display for AnswerSource {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerSource::Context {
                collection,
                record_id,
                score,
            } => write!(
                f,
                "{} record {} (similarity {:.2})",
                collection, record_id, score
            ),
            AnswerSource::OpenDomain => write!(f, "general knowledge"),
            AnswerSource::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

/// Result of the retrieval half of a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// The question could not be embedded, so nothing was searched
    NoEmbedding(String),
    Searched {
        embedding: Vec<f32>,
        outcome: SearchOutcome,
    },
}

impl Retrieval {
    #[inline]
    pub fn best_match(&self) -> Option<&ScoredRecord> {
        match self {
            Retrieval::NoEmbedding(_) => None,
            Retrieval::Searched { outcome, .. } => outcome.as_match(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatEngine {
    client: OpenAiClient,
    search: SimilaritySearch,
    database: Database,
}

impl ChatEngine {
    #[inline]
    pub fn new(database: Database, client: OpenAiClient, retrieval: &RetrievalConfig) -> Self {
        Self {
            client,
            search: SimilaritySearch::new(database.clone(), retrieval),
            database,
        }
    }

    #[inline]
    pub fn search(&self) -> &SimilaritySearch {
        &self.search
    }

    /// Embed the question and look for the best stored match
    #[inline]
    pub async fn retrieve(&self, question: &str) -> Retrieval {
        match self.client.embed_async(question.to_string()).await {
            EmbeddingOutcome::Embedded(embedding) => {
                let outcome = self.search.search(&embedding).await;
                Retrieval::Searched { embedding, outcome }
            }
            EmbeddingOutcome::Unavailable(reason) => {
                warn!("Question could not be embedded, answering without context");
                Retrieval::NoEmbedding(reason)
            }
        }
    }

    /// Run one full question/answer cycle
    ///
    /// Never fails: a completion failure yields [`FALLBACK_REPLY`] and a
    /// logging failure is reported but does not affect the answer.
    #[inline]
    pub async fn answer(&self, question: &str) -> Answer {
        let retrieval = self.retrieve(question).await;

        let (messages, source) = match retrieval.best_match() {
            Some(scored) => {
                debug!(
                    "Answering from {} record {}",
                    scored.record.collection, scored.record.id
                );
                (
                    vec![
                        ChatMessage::system(SYSTEM_PERSONA),
                        ChatMessage::user(context_prompt(&scored.record.content, question)),
                    ],
                    AnswerSource::Context {
                        collection: scored.record.collection,
                        record_id: scored.record.id.clone(),
                        score: scored.score,
                    },
                )
            }
            None => (
                vec![
                    ChatMessage::system(SYSTEM_PERSONA),
                    ChatMessage::user(question),
                ],
                AnswerSource::OpenDomain,
            ),
        };

        let text = match self.client.complete_async(messages).await {
            Ok(text) => text,
            Err(e) => {
                error!("Completion failed: {:#}", e);
                // Not logged: a stored apology would be retrievable as context later
                return Answer {
                    text: FALLBACK_REPLY.to_string(),
                    source: AnswerSource::Unavailable,
                };
            }
        };

        let embedding = match retrieval {
            Retrieval::Searched { embedding, .. } => Some(embedding),
            Retrieval::NoEmbedding(_) => None,
        };
        self.log_exchange(question, &text, embedding).await;

        Answer { text, source }
    }

    async fn log_exchange(&self, question: &str, answer: &str, embedding: Option<Vec<f32>>) {
        let pair = QaPair {
            question: question.to_string(),
            answer: answer.to_string(),
        };

        match self.database.insert_qa_pair(&pair, embedding).await {
            Ok(record) => info!("Logged Q&A pair {}", record.id),
            Err(e) => error!("Failed to log Q&A pair: {:#}", e),
        }
    }
}
