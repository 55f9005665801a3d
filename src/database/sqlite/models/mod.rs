#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use tracing::debug;

/// Logical grouping of records within the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum Collection {
    /// Text extracted from ingested files
    Documents,
    /// Curated static resource entries
    Resources,
    /// Question/answer pairs from earlier conversations
    QaLog,
}

impl Collection {
    /// Default scan order for retrieval
    pub const SEARCH_ORDER: [Collection; 3] = [
        Collection::Resources,
        Collection::Documents,
        Collection::QaLog,
    ];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Documents => "documents",
            Collection::Resources => "resources",
            Collection::QaLog => "qa_log",
        }
    }
}

impl std::fmt::Display for Collection {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Collection::Documents => write!(f, "Documents"),
            Collection::Resources => write!(f, "Resources"),
            Collection::QaLog => write!(f, "QaLog"),
        }
    }
}

impl FromStr for Collection {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "documents" => Ok(Collection::Documents),
            "resources" => Ok(Collection::Resources),
            "qa_log" | "qalog" => Ok(Collection::QaLog),
            other => Err(format!(
                "unknown collection '{}' (expected documents, resources or qa_log)",
                other
            )),
        }
    }
}

/// Free-form descriptive fields stored beside a record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Row exactly as it sits in the `records` table
///
/// `embedding` and `metadata` are JSON text and are not trusted until
/// [`StoredRecord::into_embedding_record`] has validated them.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StoredRecord {
    pub id: String,
    pub collection: Collection,
    pub content: String,
    pub embedding: Option<String>,
    pub metadata: String,
    pub created_at: NaiveDateTime,
}

/// A record whose embedding has been validated as a non-empty numeric vector
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub id: String,
    pub collection: Collection,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
    pub created_at: NaiveDateTime,
}

/// Values for a record about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub collection: Collection,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
    pub metadata: RecordMetadata,
}

/// A persisted exchange from the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    pub collection: Collection,
    pub total: i64,
    pub searchable: i64,
}

impl StoredRecord {
    /// Validate the row for search; `None` when the embedding is missing or malformed
    #[inline]
    pub fn into_embedding_record(self) -> Option<EmbeddingRecord> {
        let Some(raw) = self.embedding.as_deref() else {
            debug!("Record {} has no embedding", self.id);
            return None;
        };

        let embedding: Vec<f32> = match serde_json::from_str(raw) {
            Ok(embedding) => embedding,
            Err(e) => {
                debug!("Record {} has a malformed embedding: {}", self.id, e);
                return None;
            }
        };

        if embedding.is_empty() || embedding.iter().any(|v| !v.is_finite()) {
            debug!("Record {} has an unusable embedding", self.id);
            return None;
        }

        let metadata = serde_json::from_str(&self.metadata).unwrap_or_else(|e| {
            debug!("Record {} has unreadable metadata: {}", self.id, e);
            RecordMetadata::default()
        });

        Some(EmbeddingRecord {
            id: self.id,
            collection: self.collection,
            content: self.content,
            embedding,
            metadata,
            created_at: self.created_at,
        })
    }
}

impl NewRecord {
    /// Record for the Q&A log; the question's embedding makes it retrievable later
    #[inline]
    pub fn qa_pair(pair: &QaPair, question_embedding: Option<Vec<f32>>) -> Self {
        Self {
            collection: Collection::QaLog,
            content: pair.answer.clone(),
            embedding: question_embedding,
            metadata: RecordMetadata {
                question: Some(pair.question.clone()),
                answer: Some(pair.answer.clone()),
                ..RecordMetadata::default()
            },
        }
    }
}

impl CollectionStats {
    #[inline]
    pub fn malformed(&self) -> i64 {
        self.total - self.searchable
    }
}
