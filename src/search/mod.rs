// Similarity search over the stored collections
// A full linear scan: every record of every configured collection is scored
// against the query and the single best one is kept.


pub mod similarity;

pub use similarity::cosine_similarity;

use tracing::{debug, info, warn};

use crate::config::RetrievalConfig;
use crate::database::{Collection, Database, EmbeddingRecord};

/// A record together with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: EmbeddingRecord,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Best record, scoring strictly above the threshold
    Match(ScoredRecord),
    /// Nothing cleared the threshold; carries the best score seen, if any record was comparable
    NoMatch { best_score: Option<f32> },
}

impl SearchOutcome {
    #[inline]
    pub fn as_match(&self) -> Option<&ScoredRecord> {
        match self {
            SearchOutcome::Match(scored) => Some(scored),
            SearchOutcome::NoMatch { .. } => None,
        }
    }

    #[inline]
    pub fn best_score(&self) -> Option<f32> {
        match self {
            SearchOutcome::Match(scored) => Some(scored.score),
            SearchOutcome::NoMatch { best_score } => *best_score,
        }
    }
}

/// Running arg-max over candidates in scan order
///
/// Only a strictly greater score replaces the current best, so the first
/// record seen wins a tie.
#[derive(Debug)]
pub struct BestMatch<'q> {
    query: &'q [f32],
    best: Option<ScoredRecord>,
    considered: usize,
    incomparable: usize,
}

impl<'q> BestMatch<'q> {
    #[inline]
    pub fn new(query: &'q [f32]) -> Self {
        Self {
            query,
            best: None,
            considered: 0,
            incomparable: 0,
        }
    }

    #[inline]
    pub fn consider(&mut self, record: EmbeddingRecord) {
        let Some(score) = cosine_similarity(self.query, &record.embedding) else {
            self.incomparable += 1;
            return;
        };
        self.considered += 1;

        if self.best.as_ref().is_none_or(|best| score > best.score) {
            self.best = Some(ScoredRecord { record, score });
        }
    }

    /// Records that produced a score
    #[inline]
    pub fn considered(&self) -> usize {
        self.considered
    }

    /// Records skipped for a dimension mismatch or degenerate vector
    #[inline]
    pub fn incomparable(&self) -> usize {
        self.incomparable
    }

    #[inline]
    pub fn into_best(self) -> Option<ScoredRecord> {
        self.best
    }
}

/// Highest-scoring candidate in iteration order, ties to the earliest
#[inline]
pub fn best_match<I>(query: &[f32], candidates: I) -> Option<ScoredRecord>
where
    I: IntoIterator<Item = EmbeddingRecord>,
{
    let mut tracker = BestMatch::new(query);
    for record in candidates {
        tracker.consider(record);
    }
    tracker.into_best()
}

/// Keep the best candidate only if it scores strictly above `threshold`
#[inline]
pub fn apply_threshold(best: Option<ScoredRecord>, threshold: f32) -> SearchOutcome {
    match best {
        Some(scored) if scored.score > threshold => SearchOutcome::Match(scored),
        Some(scored) => SearchOutcome::NoMatch {
            best_score: Some(scored.score),
        },
        None => SearchOutcome::NoMatch { best_score: None },
    }
}

/// Retrieval over an ordered list of collections in the store
#[derive(Debug, Clone)]
pub struct SimilaritySearch {
    database: Database,
    collections: Vec<Collection>,
    threshold: f32,
}

impl SimilaritySearch {
    #[inline]
    pub fn new(database: Database, config: &RetrievalConfig) -> Self {
        Self {
            database,
            collections: config.collections.clone(),
            threshold: config.similarity_threshold,
        }
    }

    #[inline]
    pub fn with_collections(mut self, collections: Vec<Collection>) -> Self {
        self.collections = collections;
        self
    }

    #[inline]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[inline]
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Scan every collection in order and return the global best match
    ///
    /// A collection that cannot be read is logged and skipped.
    #[inline]
    pub async fn search(&self, query: &[f32]) -> SearchOutcome {
        let mut tracker = BestMatch::new(query);

        for &collection in &self.collections {
            match self.database.fetch_collection(collection).await {
                Ok(scan) => {
                    debug!(
                        "Scanning {} records in {} ({} without usable embeddings)",
                        scan.records.len(),
                        collection,
                        scan.skipped
                    );
                    for record in scan.records {
                        tracker.consider(record);
                    }
                }
                Err(e) => {
                    warn!("Skipping collection {}: {:#}", collection, e);
                }
            }
        }

        if tracker.incomparable() > 0 {
            debug!(
                "{} records had embeddings incompatible with the {}-dimensional query",
                tracker.incomparable(),
                query.len()
            );
        }

        let outcome = apply_threshold(tracker.into_best(), self.threshold);
        match &outcome {
            SearchOutcome::Match(scored) => info!(
                "Found relevant record in {} (similarity {:.3})",
                scored.record.collection, scored.score
            ),
            SearchOutcome::NoMatch { best_score } => info!(
                "No relevant record above {:.2}; best score {}",
                self.threshold,
                best_score.map_or_else(|| "n/a".to_string(), |s| format!("{:.3}", s))
            ),
        }

        outcome
    }
}
