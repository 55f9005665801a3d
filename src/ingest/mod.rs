// Ingestion pipeline
// Turns documents on disk and the curated resource list into embedded records.
// Every item is independent: a failure skips that item and the run continues.


pub mod resources;

pub use resources::{CURATED_RESOURCES, Resource};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::IngestionConfig;
use crate::database::{Collection, Database, NewRecord, RecordMetadata};
use crate::extract::extract_text;
use crate::openai::{EmbeddingOutcome, OpenAiClient};

/// Why an item produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No text, or only whitespace, after extraction
    EmptyText,
    EmbeddingUnavailable(String),
    StoreFailed(String),
}

impl std::fmt::Display for SkipReason {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyText => write!(f, "no text extracted"),
            SkipReason::EmbeddingUnavailable(reason) => write!(f, "embedding failed: {}", reason),
            SkipReason::StoreFailed(reason) => write!(f, "store write failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Stored { record_id: String },
    Skipped(SkipReason),
}

impl ItemOutcome {
    #[inline]
    pub fn is_stored(&self) -> bool {
        matches!(self, ItemOutcome::Stored { .. })
    }
}

/// Outcome of one ingested file or resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub name: String,
    pub outcome: ItemOutcome,
}

/// Summary of an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub processed: usize,
    pub stored: usize,
    pub skipped: usize,
    pub items: Vec<ItemReport>,
}

impl IngestReport {
    fn record(&mut self, name: String, outcome: ItemOutcome) {
        self.processed += 1;
        if outcome.is_stored() {
            self.stored += 1;
        } else {
            self.skipped += 1;
        }
        self.items.push(ItemReport { name, outcome });
    }
}

/// Cut `text` to at most `max_chars` characters without splitting one
#[inline]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text.get(..byte_index).unwrap_or(text),
        None => text,
    }
}

#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    database: Database,
    client: OpenAiClient,
    max_content_chars: usize,
}

impl IngestionPipeline {
    #[inline]
    pub fn new(database: Database, client: OpenAiClient, config: &IngestionConfig) -> Self {
        Self {
            database,
            client,
            max_content_chars: config.max_content_chars,
        }
    }

    #[inline]
    pub fn with_max_content_chars(mut self, max_content_chars: usize) -> Self {
        self.max_content_chars = max_content_chars;
        self
    }

    /// Ingest every file directly inside `dir`, in file-name order
    ///
    /// Subdirectories are not descended into. Only a failure to list the
    /// directory is an error; per-file problems land in the report.
    #[inline]
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestReport> {
        let files = list_files(dir)?;
        info!("Ingesting {} files from {}", files.len(), dir.display());

        let bar = progress_bar(files.len());
        let mut report = IngestReport::default();

        for path in files {
            let name = file_name(&path);
            bar.set_message(name.clone());

            let outcome = self.ingest_file(&path).await;
            report.record(name, outcome);
            bar.inc(1);
        }

        bar.finish_and_clear();
        info!(
            "Document ingestion finished: {} stored, {} skipped",
            report.stored, report.skipped
        );
        Ok(report)
    }

    /// Extract, embed and store a single document
    #[inline]
    pub async fn ingest_file(&self, path: &Path) -> ItemOutcome {
        let name = file_name(path);
        info!("Processing {}", name);

        let owned_path = path.to_path_buf();
        let text = match tokio::task::spawn_blocking(move || extract_text(&owned_path)).await {
            Ok(text) => text,
            Err(e) => {
                error!("Extraction task for {} failed: {}", name, e);
                String::new()
            }
        };

        let metadata = RecordMetadata {
            filename: Some(name.clone()),
            ..RecordMetadata::default()
        };

        self.ingest_text(Collection::Documents, &name, &text, metadata)
            .await
    }

    /// Embed and store the curated resource list
    #[inline]
    pub async fn ingest_resources(&self, resources: &[Resource]) -> IngestReport {
        info!("Ingesting {} curated resources", resources.len());

        let bar = progress_bar(resources.len());
        let mut report = IngestReport::default();

        for resource in resources {
            bar.set_message(resource.title);

            let metadata = RecordMetadata {
                title: Some(resource.title.to_string()),
                url: Some(resource.url.to_string()),
                ..RecordMetadata::default()
            };
            let outcome = self
                .ingest_text(
                    Collection::Resources,
                    resource.title,
                    resource.content,
                    metadata,
                )
                .await;
            report.record(resource.title.to_string(), outcome);
            bar.inc(1);
        }

        bar.finish_and_clear();
        info!(
            "Resource ingestion finished: {} stored, {} skipped",
            report.stored, report.skipped
        );
        report
    }

    /// Shared tail of every ingestion: skip empty, truncate, embed, append
    #[inline]
    pub async fn ingest_text(
        &self,
        collection: Collection,
        name: &str,
        text: &str,
        metadata: RecordMetadata,
    ) -> ItemOutcome {
        if text.trim().is_empty() {
            warn!("Skipping {} (no text extracted)", name);
            return ItemOutcome::Skipped(SkipReason::EmptyText);
        }

        let content = truncate_chars(text, self.max_content_chars);
        if content.len() < text.len() {
            debug!(
                "Truncated {} to {} characters",
                name, self.max_content_chars
            );
        }

        let embedding = match self.client.embed_async(content.to_string()).await {
            EmbeddingOutcome::Embedded(embedding) => embedding,
            EmbeddingOutcome::Unavailable(reason) => {
                warn!("Skipping {} (embedding failed)", name);
                return ItemOutcome::Skipped(SkipReason::EmbeddingUnavailable(reason));
            }
        };

        let record = NewRecord {
            collection,
            content: content.to_string(),
            embedding: Some(embedding),
            metadata,
        };

        match self.database.insert_record(record).await {
            Ok(stored) => {
                info!("Stored {} in {}", name, collection);
                ItemOutcome::Stored {
                    record_id: stored.id,
                }
            }
            Err(e) => {
                error!("Failed to store {}: {:#}", name, e);
                ItemOutcome::Skipped(SkipReason::StoreFailed(format!("{:#}", e)))
            }
        }
    }
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read documents directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to list documents directory: {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else {
            debug!("Ignoring non-file entry {}", path.display());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn progress_bar(len: usize) -> ProgressBar {
    if console::user_attended_stderr() {
        ProgressBar::new(len as u64).with_style(
            ProgressStyle::with_template("{bar:30} [{pos}/{len}] Ingesting {msg}")
                .expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    }
}
