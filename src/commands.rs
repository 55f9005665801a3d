use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

use crate::chat::terminal::run_chat;
use crate::chat::{AnswerSource, ChatEngine, Retrieval};
use crate::config::Config;
use crate::database::{Collection, Database};
use crate::ingest::{CURATED_RESOURCES, IngestReport, IngestionPipeline, ItemOutcome, truncate_chars};
use crate::openai::OpenAiClient;
use crate::search::SearchOutcome;
use crate::{ChatError, Result};

const PREVIEW_CHARS: usize = 160;

async fn open_store(config: &Config) -> Result<Database> {
    Database::initialize_from_base_dir(config.get_base_dir())
        .await
        .map_err(|e| ChatError::Database(format!("{:#}", e)))
}

async fn build_engine(config: &Config) -> Result<ChatEngine> {
    let client = OpenAiClient::from_config(config)?;
    let database = open_store(config).await?;
    Ok(ChatEngine::new(database, client, &config.retrieval))
}

async fn build_pipeline(config: &Config) -> Result<IngestionPipeline> {
    let client = OpenAiClient::from_config(config)?;
    let database = open_store(config).await?;
    Ok(IngestionPipeline::new(database, client, &config.ingestion))
}

fn preview(content: &str) -> String {
    let flattened = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = truncate_chars(&flattened, PREVIEW_CHARS);
    if cut.len() < flattened.len() {
        format!("{}…", cut)
    } else {
        cut.to_string()
    }
}

fn print_report(kind: &str, report: &IngestReport) {
    for item in &report.items {
        match &item.outcome {
            ItemOutcome::Stored { .. } => println!("   ✅ {}", item.name),
            ItemOutcome::Skipped(reason) => println!("   ⚠️  {} ({})", item.name, reason),
        }
    }
    println!();
    println!(
        "{}: {} processed, {} stored, {} skipped",
        kind, report.processed, report.stored, report.skipped
    );
}

/// Extract, embed and store every document in `dir` (or the configured directory)
#[inline]
pub async fn ingest_documents(config: &Config, dir: Option<PathBuf>) -> Result<IngestReport> {
    let dir = dir.unwrap_or_else(|| config.documents_dir());
    let pipeline = build_pipeline(config).await?;

    println!("📂 Ingesting documents from {}", dir.display());
    let report = pipeline.ingest_directory(&dir).await?;
    print_report("Documents", &report);

    Ok(report)
}

/// Embed and store the curated resource list
#[inline]
pub async fn ingest_resources(config: &Config) -> Result<IngestReport> {
    let pipeline = build_pipeline(config).await?;

    println!("🔗 Ingesting {} curated resources", CURATED_RESOURCES.len());
    let report = pipeline.ingest_resources(CURATED_RESOURCES).await;
    print_report("Resources", &report);

    Ok(report)
}

/// Start the interactive chat
#[inline]
pub async fn start_chat(config: &Config) -> Result<()> {
    let engine = build_engine(config).await?;
    run_chat(engine).await?;
    Ok(())
}

/// Answer a single question and print where the answer came from
#[inline]
pub async fn ask(config: &Config, question: &str) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        return Err(anyhow::anyhow!("Question cannot be empty").into());
    }

    let engine = build_engine(config).await?;
    let answer = engine.answer(question).await;

    println!("{}", answer.text);
    println!();
    match &answer.source {
        AnswerSource::Context { .. } => println!("Source: {}", answer.source),
        AnswerSource::OpenDomain => println!("Source: general knowledge (no stored match)"),
        AnswerSource::Unavailable => println!("Source: none (the answer service did not respond)"),
    }

    Ok(())
}

/// Run only the retrieval step and report the best stored match
#[inline]
pub async fn search(config: &Config, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        return Err(anyhow::anyhow!("Query cannot be empty").into());
    }

    let engine = build_engine(config).await?;
    let threshold = engine.search().threshold();

    let outcome = match engine.retrieve(query).await {
        Retrieval::NoEmbedding(reason) => return Err(ChatError::Embedding(reason)),
        Retrieval::Searched { outcome, .. } => outcome,
    };

    match outcome {
        SearchOutcome::Match(scored) => {
            println!(
                "🔍 Match in {} (similarity {:.3}, threshold {:.2})",
                scored.record.collection, scored.score, threshold
            );
            println!("   ID: {}", scored.record.id);
            if let Some(title) = &scored.record.metadata.title {
                println!("   Title: {}", title);
            }
            if let Some(url) = &scored.record.metadata.url {
                println!("   URL: {}", url);
            }
            if let Some(filename) = &scored.record.metadata.filename {
                println!("   File: {}", filename);
            }
            if let Some(question) = &scored.record.metadata.question {
                println!("   Question: {}", question);
            }
            println!("   {}", preview(&scored.record.content));
        }
        SearchOutcome::NoMatch {
            best_score: Some(score),
        } => {
            println!(
                "No match above {:.2}; best similarity was {:.3}",
                threshold, score
            );
        }
        SearchOutcome::NoMatch { best_score: None } => {
            println!("No comparable records found in the store.");
        }
    }

    Ok(())
}

/// Record counts for every collection
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 rag-chat Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("⚙️  Configuration:");
    println!("   Base directory: {}", config.get_base_dir().display());
    println!("   Embedding model: {}", config.openai.embedding_model);
    println!("   Chat model: {}", config.openai.chat_model);
    println!(
        "   Similarity threshold: {:.2}",
        config.retrieval.similarity_threshold
    );
    match config.api_key() {
        Ok(_) => println!("   ✅ API key: set"),
        Err(e) => println!("   ❌ API key: {}", e),
    }
    println!();

    println!("🗄️  Document Store ({}):", config.store_path().display());
    let database = match open_store(config).await {
        Ok(database) => database,
        Err(e) => {
            println!("   ❌ Failed to open - {}", e);
            return Ok(());
        }
    };

    for collection in Collection::SEARCH_ORDER {
        let stats = database
            .collection_stats(collection)
            .await
            .with_context(|| format!("Failed to count records in {}", collection))?;

        print!(
            "   {:<10} {} records, {} searchable",
            collection.to_string(),
            stats.total,
            stats.searchable
        );
        if stats.malformed() > 0 {
            print!(" ({} without a usable embedding)", stats.malformed());
        }
        println!();
    }

    Ok(())
}

/// Delete every record of one collection
#[inline]
pub async fn clear_collection(config: &Config, collection: Collection) -> Result<u64> {
    let database = open_store(config).await?;
    let deleted = database
        .clear_collection(collection)
        .await
        .map_err(|e| ChatError::Database(format!("{:#}", e)))?;

    info!("Cleared collection {}", collection);
    println!("🗑️  Removed {} records from {}", deleted, collection);

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("one\n\ntwo   three"), "one two three");

        let long = "word ".repeat(100);
        let shown = preview(&long);
        assert!(shown.ends_with('…'));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 1);
    }
}
