
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};
use std::time::Duration;

use super::{Config, ConfigError, IngestionConfig, OpenAiConfig, RetrievalConfig};
use crate::openai::OpenAiClient;

#[inline]
pub fn run_interactive_config(base_dir: &std::path::Path) -> Result<()> {
    eprintln!("{}", style("🔧 rag-chat Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(base_dir);

    eprintln!("{}", style("Model Service").bold().yellow());
    eprintln!("Configure the OpenAI-compatible service used for embeddings and answers.");
    eprintln!();
    configure_openai(&mut config.openai)?;

    eprintln!();
    eprintln!("{}", style("Retrieval").bold().yellow());
    configure_retrieval(&mut config.retrieval)?;

    eprintln!();
    eprintln!("{}", style("Ingestion").bold().yellow());
    configure_ingestion(&mut config.ingestion)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    match config.api_key() {
        Ok(api_key) => {
            if test_embedding_service(&config.openai, api_key) {
                eprintln!("{}", style("✓ Embedding service reachable!").green());
            } else {
                eprintln!(
                    "{}",
                    style("⚠ Warning: Could not get an embedding from the service").yellow()
                );
                eprintln!("You can continue, but check the URL and key before ingesting.");
            }
        }
        Err(e) => eprintln!("{}", style(format!("⚠ Warning: {}", e)).yellow()),
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(base_dir: &std::path::Path) -> Result<()> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Model Service:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.openai.base_url).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.openai.embedding_model).cyan()
    );
    eprintln!("  Chat Model: {}", style(&config.openai.chat_model).cyan());
    eprintln!("  Temperature: {}", style(config.openai.temperature).cyan());
    eprintln!("  Timeout: {}s", style(config.openai.timeout_seconds).cyan());
    match config.api_key() {
        Ok(key) => eprintln!("  API Key: {}", style(mask_api_key(&key)).cyan()),
        Err(_) => eprintln!("  API Key: {}", style("not set").red()),
    }

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!(
        "  Similarity Threshold: {}",
        style(config.retrieval.similarity_threshold).cyan()
    );
    let order: Vec<String> = config
        .retrieval
        .collections
        .iter()
        .map(ToString::to_string)
        .collect();
    eprintln!("  Search Order: {}", style(order.join(" → ")).cyan());

    eprintln!();
    eprintln!("{}", style("Ingestion:").bold().yellow());
    eprintln!(
        "  Max Content Chars: {}",
        style(config.ingestion.max_content_chars).cyan()
    );
    eprintln!(
        "  Documents Dir: {}",
        style(config.documents_dir().display()).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );
    eprintln!("Store: {}", style(config.store_path().display()).dim());

    Ok(())
}

/// Keep the first and last four characters of a key, hide the rest
pub(crate) fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

fn load_existing_config(base_dir: &std::path::Path) -> Config {
    Config::load(base_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Config::with_base_dir(base_dir)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(openai.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OpenAiConfig {
                base_url: input.clone(),
                ..OpenAiConfig::default()
            };
            temp_config.api_url()?;
            Ok(())
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Sampling temperature")
        .default(openai.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0 and 2")
            }
        })
        .interact_text()?;

    let api_key = Password::new()
        .with_prompt("API key (leave empty to use OPENAI_API_KEY)")
        .allow_empty_password(true)
        .interact()?;

    openai.set_base_url(base_url)?;
    openai.set_embedding_model(embedding_model)?;
    openai.set_chat_model(chat_model)?;
    openai.set_temperature(temperature)?;
    if !api_key.trim().is_empty() {
        openai.api_key = Some(api_key.trim().to_string());
    }

    Ok(())
}

fn configure_retrieval(retrieval: &mut RetrievalConfig) -> Result<()> {
    let threshold: f32 = Input::new()
        .with_prompt("Similarity threshold for using retrieved context")
        .default(retrieval.similarity_threshold)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (-1.0..=1.0).contains(input) {
                Ok(())
            } else {
                Err("Threshold must be between -1 and 1")
            }
        })
        .interact_text()?;

    retrieval.set_similarity_threshold(threshold)?;
    Ok(())
}

fn configure_ingestion(ingestion: &mut IngestionConfig) -> Result<()> {
    let max_content_chars: usize = Input::new()
        .with_prompt("Characters kept per document before embedding")
        .default(ingestion.max_content_chars)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 {
                Err("Budget must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let documents_dir: String = Input::new()
        .with_prompt("Documents directory")
        .default(ingestion.documents_dir.display().to_string())
        .interact_text()?;

    ingestion.set_max_content_chars(max_content_chars)?;
    ingestion.documents_dir = documents_dir.into();
    Ok(())
}

fn test_embedding_service(openai: &OpenAiConfig, api_key: String) -> bool {
    OpenAiClient::new(openai, api_key).is_ok_and(|client| {
        client
            .with_timeout(Duration::from_secs(10))
            .with_retry_attempts(1)
            .embed("connection test")
            .is_available()
    })
}
