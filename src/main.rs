use clap::{Parser, Subcommand};
use rag_chat::Result;
use rag_chat::commands::{
    ask, clear_collection, ingest_documents, ingest_resources, search, show_status, start_chat,
};
use rag_chat::config::{Config, get_base_dir, run_interactive_config, show_config};
use rag_chat::database::Collection;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rag-chat")]
#[command(about = "A chatbot that answers from your own documents, with retrieval over an embedded store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the model service, retrieval and ingestion settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Embed content into the document store
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },
    /// Start an interactive chat session
    Chat,
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,
    },
    /// Show the best stored match for a query without asking the model
    Search {
        /// Text to search for
        query: String,
    },
    /// Show configuration and record counts per collection
    Status,
    /// Delete every record in a collection
    Clear {
        /// Collection to clear: documents, resources or qa_log
        collection: Collection,
    },
}

#[derive(Subcommand)]
enum IngestSource {
    /// Extract and embed the PDF and DOCX files in a directory
    Documents {
        /// Directory to scan (defaults to the configured documents directory)
        dir: Option<PathBuf>,
    },
    /// Embed the curated resource list
    Resources,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the chat transcript on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_dir = get_base_dir()?;

    if let Commands::Config { show } = cli.command {
        if show {
            show_config(&base_dir)?;
        } else {
            run_interactive_config(&base_dir)?;
        }
        return Ok(());
    }

    let config = Config::load(&base_dir)?;

    match cli.command {
        Commands::Config { .. } => {}
        Commands::Ingest { source } => match source {
            IngestSource::Documents { dir } => {
                ingest_documents(&config, dir).await?;
            }
            IngestSource::Resources => {
                ingest_resources(&config).await?;
            }
        },
        Commands::Chat => {
            start_chat(&config).await?;
        }
        Commands::Ask { question } => {
            ask(&config, &question).await?;
        }
        Commands::Search { query } => {
            search(&config, &query).await?;
        }
        Commands::Status => {
            show_status(&config).await?;
        }
        Commands::Clear { collection } => {
            clear_collection(&config, collection).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["rag-chat", "chat"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Chat));
        }
    }

    #[test]
    fn ingest_documents_with_dir() {
        let cli = Cli::try_parse_from(["rag-chat", "ingest", "documents", "./docs"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest {
                source: IngestSource::Documents { dir },
            } = parsed.command
            {
                assert_eq!(dir, Some(PathBuf::from("./docs")));
            } else {
                panic!("expected ingest documents");
            }
        }
    }

    #[test]
    fn ingest_documents_default_dir() {
        let cli = Cli::try_parse_from(["rag-chat", "ingest", "documents"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(
                parsed.command,
                Commands::Ingest {
                    source: IngestSource::Documents { dir: None }
                }
            ));
        }
    }

    #[test]
    fn ingest_resources_command() {
        let cli = Cli::try_parse_from(["rag-chat", "ingest", "resources"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(
                parsed.command,
                Commands::Ingest {
                    source: IngestSource::Resources
                }
            ));
        }
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["rag-chat", "ask", "What is parental alienation?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { question } = parsed.command {
                assert_eq!(question, "What is parental alienation?");
            } else {
                panic!("expected ask");
            }
        }
    }

    #[test]
    fn clear_command_parses_collection() {
        let cli = Cli::try_parse_from(["rag-chat", "clear", "qa_log"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(
                parsed.command,
                Commands::Clear {
                    collection: Collection::QaLog
                }
            ));
        }

        let cli = Cli::try_parse_from(["rag-chat", "clear", "Resources"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn clear_rejects_unknown_collection() {
        let cli = Cli::try_parse_from(["rag-chat", "clear", "sites"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["rag-chat", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["rag-chat", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["rag-chat", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
