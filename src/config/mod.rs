// Configuration management module
// TOML settings for the OpenAI-compatible endpoints, retrieval and ingestion

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    API_KEY_ENV, Config, ConfigError, DEFAULT_MAX_CONTENT_CHARS, DEFAULT_SIMILARITY_THRESHOLD,
    IngestionConfig, OpenAiConfig, RetrievalConfig,
};

/// Get the base directory holding config.toml and the document store
#[inline]
pub fn get_base_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_base_dir()
}
