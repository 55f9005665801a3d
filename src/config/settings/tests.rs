use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    assert_eq!(config.openai.embedding_model, "text-embedding-3-small");
    assert_eq!(config.openai.chat_model, "gpt-3.5-turbo");
    assert!((config.openai.temperature - 0.7).abs() < f32::EPSILON);
    assert!((config.retrieval.similarity_threshold - 0.70).abs() < f32::EPSILON);
    assert_eq!(config.ingestion.max_content_chars, 8000);
    assert_eq!(
        config.retrieval.collections,
        vec![Collection::Resources, Collection::Documents, Collection::QaLog]
    );
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.openai.base_url = "ftp://example.com".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.openai.base_url = "not a url".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.openai.chat_model = "  ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.openai.temperature = 2.5;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.openai.timeout_seconds = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.retrieval.similarity_threshold = 1.5;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.retrieval.collections = Vec::new();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::EmptyCollections)
    ));

    let mut invalid_config = config.clone();
    invalid_config.retrieval.collections = vec![Collection::Documents, Collection::Documents];
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::DuplicateCollection(Collection::Documents))
    ));

    let mut invalid_config = config;
    invalid_config.ingestion.max_content_chars = 0;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn api_url_gets_trailing_slash() {
    let config = OpenAiConfig::default();
    let url = config.api_url().expect("should build api url");
    assert_eq!(url.as_str(), "https://api.openai.com/v1/");
    assert_eq!(
        url.join("embeddings").expect("joins").as_str(),
        "https://api.openai.com/v1/embeddings"
    );
}

#[test]
fn api_key_prefers_environment() {
    let mut config = Config::default();
    config.openai.api_key = Some("from-file".to_string());

    let key = config
        .api_key_with_env(Some("from-env".to_string()))
        .expect("key resolves");
    assert_eq!(key, "from-env");

    let key = config.api_key_with_env(None).expect("key resolves");
    assert_eq!(key, "from-file");

    let key = config
        .api_key_with_env(Some(String::new()))
        .expect("blank env value falls back to file");
    assert_eq!(key, "from-file");

    config.openai.api_key = None;
    assert!(matches!(
        config.api_key_with_env(None),
        Err(ConfigError::MissingApiKey)
    ));
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    assert!(!toml_str.contains("api_key"));
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_config_uses_defaults() {
    let partial_toml = r#"
        [retrieval]
        similarity_threshold = 0.8
    "#;

    let config: Config = toml::from_str(partial_toml).expect("partial config parses");
    assert!((config.retrieval.similarity_threshold - 0.8).abs() < f32::EPSILON);
    assert_eq!(config.retrieval.collections, Collection::SEARCH_ORDER.to_vec());
    assert_eq!(config.openai, OpenAiConfig::default());
}

#[test]
fn collections_parse_in_given_order() {
    let toml_str = r#"
        [retrieval]
        collections = ["qa_log", "documents"]
    "#;

    let config: Config = toml::from_str(toml_str).expect("config parses");
    assert_eq!(
        config.retrieval.collections,
        vec![Collection::QaLog, Collection::Documents]
    );
}

#[test]
fn setter_validation() {
    let mut openai = OpenAiConfig::default();
    assert!(openai.set_base_url("http://localhost:8080/v1".to_string()).is_ok());
    assert_eq!(openai.base_url, "http://localhost:8080/v1");
    assert!(openai.set_base_url("gopher://x".to_string()).is_err());
    assert_eq!(openai.base_url, "http://localhost:8080/v1");

    assert!(openai.set_embedding_model(String::new()).is_err());
    assert!(openai.set_chat_model("gpt-4o-mini".to_string()).is_ok());
    assert!(openai.set_temperature(-0.1).is_err());

    let mut retrieval = RetrievalConfig::default();
    assert!(retrieval.set_similarity_threshold(0.5).is_ok());
    assert!(retrieval.set_similarity_threshold(-2.0).is_err());

    let mut ingestion = IngestionConfig::default();
    assert!(ingestion.set_max_content_chars(0).is_err());
    assert!(ingestion.set_max_content_chars(4000).is_ok());
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let mut config = Config::with_base_dir(temp_dir.path());
    config.retrieval.similarity_threshold = 0.75;
    config.ingestion.documents_dir = PathBuf::from("corpus");

    config.save().expect("config saves");
    assert!(temp_dir.path().join("config.toml").exists());

    let loaded = Config::load(temp_dir.path()).expect("config loads");
    assert_eq!(loaded, config);
    assert_eq!(loaded.documents_dir(), temp_dir.path().join("corpus"));
    assert_eq!(loaded.store_path(), temp_dir.path().join("store.db"));
}

#[test]
fn load_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = Config::load(temp_dir.path()).expect("defaults load");
    assert_eq!(config.openai, OpenAiConfig::default());
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[ingestion]\nmax_content_chars = 0\n",
    )
    .expect("writes config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn invalid_toml_handling() {
    let invalid_toml = r#"
        [openai
        base_url = "http://localhost"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
    assert!(result.is_err());
}
