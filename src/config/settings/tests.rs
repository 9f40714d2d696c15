use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.splitter.chunk_size, 1000);
    assert_eq!(config.splitter.chunk_overlap, 200);
    assert_eq!(config.openai.embedding_dimension, 1536);
}

#[test]
fn default_sources_cover_both_directories() {
    let config = Config::default();
    assert_eq!(config.sources.len(), 2);
    assert_eq!(config.sources[0].dir, PathBuf::from("SGS_History"));
    assert_eq!(config.sources[0].document_type, DocumentType::Historical);
    assert_eq!(config.sources[1].dir, PathBuf::from("SGS_Docs-Embedding"));
    assert_eq!(config.sources[1].document_type, DocumentType::Headmaster);
}

#[test]
fn load_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let config =
        Config::load(temp_dir.path().join("nonexistent.toml")).expect("load should succeed");
    assert_eq!(config, Config::default());
}

#[test]
fn load_parses_overrides() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let config_path = temp_dir.path().join("rag.toml");
    fs::write(
        &config_path,
        r#"
log_file = "ingest.log"

[openai]
chat_model = "gpt-4o"
temperature = 0.2

[splitter]
chunk_size = 800
chunk_overlap = 100

[[sources]]
dir = "archive"
document_type = "historical"
"#,
    )
    .expect("can write config file");

    let config = Config::load(&config_path).expect("load should succeed");
    assert_eq!(config.openai.chat_model, "gpt-4o");
    assert_eq!(config.openai.temperature, 0.2);
    assert_eq!(config.splitter.chunk_size, 800);
    assert_eq!(config.splitter.chunk_overlap, 100);
    assert_eq!(config.sources.len(), 1);
    assert_eq!(config.sources[0].dir, PathBuf::from("archive"));
    assert_eq!(config.log_file, PathBuf::from("ingest.log"));
    // unspecified fields fall back to defaults
    assert_eq!(config.openai.embedding_model, "text-embedding-ada-002");
}

#[test]
fn load_rejects_invalid_settings() {
    let temp_dir = TempDir::new().expect("can create temp dir");
    let config_path = temp_dir.path().join("rag.toml");
    fs::write(
        &config_path,
        r#"
[splitter]
chunk_size = 100
chunk_overlap = 100
"#,
    )
    .expect("can write config file");

    assert!(Config::load(&config_path).is_err());
}

#[test]
fn overlap_must_be_smaller_than_chunk_size() {
    let mut config = Config::default();
    config.splitter.chunk_overlap = config.splitter.chunk_size;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::OverlapTooLarge(_, _))
    ));
}

#[test]
fn zero_chunk_size_is_rejected() {
    let mut config = Config::default();
    config.splitter.chunk_size = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(0))
    ));
}

#[test]
fn temperature_out_of_range_is_rejected() {
    let mut config = Config::default();
    config.openai.temperature = 3.0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTemperature(_))
    ));
}

#[test]
fn empty_model_name_is_rejected() {
    let mut config = Config::default();
    config.openai.chat_model = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));
}

#[test]
fn empty_sources_are_rejected() {
    let mut config = Config::default();
    config.sources.clear();
    assert!(matches!(config.validate(), Err(ConfigError::NoSources)));
}

#[test]
#[serial]
fn supabase_config_from_env() {
    // SAFETY: env mutation is confined to #[serial] tests
    unsafe {
        env::set_var(SUPABASE_URL_ENV, "postgres://postgres@db.example.co:5432/postgres");
        env::set_var(SUPABASE_SERVICE_KEY_ENV, "service-key");
    }

    let supabase = SupabaseConfig::from_env().expect("credentials are set");
    assert_eq!(supabase.url, "postgres://postgres@db.example.co:5432/postgres");
    assert_eq!(supabase.service_key, "service-key");
}

#[test]
#[serial]
fn missing_credentials_raise_config_error() {
    // SAFETY: env mutation is confined to #[serial] tests
    unsafe {
        env::remove_var(SUPABASE_URL_ENV);
        env::remove_var(SUPABASE_SERVICE_KEY_ENV);
    }

    assert!(matches!(
        SupabaseConfig::from_env(),
        Err(ConfigError::MissingEnv(SUPABASE_URL_ENV))
    ));
}
