#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::database::postgres::models::DocumentType;
use crate::embeddings::chunking::SplitterConfig;
use crate::embeddings::openai::DEFAULT_EMBEDDING_DIMENSION;

const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
const SUPABASE_SERVICE_KEY_ENV: &str = "SUPABASE_SERVICE_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub splitter: SplitterConfig,
    pub sources: Vec<SourceConfig>,
    pub log_file: PathBuf,
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            splitter: SplitterConfig::default(),
            sources: default_sources(),
            log_file: PathBuf::from("document_processing.log"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_url: String,
    pub embedding_model: String,
    pub embedding_dimension: u32,
    pub chat_model: String,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    #[inline]
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            chat_model: "gpt-4-turbo-preview".to_string(),
            temperature: 0.7,
        }
    }
}

/// One document directory and the type label its rows are tagged with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub dir: PathBuf,
    pub document_type: DocumentType,
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            dir: PathBuf::from("SGS_History"),
            document_type: DocumentType::Historical,
        },
        SourceConfig {
            dir: PathBuf::from("SGS_Docs-Embedding"),
            document_type: DocumentType::Headmaster,
        },
    ]
}

/// Database credentials, environment-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid chunk size: {0} (must be greater than zero)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("No document sources configured")]
    NoSources,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Config {
    #[inline]
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.openai.validate()?;
        self.validate_splitter_config()?;

        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        Ok(())
    }

    fn validate_splitter_config(&self) -> Result<(), ConfigError> {
        let config = &self.splitter;

        if config.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(config.chunk_size));
        }

        if config.chunk_overlap >= config.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                config.chunk_overlap,
                config.chunk_size,
            ));
        }

        Ok(())
    }
}

impl OpenAiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api_url).map_err(|_| ConfigError::InvalidUrl(self.api_url.clone()))?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        if !(64..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        Ok(())
    }
}

impl SupabaseConfig {
    /// Read credentials from the environment. Fails before any other work
    /// when either variable is absent.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        let url =
            env::var(SUPABASE_URL_ENV).map_err(|_| ConfigError::MissingEnv(SUPABASE_URL_ENV))?;
        let service_key = env::var(SUPABASE_SERVICE_KEY_ENV)
            .map_err(|_| ConfigError::MissingEnv(SUPABASE_SERVICE_KEY_ENV))?;

        Ok(Self { url, service_key })
    }
}
