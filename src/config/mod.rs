// Configuration management module
// Settings come from an optional TOML file; credentials come from the environment

pub mod settings;

pub use settings::{Config, ConfigError, OpenAiConfig, SourceConfig, SupabaseConfig};
