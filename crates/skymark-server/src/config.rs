//! Server configuration.

use anyhow::Result;
use serde::Deserialize;
use skymark_core::{ChatSettings, DEFAULT_BASE_URL};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    /// Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_chat_model")]
    pub default_chat_model: String,
    #[serde(default = "default_fine_tune_model")]
    pub default_fine_tune_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./dist")
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skymark")
        .join("skymark.db")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_fine_tune_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            db_path: default_db_path(),
            openai_base_url: default_base_url(),
            openai_api_key: None,
            default_chat_model: default_chat_model(),
            default_fine_tune_model: default_fine_tune_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// API key from the config file, else from the environment.
    pub fn api_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            default_model: self.default_chat_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.default_chat_model, "gpt-4o");
        assert_eq!(config.default_fine_tune_model, "gpt-3.5-turbo");
        assert_eq!(config.openai_base_url, DEFAULT_BASE_URL);
        assert!(config.db_path.ends_with("skymark/skymark.db"));
    }

    #[test]
    fn test_partial_override() {
        let config = Config::parse(
            r#"
            port = 8081
            openai_api_key = "sk-test"
            temperature = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.api_key().as_deref(), Some("sk-test"));
        assert_eq!(config.chat_settings().temperature, 0.2);
        assert_eq!(config.chat_settings().max_tokens, 1000);
    }

    #[test]
    fn test_unknown_types_rejected() {
        assert!(Config::parse("port = \"not a port\"").is_err());
    }
}
