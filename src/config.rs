use crate::types::LabelKind;
use config::{Config as Settings, ConfigError, Environment, File};
use serde::Deserialize;
use std::{
    collections::HashMap,
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
};

const ENV_PREFIX: &str = "RATING_ENGINE";
const CONFIG_PATH_VAR: &str = "RATING_ENGINE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "rating-engine.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub page_size: i64,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub reset_on_start: bool,
}

/// Locations of the four artifacts from one training run.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub label: LabelKind,
    pub unigram_vocab: PathBuf,
    pub bigram_vocab: PathBuf,
    pub trigram_vocab: PathBuf,
    pub classifier: PathBuf,
}

impl Config {
    /// Defaults, then the TOML file named by `RATING_ENGINE_CONFIG` (or
    /// `rating-engine.toml` if present), then `RATING_ENGINE_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&file))
    }

    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(file, None)
    }

    /// `vars` replaces the process environment when given.
    fn load_with_env(file: &Path, vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let settings = Settings::builder()
            .set_default("server.bind_addr", "127.0.0.1:5000")?
            .set_default("server.page_size", 100i64)?
            .set_default("server.max_body_bytes", 64i64 * 1024)?
            .set_default("database.path", "reviews.db")?
            .set_default("database.max_connections", 5i64)?
            .set_default("database.reset_on_start", false)?
            .set_default("model.label", "rating")?
            .set_default("model.unigram_vocab", "models/unigram_vocab.json")?
            .set_default("model.bigram_vocab", "models/bigram_vocab.json")?
            .set_default("model.trigram_vocab", "models/trigram_vocab.json")?
            .set_default("model.classifier", "models/classifier.json")?
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.server.page_size <= 0 {
            return Err(ConfigError::Message(format!(
                "server.page_size must be positive, got {}",
                self.server.page_size
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be positive".to_string(),
            ));
        }

        let empty: Vec<&str> = [
            ("model.unigram_vocab", &self.model.unigram_vocab),
            ("model.bigram_vocab", &self.model.bigram_vocab),
            ("model.trigram_vocab", &self.model.trigram_vocab),
            ("model.classifier", &self.model.classifier),
        ]
        .into_iter()
        .filter(|(_, path)| path.as_os_str().is_empty())
        .map(|(key, _)| key)
        .collect();

        if !empty.is_empty() {
            return Err(ConfigError::Message(format!(
                "model artifact paths not set: {}",
                empty.join(", ")
            )));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind_addr.parse().map_err(|e| {
            ConfigError::Message(format!(
                "invalid server.bind_addr {:?}: {}",
                self.server.bind_addr, e
            ))
        })
    }
}
