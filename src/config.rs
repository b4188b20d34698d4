use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MedmatchConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cors: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatchingConfig {
    pub max_items: usize,
    pub default_top_k: usize,
    pub tie_tolerance: f64,
    pub norm_epsilon: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4000,
            log_level: "info".into(),
            cors: true,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "text-embedding-ada-002".into(),
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_items: 2048,
            default_top_k: 5,
            tie_tolerance: 1e-9,
            norm_epsilon: 1e-12,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API key with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        if self.api_key.is_empty() {
            return "(not set)".into();
        }
        let tail: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{tail}")
    }
}

/// Returns `~/.medmatch/`, or `./.medmatch` when no home directory is known.
pub fn default_medmatch_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".medmatch")
}

/// Returns the default config file path: `~/.medmatch/config.toml`
pub fn default_config_path() -> PathBuf {
    default_medmatch_dir().join("config.toml")
}

impl MedmatchConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand_tilde(&path.as_ref().to_string_lossy());
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MedmatchConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEDMATCH_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("MEDMATCH_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %val, "ignoring unparsable MEDMATCH_PORT"),
            }
        }
        if let Ok(val) = std::env::var("MEDMATCH_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MEDMATCH_EMBEDDING_URL") {
            self.embedding.base_url = val;
        }
        if let Ok(val) = std::env::var("MEDMATCH_EMBEDDING_MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.embedding.api_key = val;
        }
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.server.port != 0, "server.port must be non-zero");
        anyhow::ensure!(
            self.embedding.timeout_secs > 0,
            "embedding.timeout_secs must be positive"
        );
        anyhow::ensure!(self.matching.max_items > 0, "matching.max_items must be positive");
        anyhow::ensure!(
            self.matching.default_top_k > 0,
            "matching.default_top_k must be positive"
        );
        for (name, value) in [
            ("matching.tie_tolerance", self.matching.tie_tolerance),
            ("matching.norm_epsilon", self.matching.norm_epsilon),
        ] {
            anyhow::ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be a finite, non-negative number (got {value})"
            );
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MedmatchConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.embedding.model, "text-embedding-ada-002");
        assert_eq!(config.matching.default_top_k, 5);
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "127.0.0.1:4000");
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
port = 8088
log_level = "debug"

[embedding]
model = "text-embedding-3-small"
timeout_secs = 5

[matching]
max_items = 10
"#;
        let config: MedmatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.embedding.timeout(), Duration::from_secs(5));
        assert_eq!(config.matching.max_items, 10);
        // defaults still apply for unset fields
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.matching.tie_tolerance, 1e-9);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[matching]\ndefault_top_k = 3\n").unwrap();

        let config = MedmatchConfig::load_from(&path).unwrap();
        assert_eq!(config.matching.default_top_k, 3);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = MedmatchConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.matching.max_items, 2048);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = MedmatchConfig::default();
        config.embedding.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = MedmatchConfig::default();
        config.matching.tie_tolerance = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = MedmatchConfig::default();
        config.matching.default_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn masked_api_key_hides_prefix() {
        let mut embedding = EmbeddingConfig::default();
        assert_eq!(embedding.masked_api_key(), "(not set)");
        embedding.api_key = "sk-test-abcd1234".into();
        assert_eq!(embedding.masked_api_key(), "****1234");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MedmatchConfig::default();
        std::env::set_var("MEDMATCH_PORT", "9123");
        std::env::set_var("MEDMATCH_LOG_LEVEL", "trace");
        std::env::set_var("MEDMATCH_EMBEDDING_URL", "http://127.0.0.1:9999/v1");

        config.apply_env_overrides();

        assert_eq!(config.server.port, 9123);
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.embedding.base_url, "http://127.0.0.1:9999/v1");

        // Clean up
        std::env::remove_var("MEDMATCH_PORT");
        std::env::remove_var("MEDMATCH_LOG_LEVEL");
        std::env::remove_var("MEDMATCH_EMBEDDING_URL");
    }
}
