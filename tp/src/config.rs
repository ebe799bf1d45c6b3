//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::splitter::DEFAULT_MAX_TASKS;

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = ".prioritizer.yml";

/// Dotenv file read from the working directory
pub const DOTENV_FILE: &str = ".env";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reasoning engine configuration
    pub llm: LlmConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Input limits for analysis
    pub analysis: AnalysisConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set. Call this early
    /// in startup to fail fast with a clear error message.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key().is_none() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain, then apply environment overrides
    ///
    /// Variables from `./.env` are loaded first so they take part in the
    /// overrides and in the API key lookup.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        load_dotenv(DOTENV_FILE);
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; full loading reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::candidate_paths(config_path)
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn candidate_paths(config_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = config_path {
            return vec![path.clone()];
        }
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("todo-prioritizer").join("prioritizer.yml"));
        }
        paths
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for path in Self::candidate_paths(None) {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// `OPENAI_MODEL` and `FRONTEND_URL` override file values
    pub fn apply_env_overrides(&mut self) {
        if let Some(model) = non_empty_env("OPENAI_MODEL") {
            tracing::debug!(%model, "apply_env_overrides: model from OPENAI_MODEL");
            self.llm.model = model;
        }
        if let Some(url) = non_empty_env("FRONTEND_URL") {
            tracing::debug!(%url, "apply_env_overrides: frontend url from FRONTEND_URL");
            self.server.frontend_url = url;
        }
    }
}

/// Load variables from a dotenv file; already-set variables win
///
/// Returns whether the file was loaded. A missing file is not an error.
pub fn load_dotenv<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "load_dotenv: no file");
        return false;
    }
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::info!("Loaded environment from: {}", path.display());
            true
        }
        Err(e) => {
            tracing::warn!("Failed to load environment from {}: {}", path.display(), e);
            false
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// API key from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        non_empty_env(&self.api_key_env)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 3000,
            temperature: 0.5,
            timeout_ms: 60_000,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub listen: SocketAddr,

    /// Allowed CORS origin
    #[serde(rename = "frontend-url")]
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8000)),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Input limits for analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum tasks per request after parsing
    #[serde(rename = "max-tasks")]
    pub max_tasks: usize,

    /// Maximum characters of raw input accepted by the HTTP API
    #[serde(rename = "max-input-chars")]
    pub max_input_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_tasks: DEFAULT_MAX_TASKS,
            max_input_chars: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.analysis.max_tasks, 50);
        assert_eq!(config.analysis.max_input_chars, 2000);
        assert_eq!(config.server.listen.port(), 8000);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();

        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.base_url, "https://api.openai.com");
        assert_eq!(config.max_tokens, 3000);
        assert_eq!(config.temperature, 0.5);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

llm:
  provider: openai
  model: gpt-4o
  api-key-env: MY_API_KEY
  base-url: https://llm.example.com
  max-tokens: 2000
  temperature: 0.2
  timeout-ms: 30000

server:
  listen: 0.0.0.0:9000
  frontend-url: https://app.example.com

analysis:
  max-tasks: 20
  max-input-chars: 500
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(config.llm.timeout_ms, 30000);
        assert_eq!(config.server.listen.port(), 9000);
        assert_eq!(config.server.frontend_url, "https://app.example.com");
        assert_eq!(config.analysis.max_tasks, 20);
        assert_eq!(config.analysis.max_input_chars, 500);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: gpt-4.1-mini
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.analysis.max_tasks, 50);
        assert_eq!(config.server.frontend_url, "http://localhost:3000");
    }
}
