use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

const CONFIG_FILE: &str = ".issue-triage.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to load .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),

    #[error("GEMINI_API_KEY not found in environment, .env or .issue-triage.toml")]
    MissingApiKey,
}

/// Top-level configuration loaded from .issue-triage.toml.
///
/// Every field has a default except the AI API key, which must come from
/// the file or the GEMINI_API_KEY environment variable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    /// Requests go out unauthenticated when neither is set.
    pub token: Option<String>,
    /// REST API root, overridable for GitHub Enterprise.
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiConfig {
    /// Gemini API key. GEMINI_API_KEY wins when both are set.
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub primary_model: Option<String>,
    pub fallback_model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Listen address for `serve`, e.g. "0.0.0.0:8080".
    pub bind: Option<String>,
}

impl Config {
    /// Load configuration from .issue-triage.toml in the current directory,
    /// then apply environment overrides. A .env file is honoured if present.
    pub fn load() -> Result<Config, ConfigError> {
        apply_dotenv(dotenvy::dotenv())?;

        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        config.apply_env(|name| std::env::var(name).ok());

        config.validate()?;
        Ok(config)
    }

    /// GEMINI_API_KEY replaces the file's key. GITHUB_TOKEN only fills in a
    /// token the file does not set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if self.github.token.is_none() {
            self.github.token = lookup("GITHUB_TOKEN");
        }
    }

    /// Load from a specific path without touching the environment.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// The process cannot start without an AI key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.ai.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    pub fn github_api_base(&self) -> &str {
        self.github
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_GITHUB_API_BASE)
    }

    pub fn gemini_api_base(&self) -> &str {
        self.ai.api_base.as_deref().unwrap_or(DEFAULT_GEMINI_API_BASE)
    }

    pub fn primary_model(&self) -> &str {
        self.ai
            .primary_model
            .as_deref()
            .unwrap_or(DEFAULT_PRIMARY_MODEL)
    }

    pub fn fallback_model(&self) -> &str {
        self.ai
            .fallback_model
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_MODEL)
    }

    pub fn bind_address(&self) -> &str {
        self.server.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.timeout_seconds)
    }
}

/// A missing .env is fine; a malformed one is an error.
fn apply_dotenv(result: Result<PathBuf, dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env");
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
