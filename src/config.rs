//! Client configuration.
//!
//! Sources, in the order a host usually tries them: a JSON file, the
//! `BACKOFFICE_*` environment variables, or the persisted dashboard session
//! in a [`CredentialStore`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::api::{normalize_base_url, DEFAULT_TIMEOUT};
use crate::branch::BranchContext;
use crate::diagnostics::get_log_dir;
use crate::storage::{CredentialStore, KEY_ACCESS_TOKEN, KEY_BRANCH_ID, KEY_DASHBOARD_URL};
use crate::translatable::DEFAULT_FALLBACK_LANGUAGES;

pub const ENV_API_URL: &str = "BACKOFFICE_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "BACKOFFICE_ACCESS_TOKEN";
pub const ENV_BRANCH_ID: &str = "BACKOFFICE_BRANCH_ID";
pub const ENV_TIMEOUT_SECS: &str = "BACKOFFICE_TIMEOUT_SECS";
pub const ENV_LOG_DIR: &str = "BACKOFFICE_LOG_DIR";
pub const ENV_LOG_JSON: &str = "BACKOFFICE_LOG_JSON";

/// `BACKOFFICE_LOG_DIR` value that turns the file layer off.
const LOG_DIR_OFF: &str = "off";

const DEFAULT_LOG_FILTER: &str = "info,the_small_backoffice=debug";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Logging settings consumed by [`crate::diagnostics::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Enables the daily rolling file layer.
    pub directory: Option<PathBuf>,
    /// Write the file layer as JSON lines.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_FILTER.to_string(),
            directory: None,
            json: false,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub branch_id: Option<i64>,
    #[serde(default = "default_fallback_languages")]
    pub fallback_languages: Vec<String>,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_fallback_languages() -> Vec<String> {
    DEFAULT_FALLBACK_LANGUAGES
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "***"),
            )
            .field("branch_id", &self.branch_id)
            .field("fallback_languages", &self.fallback_languages)
            .field("log", &self.log)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            timeout_secs: default_timeout_secs(),
            access_token: None,
            branch_id: None,
            fallback_languages: default_fallback_languages(),
            log: LogConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_non_empty(ENV_API_URL).ok_or(ConfigError::Missing(ENV_API_URL))?;
        let mut config = Self::new(&base_url);
        config.access_token = env_non_empty(ENV_ACCESS_TOKEN);

        if let Some(raw) = env_non_empty(ENV_BRANCH_ID) {
            config.branch_id = Some(raw.parse().map_err(|_| ConfigError::Invalid {
                key: ENV_BRANCH_ID,
                value: raw.clone(),
            })?);
        }
        if let Some(raw) = env_non_empty(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw.parse().map_err(|_| ConfigError::Invalid {
                key: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
        }
        config.log.directory = match env_non_empty(ENV_LOG_DIR) {
            Some(dir) if dir.eq_ignore_ascii_case(LOG_DIR_OFF) => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => Some(get_log_dir()),
        };
        if let Some(raw) = env_non_empty(ENV_LOG_JSON) {
            config.log.json = matches!(
                raw.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.base_url = normalize_base_url(&config.base_url);
        if config.base_url.is_empty() {
            return Err(ConfigError::Missing("baseUrl"));
        }
        Ok(config)
    }

    /// Build from a persisted dashboard session.
    pub fn from_store(store: &dyn CredentialStore) -> Result<Self, ConfigError> {
        let base_url = store
            .get(KEY_DASHBOARD_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(KEY_DASHBOARD_URL))?;
        let mut config = Self::new(&base_url);
        config.access_token = store.get(KEY_ACCESS_TOKEN).filter(|v| !v.trim().is_empty());
        config.branch_id = store
            .get(KEY_BRANCH_ID)
            .and_then(|v| v.trim().parse().ok());
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    /// Explicit branch wins; otherwise fall back to the token's claims.
    pub fn branch_context(&self) -> BranchContext {
        match self.branch_id {
            Some(id) if id > 0 => BranchContext::for_branch(id),
            _ => BranchContext::resolve(None, self.access_token.as_deref()),
        }
    }

    pub fn fallback_languages(&self) -> Vec<&str> {
        self.fallback_languages.iter().map(String::as_str).collect()
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
