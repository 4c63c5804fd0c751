//! Top-level application configuration.
//!
//! Configuration is stored in `<config dir>/mailboard/config.yaml` and
//! includes:
//! - API base URL and request timeout
//! - Cache staleness, retention and retry settings
//! - List page size and search debounce
//!
//! Every key is optional. `MAILBOARD_CONFIG` overrides the file location
//! and `MAILBOARD_API_URL` overrides `api.base_url`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::cache::CacheOptions;
use crate::error::{MailboardError, Result};
use crate::remote::RetryPolicy;
use crate::remote::http::parse_base_url;
use crate::utils::write_atomic;

pub const CONFIG_ENV: &str = "MAILBOARD_CONFIG";
pub const API_URL_ENV: &str = "MAILBOARD_API_URL";
pub const SESSION_ENV: &str = "MAILBOARD_SESSION";

const DEFAULT_BASE_URL: &str = "https://email-list-api-3.onrender.com";

/// Keys accepted by `config get` and `config set`.
pub const KEYS: &[&str] = &[
    "api.base_url",
    "api.timeout_secs",
    "cache.stale_time_secs",
    "cache.gc_time_secs",
    "cache.max_retries",
    "cache.retry_base_delay_ms",
    "cache.retry_max_delay_ms",
    "list.page_size",
    "list.search_debounce_ms",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub list: ListConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,
    #[serde(default = "default_gc_time_secs")]
    pub gc_time_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_stale_time_secs() -> u64 {
    300
}

fn default_gc_time_secs() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time_secs(),
            gc_time_secs: default_gc_time_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

fn default_page_size() -> u32 {
    10
}

fn default_search_debounce_ms() -> u64 {
    300
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "mailboard").ok_or_else(|| {
        MailboardError::Config("could not determine a home directory".to_string())
    })
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }
        Ok(project_dirs()?.config_dir().join("config.yaml"))
    }

    /// Path of the persisted session, next to the config file unless
    /// `MAILBOARD_SESSION` says otherwise.
    pub fn session_path() -> Result<PathBuf> {
        if let Ok(path) = env::var(SESSION_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }
        let config = Self::config_path()?;
        Ok(config
            .parent()
            .map_or_else(|| PathBuf::from("session.json"), |p| p.join("session.json")))
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            MailboardError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = serde_yaml_ng::to_string(self)?;
        write_atomic(path, &content)?;

        // Set restrictive permissions on Unix (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions).map_err(|e| {
                MailboardError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to set permissions on config at {}: {}", path.display(), e),
                ))
            })?;
        }

        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.list.page_size == 0 {
            return Err(MailboardError::Config(
                "list.page_size must be greater than zero".to_string(),
            ));
        }
        parse_base_url(&self.api.base_url)?;
        Ok(())
    }

    /// API base URL, honoring `MAILBOARD_API_URL`.
    pub fn base_url(&self) -> String {
        match env::var(API_URL_ENV) {
            Ok(url) if !url.is_empty() => url,
            _ => self.api.base_url.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.list.search_debounce_ms)
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            stale_time: Duration::from_secs(self.cache.stale_time_secs),
            gc_time: Duration::from_secs(self.cache.gc_time_secs),
            retry: RetryPolicy {
                max_retries: self.cache.max_retries,
                base_delay: Duration::from_millis(self.cache.retry_base_delay_ms),
                max_delay: Duration::from_millis(self.cache.retry_max_delay_ms),
            },
        }
    }

    /// Read one key as a string.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "api.base_url" => self.api.base_url.clone(),
            "api.timeout_secs" => self.api.timeout_secs.to_string(),
            "cache.stale_time_secs" => self.cache.stale_time_secs.to_string(),
            "cache.gc_time_secs" => self.cache.gc_time_secs.to_string(),
            "cache.max_retries" => self.cache.max_retries.to_string(),
            "cache.retry_base_delay_ms" => self.cache.retry_base_delay_ms.to_string(),
            "cache.retry_max_delay_ms" => self.cache.retry_max_delay_ms.to_string(),
            "list.page_size" => self.list.page_size.to_string(),
            "list.search_debounce_ms" => self.list.search_debounce_ms.to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set one key from its string form. The result is validated before
    /// it is accepted.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "api.base_url" => next.api.base_url = value.trim().to_string(),
            "api.timeout_secs" => next.api.timeout_secs = parse_number(key, value)?,
            "cache.stale_time_secs" => next.cache.stale_time_secs = parse_number(key, value)?,
            "cache.gc_time_secs" => next.cache.gc_time_secs = parse_number(key, value)?,
            "cache.max_retries" => next.cache.max_retries = parse_number(key, value)?,
            "cache.retry_base_delay_ms" => {
                next.cache.retry_base_delay_ms = parse_number(key, value)?
            }
            "cache.retry_max_delay_ms" => next.cache.retry_max_delay_ms = parse_number(key, value)?,
            "list.page_size" => next.list.page_size = parse_number(key, value)?,
            "list.search_debounce_ms" => next.list.search_debounce_ms = parse_number(key, value)?,
            _ => return Err(unknown_key(key)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn unknown_key(key: &str) -> MailboardError {
    MailboardError::Config(format!(
        "unknown key '{key}' (expected one of: {})",
        KEYS.join(", ")
    ))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MailboardError::Config(format!("invalid value '{value}' for '{key}'")))
}
