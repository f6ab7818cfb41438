//! Configuration management
//!
//! `NexusConfig` is read from a TOML file. Every section has defaults, so a missing or
//! empty file behaves like the default configuration:
//!
//! ```toml
//! [storage]
//! data_dir = "~/.nexus/data"
//! users_key = "nexus_all_users"
//! session_key = "nexus_current_user"
//!
//! [search]
//! endpoints = ["https://search.leptons.xyz/api.php", "https://search.iblog.gg/api.php"]
//! user_agent = "nexus/0.1"
//! # timeout_seconds = 30
//! ```

use crate::error::{ErrorContext, NexusError, NexusResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Primary LibreX instance
pub const PRIMARY_SEARCH_ENDPOINT: &str = "https://search.leptons.xyz/api.php";
/// Instance queried when the primary answers with a non-success status
pub const FALLBACK_SEARCH_ENDPOINT: &str = "https://search.iblog.gg/api.php";

pub const DEFAULT_USERS_KEY: &str = "nexus_all_users";
pub const DEFAULT_SESSION_KEY: &str = "nexus_current_user";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NexusConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Where the session store keeps its slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the file-backed key-value store. `~` expands to the home directory.
    pub data_dir: String,
    /// Slot holding the JSON list of all users
    pub users_key: String,
    /// Slot holding the current session user
    pub session_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.nexus/data".to_string(),
            users_key: DEFAULT_USERS_KEY.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    /// `data_dir` with a leading `~` replaced by the home directory
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }
}

/// Search API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Endpoints tried in order
    pub endpoints: Vec<String>,
    pub user_agent: String,
    /// Per-request timeout. Unset means requests never time out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                PRIMARY_SEARCH_ENDPOINT.to_string(),
                FALLBACK_SEARCH_ENDPOINT.to_string(),
            ],
            user_agent: format!("nexus/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: None,
        }
    }
}

impl NexusConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> NexusResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NexusError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> NexusResult<Self> {
        toml::from_str(content).map_err(|e| NexusError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> NexusResult<String> {
        toml::to_string_pretty(self).map_err(|e| NexusError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })
    }

    /// Save configuration to a file, creating parent directories as needed
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> NexusResult<()> {
        let path = path.as_ref();
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| NexusError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> NexusResult<()> {
        let storage = &self.storage;

        if storage.users_key.trim().is_empty() || storage.session_key.trim().is_empty() {
            return Err(NexusError::Config {
                message: "Storage keys must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set storage.users_key and storage.session_key"),
            });
        }

        if storage.users_key == storage.session_key {
            return Err(NexusError::Config {
                message: format!(
                    "Storage keys must be distinct, both are '{}'",
                    storage.users_key
                ),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use different names for users_key and session_key"),
            });
        }

        if self.search.endpoints.is_empty() {
            return Err(NexusError::Config {
                message: "At least one search endpoint must be configured".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Add an entry to search.endpoints"),
            });
        }

        for endpoint in &self.search.endpoints {
            let parsed = url::Url::parse(endpoint).map_err(|e| NexusError::Config {
                message: format!("Invalid search endpoint '{}': {}", endpoint, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_metadata("endpoint", endpoint),
            })?;

            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(NexusError::Config {
                    message: format!(
                        "Search endpoint '{}' must use http or https, not {}",
                        endpoint,
                        parsed.scheme()
                    ),
                    source: None,
                    context: ErrorContext::new("config")
                        .with_operation("validate")
                        .with_metadata("endpoint", endpoint),
                });
            }
        }

        Ok(())
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
