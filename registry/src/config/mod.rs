//! Configuration management
//!
//! Configuration is stored in TOML format at ~/.confreg/config.toml, or at
//! the path given with `--config`. A missing file is created with defaults.
//!
//! # Configuration Sections
//!
//! - **core**: log level, data directory
//! - **accounts**: whether the built-in test accounts are seeded
//! - **policy**: opt-in state-machine guards
//! - **notifications**: how long notices stay visible
//!
//! Every section may be omitted; missing keys fall back to their defaults.
//!
//! # Examples
//!
//! ```no_run
//! use conference_registry::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Data directory: {:?}", config.core.data_dir);
//! # Ok(())
//! # }
//! ```

use sdk::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::Policy;

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub accounts: AccountsConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where the registry snapshot and active identity live (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Seed the admin, participant and reviewer test accounts on first run
    #[serde(default = "default_true")]
    pub seed_test_accounts: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Papers may only leave UnderReview and meetings only leave Pending
    #[serde(default)]
    pub strict_transitions: bool,

    /// Reject a second review of the same paper by the same reviewer
    #[serde(default)]
    pub one_review_per_reviewer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_dismiss_after_ms")]
    pub dismiss_after_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.confreg/data")
}

fn default_true() -> bool {
    true
}

fn default_dismiss_after_ms() -> u64 {
    3000
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            seed_test_accounts: true,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: default_dismiss_after_ms(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.confreg/config.toml)
    ///
    /// Creates the file with defaults when it does not exist.
    pub fn load_or_create() -> Result<Self, RegistryError> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create_at(&config_path)
    }

    /// Load configuration from `path`, creating it with defaults if missing
    pub fn load_or_create_at(path: &Path) -> Result<Self, RegistryError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Self::create_default(path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| RegistryError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    fn create_default(path: &Path) -> Result<Self, RegistryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RegistryError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Written before validation so the file keeps the unexpanded ~ path
        let toml_string = toml::to_string_pretty(&Self::default())
            .map_err(|e| RegistryError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| RegistryError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = Self::default();
        config.validate_and_process()?;
        Ok(config)
    }

    fn default_config_path() -> Result<PathBuf, RegistryError> {
        let home = dirs::home_dir().ok_or_else(|| {
            RegistryError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".confreg").join("config.toml"))
    }

    /// Validate values, expand `~` in the data directory and create it
    fn validate_and_process(&mut self) -> Result<(), RegistryError> {
        if !VALID_LOG_LEVELS.contains(&self.core.log_level.as_str()) {
            return Err(RegistryError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.notifications.dismiss_after_ms == 0 {
            return Err(RegistryError::Config(
                "dismiss_after_ms must be greater than 0".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                RegistryError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }

    pub fn policy(&self) -> Policy {
        Policy {
            strict_transitions: self.policy.strict_transitions,
            one_review_per_reviewer: self.policy.one_review_per_reviewer,
        }
    }

    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.notifications.dismiss_after_ms)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.core.data_dir.join("registry.json")
    }

    pub fn identity_path(&self) -> PathBuf {
        self.core.data_dir.join("identity.json")
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, RegistryError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| RegistryError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| {
            RegistryError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| RegistryError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
