use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file searched for in the working directory
pub const CONFIG_FILE_NAME: &str = "registry.toml";

/// Represents the complete configuration for a registry build.
///
/// Contains the data location, build output settings, network limits and behavior options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

fn default_apps_path() -> PathBuf {
    PathBuf::from("apps.toml")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_jobs() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Where the registry data lives.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_apps_path")]
    pub apps: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            apps: default_apps_path(),
        }
    }
}

/// Build output and parallelism.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BuildConfig {
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,

    /// Number of apps processed concurrently
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            output: default_output_dir(),
            jobs: default_jobs(),
        }
    }
}

/// Limits for clones and downloads.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Configuration for behavior customization.
///
/// Decides how the build reacts to apps that fail, without affecting how releases are found.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BehaviorConfig {
    /// Fail the whole build when any single app fails
    #[serde(default = "default_true")]
    pub fail_on_app_error: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            fail_on_app_error: true,
        }
    }
}

impl Config {
    /// Reject settings no build can run with
    pub fn validate(&self) -> Result<()> {
        if self.build.jobs == 0 {
            return Err(RegistryError::config("build.jobs must be at least 1"));
        }
        if self.network.timeout_secs == 0 {
            return Err(RegistryError::config("network.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `registry.toml` in current directory
/// 3. `app-registry/registry.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        PathBuf::from(path)
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else if let Some(config_dir) = dirs::config_dir() {
        let user_config = config_dir.join("app-registry").join(CONFIG_FILE_NAME);
        if user_config.exists() {
            user_config
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path)
        .map_err(|e| RegistryError::config(format!("Cannot read {}: {}", path.display(), e)))?;
    let config: Config = toml::from_str(&config_str)
        .map_err(|e| RegistryError::config(format!("Invalid {}: {}", path.display(), e)))?;
    config.validate()?;

    Ok(config)
}
