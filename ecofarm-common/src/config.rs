//! Bootstrap configuration and root folder resolution
//!
//! Resolution priority (highest first):
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default
//!
//! A missing TOML file is not an error: the service logs a warning and
//! starts on defaults. A TOML file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ECOFARM_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "ecofarm.db";

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional so that an empty file (or no file) is valid.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Folder holding the database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP listen port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Weather provider section
    #[serde(default)]
    pub weather: ProviderConfig,

    /// Language-model provider section
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Connection settings for an HTTP provider
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Language-model provider settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model identifier sent with each completion request
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Load configuration from `path`
    ///
    /// Missing file → defaults with a warning. Unreadable or unparsable
    /// file → error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Default location of the service TOML file
///
/// `<config_dir>/ecofarm/ecofarm-api.toml`, e.g. `~/.config/ecofarm/ecofarm-api.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ecofarm").join("ecofarm-api.toml"))
}

/// Resolve the root folder following the priority order in the module docs
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// OS-dependent default root folder
///
/// `~/.local/share/ecofarm` on Linux, the platform data dir elsewhere.
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ecofarm"))
        .unwrap_or_else(|| PathBuf::from("./ecofarm_data"))
}

/// Create the root folder if missing and return the database path inside it
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder)?;
        info!("Created root folder {}", root_folder.display());
    }
    Ok(root_folder.join(DATABASE_FILE))
}

/// Where a resolved credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Toml,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Toml => write!(f, "TOML config"),
        }
    }
}

/// Resolve a provider credential: environment variable first, then TOML
///
/// Blank values are treated as absent. Returns `None` when neither tier
/// holds a usable key; callers turn that into a configuration error when
/// the provider is actually used.
pub fn resolve_credential(
    env_var: &str,
    toml_value: Option<&str>,
) -> Option<(String, CredentialSource)> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment.",
            env_var
        );
    }

    if let Some(key) = env_key {
        return Some((key, CredentialSource::Environment));
    }

    toml_key.map(|key| (key.to_string(), CredentialSource::Toml))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
