//! Provider configuration resolution for ecofarm-api
//!
//! Credentials resolve ENV → TOML once at startup. A missing key is not a
//! startup failure: the affected client reports a configuration error the
//! first time it is used.

use ecofarm_common::config::{resolve_credential, TomlConfig};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the OpenWeatherMap key
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Environment variable holding the chat-completion gateway key
pub const LLM_API_KEY_ENV: &str = "LOVABLE_API_KEY";

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_LLM_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_LLM_MODEL: &str = "google/gemini-2.5-flash";

const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Weather provider connection settings
#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl WeatherSettings {
    pub fn from_toml(toml_config: &TomlConfig) -> Self {
        let section = &toml_config.weather;
        Self {
            api_key: resolve_logged("Weather", WEATHER_API_KEY_ENV, section.api_key.as_deref()),
            base_url: section
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                section.timeout_secs.unwrap_or(DEFAULT_WEATHER_TIMEOUT_SECS),
            ),
        }
    }
}

/// Chat-completion provider connection settings
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmSettings {
    pub fn from_toml(toml_config: &TomlConfig) -> Self {
        let section = &toml_config.llm;
        Self {
            api_key: resolve_logged("LLM", LLM_API_KEY_ENV, section.api_key.as_deref()),
            base_url: section
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: section
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            timeout: Duration::from_secs(section.timeout_secs.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS)),
        }
    }
}

/// Resolve a credential and log where it came from (never the value)
fn resolve_logged(provider: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    match resolve_credential(env_var, toml_value) {
        Some((key, source)) => {
            info!("{} API key loaded from {}", provider, source);
            Some(key)
        }
        None => {
            warn!(
                "{} API key not configured. Set {} or the TOML api_key; requests needing it will fail",
                provider, env_var
            );
            None
        }
    }
}
