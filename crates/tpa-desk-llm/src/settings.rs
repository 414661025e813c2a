//! Generation service settings.

use config::{Config, Environment};
use serde::Deserialize;

use crate::generator::GenerationResult;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the chat-completions client, read from `OPENAI_*` variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeneratorConfig {
    /// Model name (`OPENAI_MODEL`)
    pub model: String,
    /// Bearer key (`OPENAI_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,
    /// API root without trailing path (`OPENAI_BASE_URL`)
    pub base_url: String,
    /// Sampling temperature (`OPENAI_TEMPERATURE`)
    pub temperature: f64,
    /// Per-request timeout (`OPENAI_TIMEOUT_SECS`)
    pub timeout_secs: u64,
}

impl GeneratorConfig {
    /// Load from the process environment.
    pub fn from_env() -> GenerationResult<Self> {
        Self::from_environment(Environment::with_prefix("OPENAI").try_parsing(true))
    }

    pub(crate) fn from_environment(env: Environment) -> GenerationResult<Self> {
        let settings = Config::builder()
            .set_default("model", DEFAULT_MODEL)?
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("temperature", DEFAULT_TEMPERATURE)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("OPENAI")
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_environment(env_from(&[])).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = GeneratorConfig::from_environment(env_from(&[
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TEMPERATURE", "0.5"),
            ("OPENAI_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
