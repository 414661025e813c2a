//! Desk settings.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Desk settings, read from `TPA_*` variables.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DeskConfig {
    /// SQLite file (`TPA_DATABASE_PATH`); records stay in memory when unset
    #[serde(default)]
    pub database_path: Option<String>,
}

impl DeskConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("TPA"))
    }

    pub(crate) fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        Config::builder().add_source(env).build()?.try_deserialize()
    }
}
