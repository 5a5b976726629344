//! Configuration loading from files and environment variables
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment.
//! Command-line flags are applied on top by the binary.

use anyhow::Result;
use std::path::Path;

use super::types::Config;
use crate::types::{AdminUri, BufferSize, PollingInterval};

/// Base admin URI override
pub const ENV_ADMIN: &str = "ENVOY_DASH_ADMIN";
/// Polling interval override, in milliseconds
pub const ENV_POLLING_INTERVAL_MS: &str = "ENVOY_DASH_POLLING_INTERVAL_MS";
/// History length override
pub const ENV_BUFFER_SIZE: &str = "ENVOY_DASH_BUFFER_SIZE";

const ENV_VARS: [&str; 3] = [ENV_ADMIN, ENV_POLLING_INTERVAL_MS, ENV_BUFFER_SIZE];

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// TOML file at this path (possibly with environment overrides)
    File(String),
    /// Environment variables over defaults
    Environment,
    /// Built-in defaults only
    Default,
}

impl ConfigSource {
    /// Human-readable description for the startup log line
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::File(path) => format!("config file '{}'", path),
            Self::Environment => "environment variables".to_string(),
            Self::Default => "built-in defaults".to_string(),
        }
    }
}

/// Whether any `ENVOY_DASH_*` override is set
#[must_use]
pub fn has_env_overrides() -> bool {
    ENV_VARS.iter().any(|name| std::env::var(name).is_ok())
}

/// Apply overrides using `lookup` to read variables
///
/// Split out from [`apply_env_overrides`] so tests don't have to touch the
/// process environment.
pub fn apply_overrides_from(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(admin) = lookup(ENV_ADMIN) {
        let address = AdminUri::new(admin)
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", ENV_ADMIN, e))?;
        tracing::info!("Using admin address {} from {}", address, ENV_ADMIN);
        config.admin.set_address(address);
    }

    if let Some(interval) = lookup(ENV_POLLING_INTERVAL_MS) {
        config.polling.interval_ms = interval
            .parse::<PollingInterval>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", ENV_POLLING_INTERVAL_MS, e))?;
    }

    if let Some(size) = lookup(ENV_BUFFER_SIZE) {
        config.history.buffer_size = size
            .parse::<BufferSize>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", ENV_BUFFER_SIZE, e))?;
    }

    Ok(())
}

/// Apply `ENVOY_DASH_*` overrides from the process environment
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

/// Load configuration from a TOML file, with environment overrides
pub fn load_config(config_path: &str) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let mut config: Config = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    apply_env_overrides(&mut config)?;
    config.validate()?;

    Ok(config)
}

/// Build configuration from defaults plus environment overrides
pub fn load_config_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load from `config_path` if it exists, otherwise from the environment,
/// otherwise use defaults
///
/// A file that exists but fails to parse is an error, not a fallback.
pub fn load_config_with_fallback(config_path: &str) -> Result<(Config, ConfigSource)> {
    if Path::new(config_path).exists() {
        let config = load_config(config_path)?;
        return Ok((config, ConfigSource::File(config_path.to_string())));
    }

    if has_env_overrides() {
        return Ok((load_config_from_env()?, ConfigSource::Environment));
    }

    Ok((Config::default(), ConfigSource::Default))
}

/// Render the default configuration as TOML, for `--print-config`
pub fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&Config::default())
        .map_err(|e| anyhow::anyhow!("Failed to serialize default config: {}", e))
}
