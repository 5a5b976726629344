//! Configuration module
//!
//! Configuration types and loading for the dashboard: where the admin
//! endpoints are, how often to poll them and how much history to keep.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{
    ConfigSource, ENV_ADMIN, ENV_BUFFER_SIZE, ENV_POLLING_INTERVAL_MS, apply_env_overrides,
    apply_overrides_from, default_config_toml, has_env_overrides, load_config,
    load_config_from_env, load_config_with_fallback,
};
pub use types::{AdminConfig, Config, HistoryConfig, PollingConfig};

pub use defaults::{buffer_size, polling_interval, request_timeout};
