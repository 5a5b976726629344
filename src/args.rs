//! Command-line argument parsing
//!
//! Flags override the configuration file and the `ENVOY_DASH_*` environment.

use crate::config::Config;
use crate::headless::WatchField;
use crate::types::{AdminUri, BufferSize, ConfigPath, PollingInterval, RequestTimeout};
use clap::Parser;

/// Arguments shared by every mode
///
/// Use `#[command(flatten)]` in the binary's `Args` to include these fields.
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// Admin listener base address, e.g. http://localhost:9901
    pub admin: Option<AdminUri>,

    /// Polling interval in milliseconds
    pub interval: Option<PollingInterval>,

    /// Configuration file path (skipped when missing)
    #[arg(short, long, default_value = "envoy-dash.toml")]
    pub config: ConfigPath,

    /// Samples kept per series (minimum 3)
    #[arg(short, long)]
    pub buffer_size: Option<BufferSize>,

    /// Per-request timeout in milliseconds; must be below the interval
    #[arg(short, long)]
    pub timeout_ms: Option<RequestTimeout>,

    /// Tokio worker threads (default: 1, 0 = one per CPU core)
    #[arg(long, env = "ENVOY_DASH_THREADS")]
    pub threads: Option<usize>,
}

impl CommonArgs {
    /// Apply explicit flags on top of a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(admin) = &self.admin {
            config.admin.set_address(admin.clone());
        }
        if let Some(interval) = self.interval {
            config.polling.interval_ms = interval;
        }
        if let Some(buffer_size) = self.buffer_size {
            config.history.buffer_size = buffer_size;
        }
        if let Some(timeout) = self.timeout_ms {
            config.polling.timeout_ms = Some(timeout);
        }
    }

    /// Whether any flag overrides the loaded configuration
    #[must_use]
    pub fn has_overrides(&self) -> bool {
        self.admin.is_some()
            || self.interval.is_some()
            || self.buffer_size.is_some()
            || self.timeout_ms.is_some()
    }
}

/// Headless watch mode arguments
#[derive(Parser, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Print selected stats as text columns instead of the dashboard
    #[arg(long)]
    pub headless: bool,

    /// Comma-separated stats to print; a trailing `-` prints the raw value
    /// instead of the per-interval delta
    #[arg(short, long, value_delimiter = ',', requires = "headless")]
    pub fields: Vec<WatchField>,

    /// Prefix joined onto every field name
    #[arg(short, long, requires = "headless")]
    pub prefix: Option<String>,
}
