//! Configuration type definitions

use crate::types::{AdminUri, BufferSize, PollingInterval, RequestTimeout};
use serde::{Deserialize, Serialize};

/// Main dashboard configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Admin listener location
    #[serde(default)]
    pub admin: AdminConfig,
    /// Poll cadence
    #[serde(default)]
    pub polling: PollingConfig,
    /// History kept per series
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Where the admin endpoints live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminConfig {
    /// Base URI, e.g. `http://localhost:9901`
    #[serde(default = "super::defaults::admin_address")]
    pub address: AdminUri,
    #[serde(default = "super::defaults::stats_path")]
    pub stats_path: String,
    #[serde(default = "super::defaults::clusters_path")]
    pub clusters_path: String,
    /// Full flat stats URI, replacing `address + stats_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_uri: Option<AdminUri>,
    /// Full clusters URI, replacing `address + clusters_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters_uri: Option<AdminUri>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            address: super::defaults::admin_address(),
            stats_path: super::defaults::stats_path(),
            clusters_path: super::defaults::clusters_path(),
            stats_uri: None,
            clusters_uri: None,
        }
    }
}

impl AdminConfig {
    /// URI polled for the flat stats dump
    #[must_use]
    pub fn stats_uri(&self) -> String {
        self.stats_uri
            .as_ref()
            .map_or_else(|| self.address.join(&self.stats_path), |uri| uri.to_string())
    }

    /// URI polled for the per-cluster dump
    #[must_use]
    pub fn clusters_uri(&self) -> String {
        self.clusters_uri
            .as_ref()
            .map_or_else(|| self.address.join(&self.clusters_path), |uri| uri.to_string())
    }

    /// Point both endpoints at a new base address, dropping explicit URIs
    pub fn set_address(&mut self, address: AdminUri) {
        self.address = address;
        self.stats_uri = None;
        self.clusters_uri = None;
    }
}

/// Poll cadence settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PollingConfig {
    #[serde(default = "super::defaults::polling_interval")]
    pub interval_ms: PollingInterval,
    /// Explicit per-request timeout; derived from the interval when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<RequestTimeout>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: super::defaults::polling_interval(),
            timeout_ms: None,
        }
    }
}

impl PollingConfig {
    /// Timeout applied to each admin request
    ///
    /// An explicit `timeout_ms` wins. Otherwise four fifths of the interval,
    /// capped at the default and never below 1ms.
    #[must_use]
    pub fn request_timeout(&self) -> RequestTimeout {
        self.timeout_ms.unwrap_or_else(|| {
            let derived = (self.interval_ms.get() * 4 / 5).max(1);
            let default = super::defaults::request_timeout();
            RequestTimeout::new(derived.min(default.get())).unwrap_or(default)
        })
    }
}

/// History settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct HistoryConfig {
    #[serde(default = "super::defaults::buffer_size")]
    pub buffer_size: BufferSize,
}
