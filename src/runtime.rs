//! Tokio runtime configuration and startup wiring for the binary
//!
//! This module provides:
//! - Testable runtime configuration and builder logic
//! - Store and poller construction from a validated [`Config`]
//! - Shutdown signal handling

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::{Config, ConfigSource, load_config_with_fallback};
use crate::parser::{ClusterStatsParser, FlatStatsParser};
use crate::poller::Poller;
use crate::query::QueryFacade;
use crate::store::SharedStore;
use crate::types::{ClusterKey, FlatKey};

/// Capacity of the combined update channel shared by both pollers
const UPDATE_CAPACITY: usize = 16;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads
    worker_threads: usize,
}

impl RuntimeConfig {
    /// Create runtime config from optional thread count
    ///
    /// If `threads` is None, defaults to 1 thread.
    /// If `threads` is Some(0), uses number of CPU cores.
    /// Single-threaded runtime is used if threads == 1.
    #[must_use]
    pub fn from_args(threads: Option<usize>) -> Self {
        let worker_threads = match threads {
            None => 1,
            Some(0) => std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            Some(n) => n,
        };
        Self { worker_threads }
    }

    /// Get number of worker threads
    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Check if single-threaded
    #[must_use]
    pub const fn is_single_threaded(&self) -> bool {
        self.worker_threads == 1
    }

    /// Build the tokio runtime
    ///
    /// # Errors
    /// Returns error if runtime creation fails
    pub fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let rt = if self.is_single_threaded() {
            info!("Starting envoy-dash with single-threaded runtime");
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
        } else {
            info!(
                "Starting envoy-dash with {} worker threads",
                self.worker_threads
            );
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .enable_all()
                .build()?
        };
        Ok(rt)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_args(None)
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
///
/// A handler that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Spawn a task that broadcasts shutdown on Ctrl+C or SIGTERM
pub fn spawn_shutdown_handler(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });
}

/// Load configuration and log where it came from
///
/// # Errors
/// Returns error if configuration loading fails
pub fn load_and_log_config(config_path: &str) -> Result<(Config, ConfigSource)> {
    let (config, source) = load_config_with_fallback(config_path)?;

    info!("Loaded configuration from {}", source.description());
    info!(
        "Admin endpoints: {} and {}",
        config.admin.stats_uri(),
        config.admin.clusters_uri()
    );
    info!(
        "Polling every {} with {} samples of history",
        config.polling.interval_ms, config.history.buffer_size
    );

    Ok((config, source))
}

/// Both stores plus their pollers, sharing one update channel
pub struct Pollers {
    pub stats: Arc<Poller<FlatStatsParser>>,
    pub clusters: Arc<Poller<ClusterStatsParser>>,
    updates: broadcast::Sender<()>,
}

impl Pollers {
    /// Build empty stores sized from `config` and a poller for each endpoint
    ///
    /// # Errors
    /// Returns error if an HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        let buffer_size = config.history.buffer_size;
        let interval = config.polling.interval_ms;
        let timeout = config.polling.request_timeout();

        let stats = Poller::new(
            config.admin.stats_uri(),
            interval,
            timeout,
            FlatStatsParser,
            SharedStore::<FlatKey>::new(buffer_size),
        )?
        .with_notifier(updates.clone());

        let clusters = Poller::new(
            config.admin.clusters_uri(),
            interval,
            timeout,
            ClusterStatsParser,
            SharedStore::<ClusterKey>::new(buffer_size),
        )?
        .with_notifier(updates.clone());

        Ok(Self {
            stats: Arc::new(stats),
            clusters: Arc::new(clusters),
            updates,
        })
    }

    /// Receive one `()` per completed cycle of either poller
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.updates.subscribe()
    }

    /// Read side of the flat stats store
    #[must_use]
    pub fn stats_facade(&self) -> QueryFacade<FlatKey> {
        QueryFacade::new(self.stats.store().clone())
    }

    /// Read side of the per-cluster store
    #[must_use]
    pub fn clusters_facade(&self) -> QueryFacade<ClusterKey> {
        QueryFacade::new(self.clusters.store().clone())
    }

    /// Start the flat stats poller only
    pub fn spawn_stats(&self, shutdown: &broadcast::Sender<()>) -> Vec<JoinHandle<()>> {
        vec![self.stats.spawn(shutdown.subscribe())]
    }

    /// Start both pollers
    pub fn spawn_all(&self, shutdown: &broadcast::Sender<()>) -> Vec<JoinHandle<()>> {
        vec![
            self.stats.spawn(shutdown.subscribe()),
            self.clusters.spawn(shutdown.subscribe()),
        ]
    }
}
