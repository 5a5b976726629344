//! Periodic admin-endpoint poller
//!
//! A [`Poller`] owns one endpoint, one parser and the write side of one
//! [`SharedStore`]. Each successful cycle fetches the body, stamps it with the
//! local wall-clock time, ingests it atomically and sends a payload-free
//! "updated" notification. Failed cycles change nothing and are only logged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::parser::SnapshotParser;
use crate::store::{IngestReport, SharedStore};
use crate::types::{PollingInterval, RequestTimeout};

/// Capacity of the notification channel; slow views only ever need the latest
const NOTIFY_CAPACITY: usize = 16;

/// Format of the per-cycle capture label
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Errors from a single poll cycle
#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {uri} failed: {source}")]
    Request {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {uri} timed out")]
    Timeout { uri: String },

    #[error("{uri} returned status {status}: {reason}")]
    Status {
        uri: String,
        status: u16,
        reason: String,
    },

    #[error("failed to read body from {uri}: {source}")]
    Body {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("a poll of {0} is already in flight")]
    InFlight(String),
}

impl PollError {
    fn from_reqwest(uri: &str, e: reqwest::Error, reading_body: bool) -> Self {
        let uri = uri.to_string();
        if e.is_timeout() {
            Self::Timeout { uri }
        } else if reading_body {
            Self::Body { uri, source: e }
        } else {
            Self::Request { uri, source: e }
        }
    }
}

/// Clears the in-flight flag when the cycle ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Poller for one endpoint feeding one store
pub struct Poller<P: SnapshotParser> {
    client: reqwest::Client,
    uri: String,
    interval: PollingInterval,
    parser: P,
    store: SharedStore<P::Key>,
    notifier: broadcast::Sender<()>,
    in_flight: AtomicBool,
}

impl<P: SnapshotParser> std::fmt::Debug for Poller<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("uri", &self.uri)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl<P: SnapshotParser> Poller<P> {
    /// Create a poller; the request timeout applies to the whole request
    pub fn new(
        uri: impl Into<String>,
        interval: PollingInterval,
        timeout: RequestTimeout,
        parser: P,
        store: SharedStore<P::Key>,
    ) -> Result<Self, PollError> {
        let client = reqwest::Client::builder()
            .timeout(timeout.as_duration())
            .user_agent(concat!("envoy-dash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PollError::Client)?;
        let (notifier, _) = broadcast::channel(NOTIFY_CAPACITY);

        Ok(Self {
            client,
            uri: uri.into(),
            interval,
            parser,
            store,
            notifier,
            in_flight: AtomicBool::new(false),
        })
    }

    /// Send cycle notifications on a channel shared with other pollers
    #[must_use]
    pub fn with_notifier(mut self, notifier: broadcast::Sender<()>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Endpoint this poller fetches
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Store this poller writes to
    #[must_use]
    pub fn store(&self) -> &SharedStore<P::Key> {
        &self.store
    }

    /// Receive one `()` per successfully completed cycle
    ///
    /// A lagging receiver gets [`broadcast::error::RecvError::Lagged`]; that
    /// only means several cycles completed, so re-query and carry on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notifier.subscribe()
    }

    /// Run one complete poll cycle
    ///
    /// Returns [`PollError::InFlight`] without touching the network if another
    /// cycle on this poller has not finished yet.
    pub async fn poll_once(&self) -> Result<IngestReport, PollError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PollError::InFlight(self.uri.clone()));
        }
        let _guard = InFlightGuard(&self.in_flight);

        let body = self.fetch().await?;
        let label = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let samples = self.parser.parse(&body);
        let report = self.store.ingest(label, samples);

        debug!(
            "Ingested {} samples from {} into slot {} ({} conflicts)",
            report.written, self.uri, report.cursor, report.conflicts
        );

        // No receivers is fine
        let _ = self.notifier.send(());
        Ok(report)
    }

    async fn fetch(&self) -> Result<String, PollError> {
        let response = self
            .client
            .get(&self.uri)
            .send()
            .await
            .map_err(|e| PollError::from_reqwest(&self.uri, e, false))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status {
                uri: self.uri.clone(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| PollError::from_reqwest(&self.uri, e, true))
    }

    /// Poll on the configured cadence until `shutdown` fires
    ///
    /// Each cycle is awaited before the next tick is taken and late ticks are
    /// skipped, so cycles on one poller never overlap.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(self.interval.as_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Polling {} every {}", self.uri, self.interval);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Stopping poller for {}", self.uri);
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        error!("Poll cycle abandoned: {}", e);
                    }
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) on the current runtime
    pub fn spawn(self: &Arc<Self>, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(shutdown))
    }
}
