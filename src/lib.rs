//! Live dashboard for an Envoy proxy's admin endpoint
//!
//! Two pollers fetch the plain-text `/stats` and `/clusters` dumps on a fixed
//! cadence and write every numeric stat into a fixed-size circular buffer.
//! Delta and gauge series are derived from those buffers on demand and shown
//! in a terminal UI, or printed as text columns in headless mode.
//!
//! # Layout
//! - [`store`]: circular buffers, the shared timestamp table and the cursor
//! - [`parser`]: the two admin text formats
//! - [`poller`]: fetch, parse and ingest on an interval
//! - [`series`]: delta and gauge series over one buffer
//! - [`query`]: read-only facade used by the views
//! - [`tui`] and [`headless`]: the two front ends

pub mod args;
pub mod config;
pub mod headless;
pub mod logging;
pub mod parser;
pub mod poller;
pub mod query;
pub mod runtime;
pub mod series;
pub mod store;
pub mod tui;
pub mod types;

pub use args::{CommonArgs, WatchArgs};
pub use config::{
    Config, ConfigSource, default_config_toml, load_config, load_config_with_fallback,
};
pub use headless::{WatchField, Watcher};
pub use logging::init_logging;
pub use parser::{ClusterStatsParser, FlatStatsParser, SnapshotParser};
pub use poller::{PollError, Poller};
pub use query::{ClusterSummary, QueryError, QueryFacade, StatFilter, StatsTable};
pub use series::{
    Series, SeriesPoint, compute_delta_series, compute_gauge_series, compute_latest_delta,
};
pub use store::{
    IngestReport, SeriesKind, SharedStore, StatValue, StoreError, TimeSeriesStore,
};
pub use types::{AdminUri, BufferSize, ClusterKey, FlatKey, MetricKey, MetricSample, SampleValue};
