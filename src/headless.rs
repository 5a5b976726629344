//! Headless watch mode: selected flat stats as fixed-width text columns
//!
//! One row per completed poll cycle. Gauge fields (written with a trailing
//! `-`) show the current value; the rest show the change since the previous
//! cycle. Anything unavailable prints as `-`. A banner with the date and the
//! server's version and uptime precedes the first header.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use anyhow::Result;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::info;

use crate::query::QueryFacade;
use crate::series;
use crate::store::StatValue;
use crate::types::FlatKey;

/// Suffix marking a field as a gauge
pub const GAUGE_SUFFIX: char = '-';

/// Rows between repeated headers
pub const HEADER_EVERY: usize = 20;

/// Width of every value column
pub const COLUMN_WIDTH: usize = 10;

const MISSING: &str = "-";

/// Stats shown once above the first header
const BANNER_STATS: [&str; 2] = ["server.version", "server.uptime"];

/// Date format on the banner line
pub const BANNER_DATE_FORMAT: &str = "%Y-%m-%d";

/// One requested column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchField {
    name: String,
    gauge: bool,
}

impl WatchField {
    /// Stat name without prefix or gauge marker
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_gauge(&self) -> bool {
        self.gauge
    }

    /// Full stat key; the prefix is joined as-is
    #[must_use]
    pub fn key(&self, prefix: &str) -> FlatKey {
        FlatKey::new(format!("{}{}", prefix, self.name))
    }
}

impl FromStr for WatchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, gauge) = match s.strip_suffix(GAUGE_SUFFIX) {
            Some(name) => (name, true),
            None => (s, false),
        };
        if name.is_empty() {
            return Err(format!("empty field name in '{}'", s));
        }
        Ok(Self {
            name: name.to_string(),
            gauge,
        })
    }
}

impl fmt::Display for WatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.gauge {
            write!(f, "{}", GAUGE_SUFFIX)?;
        }
        Ok(())
    }
}

/// Formats watch rows from the flat stats store
#[derive(Debug)]
pub struct Watcher {
    fields: Vec<WatchField>,
    prefix: String,
    stats: QueryFacade<FlatKey>,
    rows: usize,
    banner_shown: bool,
}

impl Watcher {
    #[must_use]
    pub fn new(fields: Vec<WatchField>, prefix: Option<String>, stats: QueryFacade<FlatKey>) -> Self {
        Self {
            fields,
            prefix: prefix.unwrap_or_default(),
            stats,
            rows: 0,
            banner_shown: false,
        }
    }

    fn line(timestamp: &str, cells: impl Iterator<Item = String>) -> String {
        cells.fold(timestamp.to_string(), |line, cell| {
            format!("{} {:>width$}", line, cell, width = COLUMN_WIDTH)
        })
    }

    /// Identifies the watched server: date, then its version and uptime
    #[must_use]
    pub fn banner(&self, date: &str) -> String {
        self.stats.store().read(|store| {
            BANNER_STATS.iter().fold(date.to_string(), |line, name| {
                let value = match store.current_value(&FlatKey::new(*name)) {
                    Ok(StatValue::Numeric(v)) => v.to_string(),
                    _ => MISSING.to_string(),
                };
                format!("{} {} {}", line, name, value)
            })
        })
    }

    /// Header line: the field names as given
    #[must_use]
    pub fn header(&self, timestamp: &str) -> String {
        Self::line(timestamp, self.fields.iter().map(ToString::to_string))
    }

    /// Data line for the store's current cycle
    #[must_use]
    pub fn row(&self, timestamp: &str) -> String {
        Self::line(timestamp, self.fields.iter().map(|f| self.cell(f)))
    }

    fn cell(&self, field: &WatchField) -> String {
        let key = field.key(&self.prefix);
        // Read the store directly: a missing field is expected here, not worth a warning
        self.stats.store().read(|store| {
            if field.is_gauge() {
                match store.current_value(&key) {
                    Ok(value @ (StatValue::Numeric(_) | StatValue::Scalar(_))) => value.to_string(),
                    _ => MISSING.to_string(),
                }
            } else {
                store
                    .raw_buffer(&key)
                    .and_then(|view| series::compute_latest_delta(&view))
                    .map_or_else(|| MISSING.to_string(), |delta| delta.to_string())
            }
        })
    }

    /// Lines to print for one completed cycle, header first when due
    pub fn next_lines(&mut self, timestamp: &str) -> Vec<String> {
        let mut lines = Vec::with_capacity(2);
        if self.rows % HEADER_EVERY == 0 {
            lines.push(self.header(timestamp));
        }
        lines.push(self.row(timestamp));
        self.rows += 1;
        lines
    }

    /// Print a row after every update until shutdown or the poller goes away
    pub async fn run<W: Write>(
        mut self,
        mut updates: broadcast::Receiver<()>,
        mut shutdown: broadcast::Receiver<()>,
        mut out: W,
    ) -> Result<()> {
        info!("Watching {} field(s)", self.fields.len());

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                update = updates.recv() => match update {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        let now = chrono::Local::now();
                        if !self.banner_shown {
                            let date = now.format(BANNER_DATE_FORMAT).to_string();
                            writeln!(out, "{}", self.banner(&date))?;
                            self.banner_shown = true;
                        }
                        let timestamp = now.format(crate::poller::TIMESTAMP_FORMAT).to_string();
                        for line in self.next_lines(&timestamp) {
                            writeln!(out, "{}", line)?;
                        }
                        out.flush()?;
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        Ok(())
    }
}
