//! Read-only query surface for the views
//!
//! Every method copies data out of the store; nothing returned borrows it.
//! Lookups of keys that were never observed return [`QueryError::UnknownSeries`]
//! and log a warning, so a view can render a placeholder and carry on.

use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

use crate::series::{self, Series};
use crate::store::{SeriesKind, SharedStore, StatValue, StoreError};
use crate::types::{ClusterKey, FlatKey, MetricKey};

/// Namespaces under a cluster that hold cluster-wide settings, not hosts
pub const CLUSTER_LEVEL_NAMESPACES: &[&str] = &["default_priority", "high_priority", "added_via_api"];

/// Header row of [`QueryFacade::stats_table`]
pub const STATS_TABLE_HEADER: [&str; 2] = ["Stat Name", "Stat Value"];

/// Query errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown series {0}")]
    UnknownSeries(String),

    #[error("series {0} is not numeric")]
    NotNumeric(String),
}

impl From<StoreError> for QueryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownSeries(key) => Self::UnknownSeries(key),
            StoreError::KindConflict { key, .. } => Self::NotNumeric(key),
            StoreError::NoActiveCycle => Self::UnknownSeries(String::new()),
        }
    }
}

impl QueryError {
    /// Placeholder text for a table cell or gauge
    #[must_use]
    pub fn placeholder(&self) -> String {
        match self {
            Self::UnknownSeries(key) | Self::NotNumeric(key) => format!("err - {}", key),
        }
    }
}

/// Name filter for the stats table
#[derive(Debug, Clone)]
pub enum StatFilter {
    /// Everything
    All,
    /// Literal substring match
    Substring(String),
    /// Unanchored regular expression
    Pattern(Regex),
}

impl StatFilter {
    /// Compile `pattern` as a regular expression
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Filter from interactive search text
    ///
    /// Empty text matches everything. Text that compiles as a regex is used as
    /// one; half-typed patterns such as `rq_[` fall back to a literal match.
    #[must_use]
    pub fn from_search(text: &str) -> Self {
        if text.is_empty() {
            return Self::All;
        }
        Self::pattern(text).unwrap_or_else(|_| Self::Substring(text.to_string()))
    }

    /// Whether `name` passes the filter
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Substring(needle) => name.contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(name),
        }
    }
}

/// Header-prefixed (name, value) rows, sorted by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsTable {
    rows: Vec<[String; 2]>,
}

impl StatsTable {
    /// All rows, header first
    #[must_use]
    pub fn rows(&self) -> &[[String; 2]] {
        &self.rows
    }

    /// Header row
    #[must_use]
    pub fn header(&self) -> &[String; 2] {
        &self.rows[0]
    }

    /// Data rows without the header
    #[must_use]
    pub fn body(&self) -> &[[String; 2]] {
        &self.rows[1..]
    }

    /// Number of data rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only facade over one shared store
#[derive(Debug)]
pub struct QueryFacade<K> {
    store: SharedStore<K>,
}

impl<K> Clone for QueryFacade<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<K: MetricKey> QueryFacade<K> {
    #[must_use]
    pub fn new(store: SharedStore<K>) -> Self {
        Self { store }
    }

    /// Underlying store handle
    #[must_use]
    pub fn store(&self) -> &SharedStore<K> {
        &self.store
    }

    /// Next path segments below `prefix`, sorted
    #[must_use]
    pub fn names_under(&self, prefix: &[&str]) -> Vec<String> {
        self.store
            .read(|store| store.keys_under(prefix))
            .into_iter()
            .collect()
    }

    /// Top-level names, sorted
    #[must_use]
    pub fn top_level_names(&self) -> Vec<String> {
        self.names_under(&[])
    }

    /// Current value of a fully-qualified key
    pub fn current_value(&self, key: &K) -> Result<StatValue, QueryError> {
        self.store
            .read(|store| store.current_value(key))
            .map_err(|e| {
                warn!("{}", e);
                QueryError::from(e)
            })
    }

    /// Current value rendered for display, with the error placeholder on failure
    #[must_use]
    pub fn current_value_text(&self, key: &K) -> String {
        match self.current_value(key) {
            Ok(value) => value.to_string(),
            Err(e) => e.placeholder(),
        }
    }

    /// Sorted (name, current value) rows for keys whose name matches `filter`
    #[must_use]
    pub fn stats_table(&self, filter: &StatFilter) -> StatsTable {
        let mut body: Vec<[String; 2]> = self.store.read(|store| {
            store
                .keys()
                .filter_map(|key| {
                    let name = key.to_string();
                    if !filter.matches(&name) {
                        return None;
                    }
                    let value = store
                        .current_value(key)
                        .map_or_else(|e| QueryError::from(e).placeholder(), |v| v.to_string());
                    Some([name, value])
                })
                .collect()
        });
        body.sort_unstable_by(|a, b| a[0].cmp(&b[0]));

        let mut rows = Vec::with_capacity(body.len() + 1);
        rows.push(STATS_TABLE_HEADER.map(String::from));
        rows.extend(body);
        StatsTable { rows }
    }

    /// Delta series for `key`; `Ok(None)` when no point qualifies yet
    pub fn delta_series(&self, key: &K) -> Result<Option<Series>, QueryError> {
        self.with_buffer(key, |view| series::compute_delta_series(&view))
    }

    /// Gauge series for `key`; `Ok(None)` when no slot is set
    pub fn gauge_series(&self, key: &K) -> Result<Option<Series>, QueryError> {
        self.with_buffer(key, |view| series::compute_gauge_series(&view))
    }

    /// Difference between the two most recent samples
    pub fn latest_delta(&self, key: &K) -> Result<Option<i64>, QueryError> {
        self.with_buffer(key, |view| series::compute_latest_delta(&view))
    }

    /// Current cursor
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.store.cursor()
    }

    fn with_buffer<R>(
        &self,
        key: &K,
        f: impl FnOnce(crate::store::BufferView<'_>) -> Option<R>,
    ) -> Result<Option<R>, QueryError> {
        let result = self.store.read(|store| match store.kind(key) {
            None => Err(QueryError::UnknownSeries(key.to_string())),
            Some(SeriesKind::Scalar) => Err(QueryError::NotNumeric(key.to_string())),
            Some(SeriesKind::Numeric) => Ok(store.raw_buffer(key).and_then(f)),
        });
        if let Err(e) = &result {
            warn!("{}", e);
        }
        result
    }
}

impl QueryFacade<FlatKey> {
    /// Last dot-segment of every stat whose name starts with `prefix`
    #[must_use]
    pub fn stat_names_with_prefix(&self, prefix: &str) -> BTreeSet<String> {
        self.store.read(|store| {
            store
                .keys()
                .filter(|key| key.as_str().starts_with(prefix))
                .map(|key| key.leaf().to_string())
                .collect()
        })
    }

    /// Current value of a flat stat by name
    pub fn value_of(&self, name: &str) -> Result<StatValue, QueryError> {
        self.current_value(&FlatKey::new(name))
    }
}

/// Summary row for one cluster, read from the flat stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSummary {
    pub name: String,
    pub cx_active: String,
    pub rq_active: String,
    pub rq_total: String,
    pub members: String,
    pub healthy: String,
}

impl ClusterSummary {
    /// Column headers matching [`ClusterSummary::cells`]
    pub const HEADERS: [&'static str; 6] =
        ["cluster", "cx act", "rq act", "rq total", "members", "healthy"];

    /// Build the row for `cluster` from the flat stats facade
    #[must_use]
    pub fn collect(cluster: &str, stats: &QueryFacade<FlatKey>) -> Self {
        let stat = |suffix: &str| {
            stats.current_value_text(&FlatKey::new(format!("cluster.{}.{}", cluster, suffix)))
        };
        Self {
            name: cluster.to_string(),
            cx_active: stat("upstream_cx_active"),
            rq_active: stat("upstream_rq_active"),
            rq_total: stat("upstream_rq_total"),
            members: stat("membership_total"),
            healthy: stat("membership_healthy"),
        }
    }

    /// Cells in header order
    #[must_use]
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.name,
            &self.cx_active,
            &self.rq_active,
            &self.rq_total,
            &self.members,
            &self.healthy,
        ]
    }
}

impl QueryFacade<ClusterKey> {
    /// Cluster names, sorted
    #[must_use]
    pub fn cluster_names(&self) -> Vec<String> {
        self.top_level_names()
    }

    /// Every namespace under `cluster`, including cluster-level ones
    #[must_use]
    pub fn namespaces(&self, cluster: &str) -> Vec<String> {
        self.names_under(&[cluster])
    }

    /// Host namespaces under `cluster` (cluster-level namespaces removed)
    #[must_use]
    pub fn host_namespaces(&self, cluster: &str) -> Vec<String> {
        self.namespaces(cluster)
            .into_iter()
            .filter(|ns| !CLUSTER_LEVEL_NAMESPACES.contains(&ns.as_str()))
            .collect()
    }

    /// Stat names under one namespace, sorted
    #[must_use]
    pub fn stat_names(&self, cluster: &str, namespace: &str) -> Vec<String> {
        self.names_under(&[cluster, namespace])
    }

    /// Sorted union of stat names across the cluster's hosts
    #[must_use]
    pub fn host_stat_names(&self, cluster: &str) -> Vec<String> {
        self.host_namespaces(cluster)
            .iter()
            .flat_map(|ns| self.stat_names(cluster, ns))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Per-host delta series of `stat`, skipping hosts without data
    #[must_use]
    pub fn host_delta_series(&self, cluster: &str, stat: &str) -> Vec<(String, Series)> {
        self.host_namespaces(cluster)
            .into_iter()
            .filter_map(|host| {
                let key = ClusterKey::new(cluster, host.as_str(), stat);
                // Hosts that don't report this stat are skipped quietly
                let exists = self.store.read(|store| store.kind(&key)) == Some(SeriesKind::Numeric);
                if !exists {
                    return None;
                }
                self.delta_series(&key).ok().flatten().map(|s| (host, s))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BufferSize, MetricSample};

    fn flat_facade(cycles: &[&[(&str, i64)]]) -> QueryFacade<FlatKey> {
        let store = SharedStore::new(BufferSize::new(5).unwrap());
        for (i, cycle) in cycles.iter().enumerate() {
            store.ingest(
                format!("t{}", i),
                cycle
                    .iter()
                    .map(|(name, value)| MetricSample::numeric(FlatKey::new(*name), *value)),
            );
        }
        QueryFacade::new(store)
    }

    #[test]
    fn test_filter_from_search() {
        assert!(matches!(StatFilter::from_search(""), StatFilter::All));
        assert!(matches!(StatFilter::from_search("rq_"), StatFilter::Pattern(_)));
        assert!(matches!(StatFilter::from_search("rq_["), StatFilter::Substring(_)));
        assert!(StatFilter::from_search("rq_[").matches("cluster.rq_[x"));
        assert!(StatFilter::from_search("up.*total").matches("cluster.a.upstream_rq_total"));
    }

    #[test]
    fn test_substring_filter() {
        let filter = StatFilter::Substring("uptime".into());
        assert!(filter.matches("server.uptime"));
        assert!(!filter.matches("server.version"));
    }

    #[test]
    fn test_stats_table_sorted_with_header() {
        let facade = flat_facade(&[&[("b.two", 2), ("a.one", 1), ("c.three", 3)]]);
        let table = facade.stats_table(&StatFilter::All);

        assert_eq!(table.header(), &["Stat Name".to_string(), "Stat Value".to_string()]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.body()[0], ["a.one".to_string(), "1".to_string()]);
        assert_eq!(table.body()[2], ["c.three".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_stats_table_filtered() {
        let facade = flat_facade(&[&[("server.uptime", 5), ("cluster.a.rq", 1)]]);
        let table = facade.stats_table(&StatFilter::from_search("server"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.body()[0][0], "server.uptime");

        let empty = facade.stats_table(&StatFilter::from_search("nothing"));
        assert!(empty.is_empty());
        assert_eq!(empty.rows().len(), 1);
    }

    #[test]
    fn test_unknown_series_is_reported() {
        let facade = flat_facade(&[]);
        let key = FlatKey::new("nope");
        assert_eq!(
            facade.current_value(&key),
            Err(QueryError::UnknownSeries("nope".into()))
        );
        assert_eq!(
            facade.delta_series(&key),
            Err(QueryError::UnknownSeries("nope".into()))
        );
        assert_eq!(facade.current_value_text(&key), "err - nope");
    }

    #[test]
    fn test_scalar_series_not_numeric() {
        let store = SharedStore::new(BufferSize::DEFAULT);
        store.ingest("t0", [MetricSample::scalar(FlatKey::new("v"), "1.0")]);
        let facade = QueryFacade::new(store);

        assert_eq!(
            facade.gauge_series(&FlatKey::new("v")),
            Err(QueryError::NotNumeric("v".into()))
        );
        assert_eq!(facade.current_value_text(&FlatKey::new("v")), "1.0");
    }

    #[test]
    fn test_stat_names_with_prefix() {
        let facade = flat_facade(&[&[
            ("http.ingress.downstream_rq_total", 1),
            ("http.ingress.downstream_cx_active", 1),
            ("http.admin.downstream_rq_total", 1),
            ("server.uptime", 1),
        ]]);
        let names: Vec<_> = facade
            .stat_names_with_prefix("http.")
            .into_iter()
            .collect();
        assert_eq!(names, vec!["downstream_cx_active", "downstream_rq_total"]);
    }

    #[test]
    fn test_cluster_summary() {
        let facade = flat_facade(&[&[
            ("cluster.web.upstream_cx_active", 4),
            ("cluster.web.upstream_rq_active", 2),
            ("cluster.web.upstream_rq_total", 100),
            ("cluster.web.membership_total", 3),
        ]]);
        let row = ClusterSummary::collect("web", &facade);
        assert_eq!(
            row.cells(),
            ["web", "4", "2", "100", "3", "err - cluster.web.membership_healthy"]
        );
    }

    #[test]
    fn test_cluster_navigation() {
        let store = SharedStore::new(BufferSize::new(4).unwrap());
        let cycle = |a: i64, b: i64| {
            vec![
                MetricSample::numeric(ClusterKey::new("web", "10.0.0.1:80", "rq_total"), a),
                MetricSample::numeric(ClusterKey::new("web", "10.0.0.2:80", "rq_total"), b),
                MetricSample::numeric(ClusterKey::new("web", "10.0.0.2:80", "cx_active"), 1),
                MetricSample::numeric(
                    ClusterKey::new("web", "default_priority", "max_connections"),
                    1024,
                ),
                MetricSample::scalar(ClusterKey::new("db", "10.0.1.1:5432", "health_flags"), "healthy"),
            ]
        };
        store.ingest("t0", cycle(1, 10));
        store.ingest("t1", cycle(3, 15));
        store.ingest("t2", cycle(6, 16));
        store.ingest("t3", cycle(10, 20));
        let facade = QueryFacade::new(store);

        assert_eq!(facade.cluster_names(), vec!["db", "web"]);
        assert_eq!(
            facade.namespaces("web"),
            vec!["10.0.0.1:80", "10.0.0.2:80", "default_priority"]
        );
        assert_eq!(facade.host_namespaces("web"), vec!["10.0.0.1:80", "10.0.0.2:80"]);
        assert_eq!(facade.host_stat_names("web"), vec!["cx_active", "rq_total"]);

        // cursor 3: delta walk visits slots 1 and 2
        let series = facade.host_delta_series("web", "rq_total");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "10.0.0.1:80");
        assert_eq!(series[0].1.values(), vec![2, 3]);
        assert_eq!(series[1].1.values(), vec![5, 1]);
    }
}
