//! Metric keys: flat stat names and cluster::namespace::stat paths
//!
//! Segments are opaque strings compared by exact match. The store only needs
//! to walk a key's segments to answer prefix enumerations, so both shapes
//! implement [`MetricKey`] and share one store implementation.

use derive_more::{AsRef, Deref, Display, From};
use smallvec::SmallVec;
use std::fmt;
use std::hash::Hash;

/// Segment list for a key (at most three segments, kept on the stack)
pub type Segments<'a> = SmallVec<[&'a str; 3]>;

/// A key the time-series store can be indexed by
pub trait MetricKey: Clone + Eq + Hash + Ord + fmt::Display + Send + Sync + 'static {
    /// Path segments from the root, 1 to 3 entries
    fn segments(&self) -> Segments<'_>;

    /// Whether this key's path begins with `prefix`
    fn starts_with(&self, prefix: &[&str]) -> bool {
        let segments = self.segments();
        segments.len() >= prefix.len() && segments.iter().zip(prefix).all(|(a, b)| a == b)
    }
}

/// Flat stat name from the `/stats` endpoint, e.g. `server.uptime`
///
/// The dots are part of the name; the store treats it as a single segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, AsRef, Deref)]
pub struct FlatKey(String);

impl FlatKey {
    /// Create a key from any string-like name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the stat name
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last dot-separated component (`server.uptime` -> `uptime`)
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl From<&str> for FlatKey {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl MetricKey for FlatKey {
    fn segments(&self) -> Segments<'_> {
        smallvec::smallvec![self.0.as_str()]
    }
}

/// Hierarchical key from the `/clusters` endpoint
///
/// `namespace` is usually a host address (`10.0.0.1:80`) but can also be a
/// cluster-level grouping such as `default_priority`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterKey {
    pub cluster: String,
    pub namespace: String,
    pub stat: String,
}

impl ClusterKey {
    /// Create a key from its three path segments
    #[must_use]
    pub fn new(
        cluster: impl Into<String>,
        namespace: impl Into<String>,
        stat: impl Into<String>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            namespace: namespace.into(),
            stat: stat.into(),
        }
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.cluster, self.namespace, self.stat)
    }
}

impl MetricKey for ClusterKey {
    fn segments(&self) -> Segments<'_> {
        smallvec::smallvec![
            self.cluster.as_str(),
            self.namespace.as_str(),
            self.stat.as_str()
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_key_segments() {
        let key = FlatKey::new("server.uptime");
        assert_eq!(key.segments().as_slice(), &["server.uptime"]);
        assert_eq!(key.leaf(), "uptime");
        assert_eq!(key.to_string(), "server.uptime");
    }

    #[test]
    fn test_flat_key_leaf_without_dots() {
        assert_eq!(FlatKey::new("uptime").leaf(), "uptime");
    }

    #[test]
    fn test_cluster_key_segments() {
        let key = ClusterKey::new("clusterA", "10.0.0.1:80", "rq_total");
        assert_eq!(
            key.segments().as_slice(),
            &["clusterA", "10.0.0.1:80", "rq_total"]
        );
        assert_eq!(key.to_string(), "clusterA::10.0.0.1:80::rq_total");
    }

    #[test]
    fn test_starts_with() {
        let key = ClusterKey::new("clusterA", "10.0.0.1:80", "rq_total");
        assert!(key.starts_with(&[]));
        assert!(key.starts_with(&["clusterA"]));
        assert!(key.starts_with(&["clusterA", "10.0.0.1:80"]));
        assert!(!key.starts_with(&["clusterB"]));
        assert!(!key.starts_with(&["clusterA", "10.0.0.1:80", "rq_total", "extra"]));
    }

    #[test]
    fn test_segment_equality_is_exact() {
        let key = ClusterKey::new("cluster", "ns", "stat");
        assert!(!key.starts_with(&["clust"]));
        assert!(!key.starts_with(&["Cluster"]));
    }
}
