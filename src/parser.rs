//! Parsers for the two plain-text admin formats
//!
//! Both parsers are tolerant: lines that don't have the expected shape are
//! dropped silently. Admin output routinely ends with a blank line and the
//! stats dump contains histogram summaries that are not integers.

use crate::types::{ClusterKey, FlatKey, MetricKey, MetricSample, SampleValue};

/// Converts one raw response body into samples for a store keyed by `Key`
pub trait SnapshotParser: Send + Sync + 'static {
    type Key: MetricKey;

    /// Parse a whole body; sample order follows line order
    fn parse(&self, body: &str) -> Vec<MetricSample<Self::Key>>;
}

/// `/stats` format: one `name:value` per line, integers only
///
/// Splits on the first colon, so names never contain one and values may.
/// Non-integer values are dropped; this format has no scalar fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatStatsParser;

impl FlatStatsParser {
    /// Parse a single line
    #[must_use]
    pub fn parse_line(line: &str) -> Option<MetricSample<FlatKey>> {
        let (name, value) = line.trim_end_matches('\r').split_once(':')?;
        if name.is_empty() {
            return None;
        }
        let value = value.trim().parse::<i64>().ok()?;
        Some(MetricSample::numeric(FlatKey::new(name), value))
    }
}

impl SnapshotParser for FlatStatsParser {
    type Key = FlatKey;

    fn parse(&self, body: &str) -> Vec<MetricSample<FlatKey>> {
        body.lines().filter_map(Self::parse_line).collect()
    }
}

/// `/clusters` format: `cluster::namespace::stat::value`, exactly four fields
///
/// Integer values become numeric samples, plain decimals are truncated toward
/// zero, and anything else (health flags, zone names) becomes a scalar
/// carrying the literal text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterStatsParser;

impl ClusterStatsParser {
    /// Field delimiter
    pub const DELIMITER: &'static str = "::";

    /// Parse a single line
    #[must_use]
    pub fn parse_line(line: &str) -> Option<MetricSample<ClusterKey>> {
        let line = line.trim_end_matches('\r');
        let mut fields = line.split(Self::DELIMITER);
        let (Some(cluster), Some(namespace), Some(stat), Some(raw), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return None;
        };

        Some(MetricSample {
            key: ClusterKey::new(cluster, namespace, stat),
            value: SampleValue::classify(raw),
        })
    }
}

impl SnapshotParser for ClusterStatsParser {
    type Key = ClusterKey;

    fn parse(&self, body: &str) -> Vec<MetricSample<ClusterKey>> {
        body.lines().filter_map(Self::parse_line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_parses_name_value() {
        let sample = FlatStatsParser::parse_line("server.uptime:42").unwrap();
        assert_eq!(sample, MetricSample::numeric(FlatKey::new("server.uptime"), 42));
    }

    #[test]
    fn test_flat_tolerates_space_after_colon() {
        let sample = FlatStatsParser::parse_line("cluster.a.upstream_cx_active: 3").unwrap();
        assert_eq!(sample.value, SampleValue::Numeric(3));
    }

    #[test]
    fn test_flat_splits_on_first_colon_only() {
        // Value keeps the remaining colons and so fails integer parsing
        assert!(FlatStatsParser::parse_line("a:1:2").is_none());
    }

    #[test]
    fn test_flat_drops_malformed_lines() {
        assert!(FlatStatsParser::parse_line("server.version").is_none());
        assert!(FlatStatsParser::parse_line(":5").is_none());
        assert!(FlatStatsParser::parse_line("").is_none());
        assert!(FlatStatsParser::parse_line("server.version: 1.27.0-dev").is_none());
        assert!(
            FlatStatsParser::parse_line("http.rq_time: P0(nan,0) P25(nan,1)").is_none()
        );
    }

    #[test]
    fn test_flat_body() {
        let body = "server.uptime: 10\nserver.version\nserver.live: 1\r\n\n";
        let samples = FlatStatsParser.parse(body);
        assert_eq!(
            samples,
            vec![
                MetricSample::numeric(FlatKey::new("server.uptime"), 10),
                MetricSample::numeric(FlatKey::new("server.live"), 1),
            ]
        );
    }

    #[test]
    fn test_cluster_numeric_line() {
        let sample = ClusterStatsParser::parse_line("clusterA::10.0.0.1:80::rq_total::17").unwrap();
        assert_eq!(
            sample,
            MetricSample::numeric(ClusterKey::new("clusterA", "10.0.0.1:80", "rq_total"), 17)
        );
    }

    #[test]
    fn test_cluster_scalar_line() {
        let sample =
            ClusterStatsParser::parse_line("clusterA::10.0.0.1:80::health_flags::healthy").unwrap();
        assert_eq!(
            sample.value,
            SampleValue::Scalar("healthy".to_string())
        );
    }

    #[test]
    fn test_cluster_decimal_line() {
        let sample =
            ClusterStatsParser::parse_line("clusterA::10.0.0.1:80::success_rate::-1.0").unwrap();
        assert_eq!(sample.value, SampleValue::Numeric(-1));

        let sample =
            ClusterStatsParser::parse_line("clusterA::10.0.0.1:80::success_rate::99.2").unwrap();
        assert_eq!(sample.value, SampleValue::Numeric(99));

        // Flat stats stay strict: a decimal there is dropped
        assert!(FlatStatsParser::parse_line("cluster.a.success_rate: 99.2").is_none());
    }

    #[test]
    fn test_cluster_wrong_field_count_dropped() {
        assert!(ClusterStatsParser::parse_line("clusterA::rq_total::17").is_none());
        assert!(ClusterStatsParser::parse_line("clusterA::added_via_api::false").is_none());
        assert!(ClusterStatsParser::parse_line("a::b::c::d::e").is_none());
        assert!(ClusterStatsParser::parse_line("").is_none());
    }

    #[test]
    fn test_cluster_body() {
        let body = "\
clusterA::default_priority::max_connections::1024
clusterA::added_via_api::false
clusterA::10.0.0.1:80::cx_active::2
clusterA::10.0.0.1:80::zone::us-east-1a

";
        let samples = ClusterStatsParser.parse(body);
        assert_eq!(samples.len(), 3);
        assert_eq!(
            samples[0].key,
            ClusterKey::new("clusterA", "default_priority", "max_connections")
        );
        assert_eq!(samples[1].value, SampleValue::Numeric(2));
        assert_eq!(samples[2].value, SampleValue::Scalar("us-east-1a".into()));
    }
}
