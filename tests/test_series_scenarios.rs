//! End-to-end scenarios: raw admin text through the parsers into a store,
//! then out through the query facade

use envoy_dash::types::BufferSize;
use envoy_dash::{
    ClusterKey, ClusterStatsParser, FlatKey, FlatStatsParser, QueryError, QueryFacade,
    SharedStore, SnapshotParser, StatFilter, StatValue,
};

fn flat(capacity: usize, bodies: &[&str]) -> QueryFacade<FlatKey> {
    let store = SharedStore::new(BufferSize::new(capacity).unwrap());
    for (cycle, body) in bodies.iter().enumerate() {
        store.ingest(format!("12:00:0{}", cycle), FlatStatsParser.parse(body));
    }
    QueryFacade::new(store)
}

fn values(series: Option<envoy_dash::Series>) -> Vec<i64> {
    series.map(|s| s.values()).unwrap_or_default()
}

#[test]
fn test_three_slot_buffer_walks() {
    let key = FlatKey::new("http.ingress.downstream_rq_total");
    let stats = flat(
        3,
        &[
            "http.ingress.downstream_rq_total:10\n",
            "http.ingress.downstream_rq_total:12\n",
            "http.ingress.downstream_rq_total:15\n",
        ],
    );

    // Cursor sits on the slot holding 15. The delta walk visits only the
    // slot after the cursor's successor, and the gauge walk stops short of
    // the cursor itself.
    assert_eq!(stats.cursor(), Some(2));
    assert_eq!(values(stats.delta_series(&key).unwrap()), [2]);
    assert_eq!(values(stats.gauge_series(&key).unwrap()), [10, 12]);
    assert_eq!(stats.latest_delta(&key).unwrap(), Some(3));
}

#[test]
fn test_three_slot_buffer_after_wrap() {
    let key = FlatKey::new("http.ingress.downstream_rq_total");
    let stats = flat(
        3,
        &[
            "http.ingress.downstream_rq_total:10\n",
            "http.ingress.downstream_rq_total:12\n",
            "http.ingress.downstream_rq_total:15\n",
            "http.ingress.downstream_rq_total:21\n",
        ],
    );

    // One more cycle brings 12 and 15 into the window: delta 15-12, gauge [12, 15]
    assert_eq!(stats.cursor(), Some(0));
    assert_eq!(values(stats.delta_series(&key).unwrap()), [3]);
    assert_eq!(values(stats.gauge_series(&key).unwrap()), [12, 15]);

    let timestamps: Vec<String> = stats
        .gauge_series(&key)
        .unwrap()
        .unwrap()
        .timestamps()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(timestamps, ["12:00:01", "12:00:02"]);
}

#[test]
fn test_flat_round_trip() {
    let stats = flat(20, &["server.uptime:42\nserver.version\n"]);
    assert_eq!(stats.value_of("server.uptime").unwrap(), StatValue::Numeric(42));
    assert_eq!(
        stats.value_of("server.version"),
        Err(QueryError::UnknownSeries("server.version".into()))
    );
    assert!(!stats.store().read(|s| s.contains(&FlatKey::new("server.version"))));
}

#[test]
fn test_cluster_round_trip() {
    let store = SharedStore::new(BufferSize::DEFAULT);
    store.ingest(
        "12:00:00",
        ClusterStatsParser.parse("clusterA::10.0.0.1:80::rq_total::17\nclusterA::rq_total::17\n"),
    );
    let clusters = QueryFacade::new(store);

    assert_eq!(
        clusters
            .current_value(&ClusterKey::new("clusterA", "10.0.0.1:80", "rq_total"))
            .unwrap(),
        StatValue::Numeric(17)
    );
    assert_eq!(clusters.names_under(&["clusterA"]), ["10.0.0.1:80"]);
    assert_eq!(clusters.stat_names("clusterA", "10.0.0.1:80"), ["rq_total"]);
}

#[test]
fn test_unknown_series_is_reported_not_fatal() {
    let stats = flat(5, &["a:1\n", "a:2\n", "a:4\n"]);
    let missing = FlatKey::new("no.such.stat");

    assert_eq!(
        stats.current_value(&missing),
        Err(QueryError::UnknownSeries("no.such.stat".into()))
    );
    assert!(matches!(
        stats.delta_series(&missing),
        Err(QueryError::UnknownSeries(_))
    ));
    assert!(matches!(
        stats.gauge_series(&missing),
        Err(QueryError::UnknownSeries(_))
    ));
    assert_eq!(stats.current_value_text(&missing), "err - no.such.stat");
}

#[test]
fn test_scalar_series_has_no_chart() {
    let store = SharedStore::new(BufferSize::DEFAULT);
    store.ingest(
        "12:00:00",
        ClusterStatsParser.parse("c::10.0.0.1:80::health_flags::healthy\n"),
    );
    let clusters = QueryFacade::new(store);
    let key = ClusterKey::new("c", "10.0.0.1:80", "health_flags");

    assert_eq!(
        clusters.current_value(&key).unwrap(),
        StatValue::Scalar("healthy".into())
    );
    assert!(matches!(
        clusters.delta_series(&key),
        Err(QueryError::NotNumeric(_))
    ));
}

#[test]
fn test_kind_conflict_keeps_first_kind() {
    let store = SharedStore::new(BufferSize::DEFAULT);
    let first = store.ingest(
        "12:00:00",
        ClusterStatsParser.parse("c::h::cx_active::3\n"),
    );
    assert_eq!(first.conflicts, 0);

    let second = store.ingest(
        "12:00:01",
        ClusterStatsParser.parse("c::h::cx_active::unknown\nc::h::rq_total::1\n"),
    );
    assert_eq!(second.written, 1);
    assert_eq!(second.conflicts, 1);

    let clusters = QueryFacade::new(store);
    // Still numeric; this cycle simply has no sample for it
    assert_eq!(
        clusters
            .current_value(&ClusterKey::new("c", "h", "cx_active"))
            .unwrap(),
        StatValue::Unset
    );
}

#[test]
fn test_stats_table_with_filters() {
    let stats = flat(
        5,
        &["cluster.a.upstream_rq_total:5\ncluster.b.upstream_rq_total:9\nserver.uptime:1\n"],
    );

    let all = stats.stats_table(&StatFilter::All);
    assert_eq!(all.header(), &["Stat Name".to_string(), "Stat Value".to_string()]);
    assert_eq!(all.len(), 3);
    assert_eq!(all.rows().len(), 4);
    assert_eq!(all.body()[0], ["cluster.a.upstream_rq_total", "5"]);

    let substring = stats.stats_table(&StatFilter::Substring("uptime".into()));
    assert_eq!(substring.body(), [["server.uptime".to_string(), "1".to_string()]]);

    let pattern = stats.stats_table(&StatFilter::pattern(r"^cluster\.b\.").unwrap());
    assert_eq!(pattern.body().len(), 1);

    // An unbalanced pattern falls back to literal matching
    let fallback = stats.stats_table(&StatFilter::from_search("rq_total("));
    assert!(fallback.body().is_empty());

    assert_eq!(
        stats.stat_names_with_prefix("cluster.").into_iter().collect::<Vec<_>>(),
        ["upstream_rq_total"]
    );
}
