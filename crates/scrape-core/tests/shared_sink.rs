//! Scrapers running concurrently against one shared sink.

use std::sync::Arc;
use std::time::Duration;

use scrape_core::mock::MockDatabase;
use scrape_core::scrapers::{AuroraHostStatus, InnodbTrx};
use scrape_core::{
    CancellationToken, DescriptorRegistry, MetricPoint, QueryScraper, Scraper, ScraperRegistry,
    channel, row,
};

/// Build the default registry and a mock answering each scraper's query.
fn scripted(aurora_fails: bool) -> (ScraperRegistry, MockDatabase) {
    let mut descriptors = DescriptorRegistry::default();
    let innodb_trx = InnodbTrx::new(&mut descriptors).unwrap();
    let aurora = AuroraHostStatus::new(&mut descriptors).unwrap();

    let mut db = MockDatabase::new().with_rows(innodb_trx.query(), vec![row![5u64, 2u64, 0u64]]);
    db = if aurora_fails {
        db.with_error(aurora.query(), "Unknown table 'replica_host_status'")
    } else {
        db.with_rows(
            aurora.query(),
            vec![row!["i-1", 12.5_f64, 3.0_f64], row!["i-2", 40.0_f64, 0.0_f64]],
        )
    };

    let mut registry = ScraperRegistry::new();
    registry.register(Arc::new(innodb_trx));
    registry.register(Arc::new(aurora));
    (registry, db)
}

async fn run_all(
    registry: &ScraperRegistry,
    db: Arc<MockDatabase>,
) -> (Vec<MetricPoint>, Vec<(&'static str, bool)>) {
    let (sink, mut receiver) = channel(4);
    let cancel = CancellationToken::new();
    let mut tasks = tokio::task::JoinSet::new();

    for scraper in registry.iter().cloned() {
        let db = db.clone();
        let sink = sink.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let result = scraper.scrape(&cancel, db.as_ref(), &sink).await;
            (scraper.name(), result.is_ok())
        });
    }
    drop(sink);

    let mut points = Vec::new();
    while let Some(point) = receiver.recv().await {
        points.push(point);
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.expect("scraper task panicked"));
    }
    outcomes.sort();
    (points, outcomes)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_scrapers_share_one_sink() {
    let (registry, db) = scripted(false);
    let db = Arc::new(db);

    let (points, outcomes) = run_all(&registry, db.clone()).await;

    assert_eq!(
        outcomes,
        vec![
            ("info_schema.aurora_stats", true),
            ("info_schema.innodb_trx", true)
        ]
    );
    assert_eq!(points.len(), 3 + 4);

    // Per-scraper order survives interleaving.
    let trx: Vec<f64> = points
        .iter()
        .filter(|p| p.descriptor().fq_name().ends_with("trx_count_per_sec"))
        .map(MetricPoint::value)
        .collect();
    assert_eq!(trx, vec![5.0, 2.0, 0.0]);

    let aurora_ids: Vec<&str> = points
        .iter()
        .filter(|p| p.descriptor().fq_name().contains("aurora"))
        .map(|p| p.label_values()[0].as_str())
        .collect();
    assert_eq!(aurora_ids, vec!["i-1", "i-1", "i-2", "i-2"]);

    assert_eq!(db.cursors_opened(), db.cursors_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_scraper_is_isolated() {
    let (registry, db) = scripted(true);
    let db = Arc::new(db);

    let (points, outcomes) = run_all(&registry, db.clone()).await;

    assert_eq!(
        outcomes,
        vec![
            ("info_schema.aurora_stats", false),
            ("info_schema.innodb_trx", true)
        ]
    );
    assert_eq!(points.len(), 3);
    assert!(
        points
            .iter()
            .all(|p| p.descriptor().fq_name() == "mysql_info_schema_trx_count_per_sec")
    );
}

#[tokio::test]
async fn cancelled_cycle_emits_nothing() {
    let registry = ScraperRegistry::with_defaults(&mut DescriptorRegistry::default()).unwrap();
    let db = MockDatabase::new().with_latency(Duration::from_secs(30));
    let (sink, mut receiver) = channel(4);
    let cancel = CancellationToken::new();
    cancel.cancel();

    for scraper in registry.iter() {
        let err = scraper.scrape(&cancel, &db, &sink).await.unwrap_err();
        assert!(err.is_cancelled());
    }
    assert!(receiver.try_drain().is_empty());
}
