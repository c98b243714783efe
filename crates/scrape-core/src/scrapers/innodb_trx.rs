//! Scrape `information_schema.innodb_trx`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::database::Database;
use crate::descriptor::{Descriptor, DescriptorRegistry, INFORMATION_SCHEMA};
use crate::error::Result;
use crate::pipeline;
use crate::point::MetricPoint;
use crate::row::Row;
use crate::scraper::{QueryScraper, Scraper};
use crate::sink::MetricSink;

const INNODB_TRX_QUERY: &str = r#"
	select /* */
		ifnull(sum(case when TIMEDIFF(now(),trx_started) >= '00:00:05' then 1 else 0 end ),0) as "5_sec_count",
		ifnull(sum(case when TIMEDIFF(now(),trx_started) >= '00:00:30' then 1 else 0  end ),0) as "30_sec_count",
		ifnull(sum(case when TIMEDIFF(now(),trx_started) >= '00:01:00' then 1 else 0  end ),0) as "60_sec_count"
	from information_schema.innodb_trx trx
	"#;

/// Period labels, in column order.
const PERIODS: [&str; 3] = ["5", "30", "60"];

/// Counts open transactions older than 5, 30 and 60 seconds.
pub struct InnodbTrx {
    trx_count: Arc<Descriptor>,
}

impl InnodbTrx {
    pub fn new(descriptors: &mut DescriptorRegistry) -> Result<Self> {
        let trx_count = descriptors.define(
            INFORMATION_SCHEMA,
            "trx_count_per_sec",
            "Number of transactions performed over (period) seconds.",
            &["period"],
        )?;
        Ok(Self { trx_count })
    }
}

#[async_trait]
impl Scraper for InnodbTrx {
    fn name(&self) -> &'static str {
        "info_schema.innodb_trx"
    }

    fn help(&self) -> &'static str {
        "Collect metrics from information_schema.innodb_trx"
    }

    fn version(&self) -> f64 {
        5.6
    }

    async fn scrape(
        &self,
        cancel: &CancellationToken,
        db: &dyn Database,
        sink: &MetricSink,
    ) -> Result<()> {
        pipeline::execute(self, cancel, db, sink).await.map(|_| ())
    }
}

impl QueryScraper for InnodbTrx {
    fn query(&self) -> &'static str {
        INNODB_TRX_QUERY
    }

    fn decode(&self, row: &Row, points: &mut Vec<MetricPoint>) -> Result<()> {
        for (column, period) in PERIODS.iter().enumerate() {
            let count: u64 = row.get(column)?;
            points.push(MetricPoint::gauge(&self.trx_count, count as f64, [*period]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::mock::MockDatabase;
    use crate::point::MetricKind;
    use crate::row;
    use crate::sink;

    fn scraper() -> InnodbTrx {
        InnodbTrx::new(&mut DescriptorRegistry::default()).unwrap()
    }

    #[test]
    fn test_metadata() {
        let s = scraper();
        let s: &dyn Scraper = &s;
        assert_eq!(s.name(), "info_schema.innodb_trx");
        assert_eq!(s.version(), 5.6);
        assert!(s.help().contains("innodb_trx"));
    }

    #[tokio::test]
    async fn test_one_row_three_periods() {
        let db = MockDatabase::new().with_rows(INNODB_TRX_QUERY, vec![row![5u64, 2u64, 0u64]]);
        let (sink, mut receiver) = sink::channel(8);

        scraper()
            .scrape(&CancellationToken::new(), &db, &sink)
            .await
            .unwrap();

        let points = receiver.try_drain();
        assert_eq!(points.len(), 3);
        for point in &points {
            assert_eq!(
                point.descriptor().fq_name(),
                "mysql_info_schema_trx_count_per_sec"
            );
            assert_eq!(point.kind(), MetricKind::Gauge);
        }
        let observed: Vec<(f64, &str)> = points
            .iter()
            .map(|p| (p.value(), p.label_values()[0].as_str()))
            .collect();
        assert_eq!(observed, vec![(5.0, "5"), (2.0, "30"), (0.0, "60")]);
    }

    #[tokio::test]
    async fn test_decimal_sums_decode() {
        // SUM() comes back as DECIMAL text from the driver.
        let db = MockDatabase::new().with_rows(INNODB_TRX_QUERY, vec![row!["7", "3", "1"]]);
        let (sink, mut receiver) = sink::channel(8);

        scraper()
            .scrape(&CancellationToken::new(), &db, &sink)
            .await
            .unwrap();

        let values: Vec<f64> = receiver.try_drain().iter().map(|p| p.value()).collect();
        assert_eq!(values, vec![7.0, 3.0, 1.0]);
    }

    #[tokio::test]
    async fn test_null_count_fails() {
        let db = MockDatabase::new()
            .with_rows(INNODB_TRX_QUERY, vec![row![5u64, None::<u64>, 0u64]]);
        let (sink, mut receiver) = sink::channel(8);

        let err = scraper()
            .scrape(&CancellationToken::new(), &db, &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Decode { column: 1, .. }));
        assert!(receiver.try_drain().is_empty());
        assert_eq!(db.cursors_closed(), 1);
    }
}
