//! Scrape `information_schema.replica_host_status`.

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

const AURORA_HOST_STATUS_QUERY: &str = r#"
		select
		  server_id,
		  cpu,
		  replica_lag_in_milliseconds as replica_lag
		from information_schema.replica_host_status
		where server_id = @@aurora_server_id
		"#;

/// CPU usage and replica lag of the Aurora instance we are connected to.
pub struct AuroraHostStatus {
    cpu_usage: Arc<Descriptor>,
    replica_lag: Arc<Descriptor>,
}

impl AuroraHostStatus {
    pub fn new(descriptors: &mut DescriptorRegistry) -> Result<Self> {
        let cpu_usage = descriptors.define(
            INFORMATION_SCHEMA,
            "aurora_status_cpu_usage",
            "The cpu usage of aurora instance.",
            &["server_id"],
        )?;
        let replica_lag = descriptors.define(
            INFORMATION_SCHEMA,
            "aurora_status_replica_lag_ms",
            "The milliseconds of replica lag.",
            &["server_id"],
        )?;
        Ok(Self {
            cpu_usage,
            replica_lag,
        })
    }
}

#[async_trait]
impl Scraper for AuroraHostStatus {
    fn name(&self) -> &'static str {
        "info_schema.aurora_stats"
    }

    fn help(&self) -> &'static str {
        "Only works on aurora instance"
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

impl QueryScraper for AuroraHostStatus {
    fn query(&self) -> &'static str {
        AURORA_HOST_STATUS_QUERY
    }

    fn decode(&self, row: &Row, points: &mut Vec<MetricPoint>) -> Result<()> {
        let server_id: String = row.get(0)?;
        let cpu: f64 = row.get(1)?;
        let replica_lag: f64 = row.get(2)?;

        points.push(MetricPoint::gauge(&self.cpu_usage, cpu, [server_id.clone()]));
        points.push(MetricPoint::gauge(&self.replica_lag, replica_lag, [server_id]));
        Ok(())
    }
}
