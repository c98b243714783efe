//! Collection cycle.
//!
//! One cycle probes the engine, version-gates the registered scrapers, runs
//! every remaining scraper concurrently against one shared sink and adds the
//! exporter's own `up` / success / duration gauges.
//!
//! The cycle deadline is enforced here and only here: when it expires the
//! cycle token is cancelled and every in-flight scraper observes it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use scrape_core::{
    CancellationToken, Database, Descriptor, DescriptorRegistry, MetricPoint, ScraperRegistry,
};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info_span, warn};

use crate::config::ExporterConfig;
use crate::database::detect_engine_version;
use crate::error::Result;

const NO_LABELS: [&str; 0] = [];

/// Per-cycle limits.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Deadline for the whole cycle, engine probe included.
    pub timeout: Duration,
    pub sink_capacity: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            sink_capacity: 1024,
        }
    }
}

impl From<&ExporterConfig> for CollectionConfig {
    fn from(config: &ExporterConfig) -> Self {
        Self {
            timeout: config.scrape_timeout,
            sink_capacity: config.sink_capacity,
        }
    }
}

/// Result of one scraper in one cycle.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub name: &'static str,
    pub duration: Duration,
    /// `None` on success.
    pub error: Option<String>,
}

impl ScrapeOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one cycle produced.
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    /// `None` when the engine could not be reached.
    pub engine_version: Option<f64>,
    /// Scraper points in arrival order, followed by the exporter's own gauges.
    pub points: Vec<MetricPoint>,
    /// Outcomes sorted by scraper name.
    pub outcomes: Vec<ScrapeOutcome>,
}

impl CollectionReport {
    pub fn up(&self) -> bool {
        self.engine_version.is_some()
    }

    pub fn outcome(&self, name: &str) -> Option<&ScrapeOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// Descriptors for the exporter's own gauges.
#[derive(Debug)]
struct ExporterDescriptors {
    up: Arc<Descriptor>,
    collector_success: Arc<Descriptor>,
    collector_duration: Arc<Descriptor>,
}

impl ExporterDescriptors {
    fn new(descriptors: &mut DescriptorRegistry) -> Result<Self> {
        Ok(Self {
            up: descriptors.define("", "up", "Whether the MySQL server is up.", &[])?,
            collector_success: descriptors.define(
                "exporter",
                "collector_success",
                "Whether a collector succeeded.",
                &["collector"],
            )?,
            collector_duration: descriptors.define(
                "exporter",
                "collector_duration_seconds",
                "Collector time duration.",
                &["collector"],
            )?,
        })
    }
}

/// Runs collection cycles over a fixed set of scrapers.
pub struct Exporter {
    scrapers: ScraperRegistry,
    descriptors: Arc<DescriptorRegistry>,
    own: ExporterDescriptors,
    config: CollectionConfig,
    shutdown: CancellationToken,
}

impl Exporter {
    /// Create an exporter.
    ///
    /// `descriptors` must already hold the scrapers' descriptors; the
    /// exporter adds its own and freezes the registry.
    pub fn new(
        scrapers: ScraperRegistry,
        mut descriptors: DescriptorRegistry,
        config: CollectionConfig,
    ) -> Result<Self> {
        let own = ExporterDescriptors::new(&mut descriptors)?;
        Ok(Self {
            scrapers,
            descriptors: Arc::new(descriptors),
            own,
            config,
            shutdown: CancellationToken::new(),
        })
    }

    /// Cancel in-flight cycles when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn scrapers(&self) -> &ScraperRegistry {
        &self.scrapers
    }

    pub fn descriptors(&self) -> &Arc<DescriptorRegistry> {
        &self.descriptors
    }

    /// Run one collection cycle against `db`.
    pub async fn collect(&self, db: Arc<dyn Database>) -> CollectionReport {
        let cancel = self.shutdown.child_token();
        // Cancelling on drop also stops the deadline task below.
        let _cycle_guard = cancel.clone().drop_guard();
        self.spawn_deadline(cancel.clone());

        let mut report = CollectionReport::default();

        let engine_version = match detect_engine_version(db.as_ref(), &cancel).await {
            Ok(version) => version,
            Err(e) => {
                warn!(error = %e, "Engine unreachable, skipping scrapers");
                report
                    .points
                    .push(MetricPoint::gauge(&self.own.up, 0.0, NO_LABELS));
                return report;
            }
        };
        report.engine_version = Some(engine_version);

        let scrapers = self.scrapers.compatible_with(engine_version);
        if scrapers.len() < self.scrapers.len() {
            debug!(
                engine_version,
                skipped = self.scrapers.len() - scrapers.len(),
                "Skipping scrapers newer than the engine"
            );
        }

        let (sink, mut receiver) = scrape_core::channel(self.config.sink_capacity);
        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();
        let started = Instant::now();

        for scraper in scrapers {
            let name = scraper.name();
            let db = db.clone();
            let sink = sink.clone();
            let cancel = cancel.clone();
            let span = info_span!("scrape", collector = name);

            let handle = tasks.spawn(
                async move {
                    let start = Instant::now();
                    let result = scraper.scrape(&cancel, db.as_ref(), &sink).await;
                    (name, start.elapsed(), result)
                }
                .instrument(span),
            );
            names.insert(handle.id(), name);
        }
        // The stream ends once every scraper task has dropped its clone.
        drop(sink);

        while let Some(point) = receiver.recv().await {
            report.points.push(point);
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok((name, duration, Ok(()))) => {
                    debug!(collector = name, ?duration, "Scrape succeeded");
                    ScrapeOutcome {
                        name,
                        duration,
                        error: None,
                    }
                }
                Ok((name, duration, Err(e))) => {
                    warn!(collector = name, ?duration, error = %e, "Scrape failed");
                    ScrapeOutcome {
                        name,
                        duration,
                        error: Some(e.to_string()),
                    }
                }
                Err(join_err) => {
                    let name = names.get(&join_err.id()).copied().unwrap_or("unknown");
                    warn!(collector = name, error = %join_err, "Scrape task aborted");
                    ScrapeOutcome {
                        name,
                        duration: started.elapsed(),
                        error: Some(join_err.to_string()),
                    }
                }
            };
            report.outcomes.push(outcome);
        }
        report.outcomes.sort_by_key(|o| o.name);

        self.push_own_gauges(&mut report);
        report
    }

    fn spawn_deadline(&self, cancel: CancellationToken) {
        let timeout = self.config.timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    warn!(?timeout, "Collection cycle deadline exceeded, cancelling scrapers");
                    cancel.cancel();
                }
            }
        });
    }

    fn push_own_gauges(&self, report: &mut CollectionReport) {
        report
            .points
            .push(MetricPoint::gauge(&self.own.up, 1.0, NO_LABELS));

        for outcome in &report.outcomes {
            let success = if outcome.success() { 1.0 } else { 0.0 };
            report.points.push(MetricPoint::gauge(
                &self.own.collector_success,
                success,
                [outcome.name],
            ));
        }
        for outcome in &report.outcomes {
            report.points.push(MetricPoint::gauge(
                &self.own.collector_duration,
                outcome.duration.as_secs_f64(),
                [outcome.name],
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use scrape_core::mock::MockDatabase;
    use scrape_core::row;

    use super::*;
    use crate::database::ENGINE_VERSION_QUERY;

    fn exporter() -> Exporter {
        Exporter::new(
            ScraperRegistry::new(),
            DescriptorRegistry::default(),
            CollectionConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_config_from_exporter_config() {
        let config = CollectionConfig::from(&ExporterConfig {
            scrape_timeout: Duration::from_secs(3),
            sink_capacity: 16,
            ..ExporterConfig::default()
        });
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.sink_capacity, 16);
    }

    #[test]
    fn test_own_descriptors_registered() {
        let exporter = exporter();
        let descriptors = exporter.descriptors();

        assert!(descriptors.get("mysql_up").is_some());
        assert!(descriptors.get("mysql_exporter_collector_success").is_some());
        assert!(
            descriptors
                .get("mysql_exporter_collector_duration_seconds")
                .is_some()
        );
    }

    #[test]
    fn test_conflicting_up_descriptor_rejected() {
        let mut descriptors = DescriptorRegistry::default();
        descriptors
            .define("", "up", "Something else.", &["instance"])
            .unwrap();

        let result = Exporter::new(
            ScraperRegistry::new(),
            descriptors,
            CollectionConfig::default(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_registry_reports_up_only() {
        let db = MockDatabase::new().with_rows(ENGINE_VERSION_QUERY, vec![row!["8.0.35"]]);

        let report = exporter().collect(Arc::new(db)).await;

        assert!(report.up());
        assert!(report.outcomes.is_empty());
        assert_eq!(report.points.len(), 1);
        assert_eq!(report.points[0].descriptor().fq_name(), "mysql_up");
        assert_eq!(report.points[0].value(), 1.0);
    }
}
