//! Metric points.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::Descriptor;
use crate::error::{Result, ScrapeError};

/// Kind of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully-labeled observed value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    descriptor: Arc<Descriptor>,
    kind: MetricKind,
    value: f64,
    label_values: Vec<String>,
}

impl MetricPoint {
    /// Create a point.
    ///
    /// # Panics
    ///
    /// Panics if `label_values` does not match the descriptor's label arity.
    /// That is a bug in the scraper, not a runtime condition.
    pub fn new(
        descriptor: &Arc<Descriptor>,
        kind: MetricKind,
        value: f64,
        label_values: Vec<String>,
    ) -> Self {
        assert_eq!(
            descriptor.label_names().len(),
            label_values.len(),
            "label values for {} do not match its label schema",
            descriptor.fq_name()
        );
        Self {
            descriptor: descriptor.clone(),
            kind,
            value,
            label_values,
        }
    }

    /// Create a point, reporting a label arity mismatch as an error.
    pub fn try_new(
        descriptor: &Arc<Descriptor>,
        kind: MetricKind,
        value: f64,
        label_values: Vec<String>,
    ) -> Result<Self> {
        let expected = descriptor.label_names().len();
        if expected != label_values.len() {
            return Err(ScrapeError::LabelMismatch {
                metric: descriptor.fq_name().to_string(),
                expected,
                got: label_values.len(),
            });
        }
        Ok(Self {
            descriptor: descriptor.clone(),
            kind,
            value,
            label_values,
        })
    }

    /// Gauge shorthand.
    pub fn gauge<I, S>(descriptor: &Arc<Descriptor>, value: f64, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            descriptor,
            MetricKind::Gauge,
            value,
            labels.into_iter().map(Into::into).collect(),
        )
    }

    /// Counter shorthand.
    pub fn counter<I, S>(descriptor: &Arc<Descriptor>, value: f64, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            descriptor,
            MetricKind::Counter,
            value,
            labels.into_iter().map(Into::into).collect(),
        )
    }

    pub fn descriptor(&self) -> &Arc<Descriptor> {
        &self.descriptor
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// `(name, value)` label pairs in schema order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.descriptor
            .label_names()
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period_desc() -> Arc<Descriptor> {
        Arc::new(Descriptor::new("mysql_trx", "help", &["period"]))
    }

    #[test]
    fn test_gauge_point() {
        let desc = period_desc();
        let point = MetricPoint::gauge(&desc, 5.0, ["5"]);

        assert_eq!(point.kind(), MetricKind::Gauge);
        assert_eq!(point.value(), 5.0);
        assert_eq!(point.labels().collect::<Vec<_>>(), vec![("period", "5")]);
    }

    #[test]
    fn test_counter_point() {
        let desc = Arc::new(Descriptor::new("mysql_queries_total", "help", &[]));
        let point = MetricPoint::counter(&desc, 12.0, Vec::<String>::new());
        assert_eq!(point.kind().as_str(), "counter");
    }

    #[test]
    #[should_panic(expected = "do not match its label schema")]
    fn test_label_mismatch_panics() {
        let desc = period_desc();
        let _ = MetricPoint::gauge(&desc, 1.0, ["5", "extra"]);
    }

    #[test]
    fn test_try_new_reports_mismatch() {
        let desc = period_desc();
        let err = MetricPoint::try_new(&desc, MetricKind::Gauge, 1.0, vec![]).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::LabelMismatch {
                expected: 1,
                got: 0,
                ..
            }
        ));
    }
}
