//! Prometheus text exposition format.
//!
//! Points are grouped into families by metric name. Families are written in
//! the order their first point arrived, with one `# HELP` / `# TYPE` header
//! each.

use std::collections::HashMap;
use std::fmt::Write;

use scrape_core::MetricPoint;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encodes metric points as Prometheus text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusEncoder;

impl PrometheusEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode `points` in Prometheus text format.
    pub fn encode(&self, points: &[MetricPoint]) -> String {
        let mut order: Vec<&str> = Vec::new();
        let mut families: HashMap<&str, Vec<&MetricPoint>> = HashMap::new();
        for point in points {
            let name = point.descriptor().fq_name();
            families
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push(point);
        }

        let mut output = String::new();
        for name in order {
            let family = &families[name];
            let first = family[0];
            self.write_header(
                &mut output,
                name,
                first.descriptor().help(),
                first.kind().as_str(),
            );
            for point in family {
                self.write_sample(&mut output, name, point);
            }
        }
        output
    }

    fn write_header(&self, output: &mut String, name: &str, help: &str, kind: &str) {
        let _ = writeln!(output, "# HELP {} {}", name, escape_help(help));
        let _ = writeln!(output, "# TYPE {} {}", name, kind);
    }

    fn write_sample(&self, output: &mut String, name: &str, point: &MetricPoint) {
        let labels_str = point
            .labels()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
            .collect::<Vec<_>>()
            .join(",");

        if labels_str.is_empty() {
            let _ = writeln!(output, "{} {}", name, format_value(point.value()));
        } else {
            let _ = writeln!(
                output,
                "{}{{{}}} {}",
                name,
                labels_str,
                format_value(point.value())
            );
        }
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;
    use scrape_core::{Descriptor, DescriptorRegistry};

    use super::*;

    fn descriptors() -> (Arc<Descriptor>, Arc<Descriptor>) {
        let mut registry = DescriptorRegistry::default();
        let up = registry.define("", "up", "Whether the MySQL server is up.", &[]).unwrap();
        let lag = registry
            .define(
                "info_schema",
                "aurora_status_replica_lag_ms",
                "The milliseconds of replica lag.",
                &["server_id"],
            )
            .unwrap();
        (up, lag)
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(PrometheusEncoder::new().encode(&[]), "");
    }

    #[test]
    fn test_encode_unlabeled_gauge() {
        let (up, _) = descriptors();
        let output = PrometheusEncoder::new().encode(&[MetricPoint::gauge(&up, 1.0, [""; 0])]);

        assert_eq!(
            output,
            "# HELP mysql_up Whether the MySQL server is up.\n\
             # TYPE mysql_up gauge\n\
             mysql_up 1\n"
        );
    }

    #[test]
    fn test_families_grouped_in_first_seen_order() {
        let (up, lag) = descriptors();
        let points = vec![
            MetricPoint::gauge(&lag, 12.5, ["replica-1"]),
            MetricPoint::gauge(&up, 1.0, [""; 0]),
            MetricPoint::gauge(&lag, 3.0, ["replica-2"]),
        ];
        let output = PrometheusEncoder::new().encode(&points);

        assert_eq!(
            output
                .matches("# TYPE mysql_info_schema_aurora_status_replica_lag_ms gauge")
                .count(),
            1
        );
        let lag_pos = output.find("aurora_status_replica_lag_ms{").unwrap();
        let up_pos = output.find("# HELP mysql_up").unwrap();
        assert!(lag_pos < up_pos);
        assert!(output.contains(
            "mysql_info_schema_aurora_status_replica_lag_ms{server_id=\"replica-1\"} 12.5\n"
        ));
        assert!(output.contains(
            "mysql_info_schema_aurora_status_replica_lag_ms{server_id=\"replica-2\"} 3\n"
        ));
    }

    #[test]
    fn test_label_values_escaped() {
        let (_, lag) = descriptors();
        let output = PrometheusEncoder::new()
            .encode(&[MetricPoint::gauge(&lag, 1.0, ["a\"b\\c\nd"])]);

        assert!(output.contains(r#"{server_id="a\"b\\c\nd"}"#));
    }

    #[rstest]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "+Inf")]
    #[case(f64::NEG_INFINITY, "-Inf")]
    #[case(0.25, "0.25")]
    #[case(42.0, "42")]
    fn test_format_value(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_value(value), expected);
    }
}
