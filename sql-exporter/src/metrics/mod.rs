//! Metric exposition.

pub mod prometheus;

pub use prometheus::PrometheusEncoder;
