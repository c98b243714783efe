//! Exporter configuration.
//!
//! Loaded from environment variables (a `.env` file is honoured by `main`),
//! falling back to defaults:
//!
//! - `DATABASE_URL` (required, e.g. `mysql://exporter:pw@localhost:3306`)
//! - `DATABASE_MAX_CONNECTIONS`
//! - `EXPORTER_BIND_ADDRESS` / `EXPORTER_PORT`
//! - `EXPORTER_NAMESPACE`
//! - `EXPORTER_SCRAPE_TIMEOUT_SECS`
//! - `EXPORTER_SINK_CAPACITY`
//! - `EXPORTER_COLLECTORS` (comma separated; empty enables every collector)
//! - `EXPORTER_DISABLED_COLLECTORS` (comma separated)
//! - `EXPORTER_LOG_DIR` (enables the rolling file log)

use std::time::Duration;

use scrape_core::ScraperRegistry;

use crate::error::{Error, Result};

/// Exporter configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExporterConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_address: String,
    pub port: u16,
    /// Metric namespace, the first segment of every metric name.
    pub namespace: String,
    /// Deadline for one whole collection cycle.
    pub scrape_timeout: Duration,
    pub sink_capacity: usize,
    /// Collectors to run. Empty means all registered ones.
    pub collectors: Vec<String>,
    pub disabled_collectors: Vec<String>,
    pub log_dir: Option<String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: 3,
            bind_address: "0.0.0.0".to_string(),
            port: 9104,
            namespace: scrape_core::NAMESPACE.to_string(),
            scrape_timeout: Duration::from_secs(10),
            sink_capacity: 1024,
            collectors: Vec::new(),
            disabled_collectors: Vec::new(),
            log_dir: None,
        }
    }
}

impl ExporterConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        config.database_url =
            get("DATABASE_URL").ok_or_else(|| Error::config("DATABASE_URL is not set"))?;

        if let Some(v) = get("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = parse_number("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = get("EXPORTER_BIND_ADDRESS") {
            config.bind_address = v;
        }
        if let Some(v) = get("EXPORTER_PORT") {
            config.port = parse_number("EXPORTER_PORT", &v)?;
        }
        if let Some(v) = get("EXPORTER_NAMESPACE") {
            config.namespace = v;
        }
        if let Some(v) = get("EXPORTER_SCRAPE_TIMEOUT_SECS") {
            let secs: u64 = parse_number("EXPORTER_SCRAPE_TIMEOUT_SECS", &v)?;
            if secs == 0 {
                return Err(Error::config("EXPORTER_SCRAPE_TIMEOUT_SECS must be positive"));
            }
            config.scrape_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("EXPORTER_SINK_CAPACITY") {
            config.sink_capacity = parse_number("EXPORTER_SINK_CAPACITY", &v)?;
        }
        if let Some(v) = get("EXPORTER_COLLECTORS") {
            config.collectors = split_list(&v);
        }
        if let Some(v) = get("EXPORTER_DISABLED_COLLECTORS") {
            config.disabled_collectors = split_list(&v);
        }
        config.log_dir = get("EXPORTER_LOG_DIR");

        Ok(config)
    }

    /// Narrow `registry` to the configured collectors.
    ///
    /// Naming a collector that is not registered is an error, so typos do
    /// not silently disable metrics.
    pub fn apply_to(&self, registry: &mut ScraperRegistry) -> Result<()> {
        let known = registry.names();
        for name in self.collectors.iter().chain(&self.disabled_collectors) {
            if !known.contains(&name.as_str()) {
                return Err(Error::config(format!(
                    "unknown collector '{}', available: {}",
                    name,
                    known.join(", ")
                )));
            }
        }

        registry.retain(|name| {
            let enabled = self.collectors.is_empty() || self.collectors.iter().any(|c| c == name);
            enabled && !self.disabled_collectors.iter().any(|c| c == name)
        });
        Ok(())
    }

    /// Socket address string for the HTTP listener.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::config(format!("invalid {} '{}': {}", key, value, e)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use scrape_core::DescriptorRegistry;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ExporterConfig::from_lookup(lookup(&[("DATABASE_URL", "mysql://localhost")]))
            .unwrap();

        assert_eq!(config.database_url, "mysql://localhost");
        assert_eq!(config.port, 9104);
        assert_eq!(config.namespace, "mysql");
        assert_eq!(config.scrape_timeout, Duration::from_secs(10));
        assert!(config.collectors.is_empty());
        assert!(config.log_dir.is_none());
        assert_eq!(config.listen_address(), "0.0.0.0:9104");
    }

    #[test]
    fn test_missing_database_url() {
        let err = ExporterConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ExporterConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "mysql://db"),
            ("EXPORTER_PORT", "9200"),
            ("EXPORTER_SCRAPE_TIMEOUT_SECS", "3"),
            ("EXPORTER_COLLECTORS", "info_schema.innodb_trx, info_schema.aurora_stats,"),
            ("EXPORTER_LOG_DIR", "/var/log/exporter"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9200);
        assert_eq!(config.scrape_timeout, Duration::from_secs(3));
        assert_eq!(
            config.collectors,
            vec!["info_schema.innodb_trx", "info_schema.aurora_stats"]
        );
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/exporter"));
    }

    #[test]
    fn test_invalid_port() {
        let err = ExporterConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "mysql://db"),
            ("EXPORTER_PORT", "http"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("EXPORTER_PORT"));
    }

    #[test]
    fn test_apply_to_registry() {
        let mut registry =
            ScraperRegistry::with_defaults(&mut DescriptorRegistry::default()).unwrap();
        let config = ExporterConfig {
            disabled_collectors: vec!["info_schema.aurora_stats".to_string()],
            ..ExporterConfig::default()
        };

        config.apply_to(&mut registry).unwrap();
        assert_eq!(registry.names(), vec!["info_schema.innodb_trx"]);
    }

    #[test]
    fn test_apply_to_rejects_unknown_collector() {
        let mut registry =
            ScraperRegistry::with_defaults(&mut DescriptorRegistry::default()).unwrap();
        let config = ExporterConfig {
            collectors: vec!["info_schema.innodb_lock_waits".to_string()],
            ..ExporterConfig::default()
        };

        let err = config.apply_to(&mut registry).unwrap_err();
        assert!(err.to_string().contains("innodb_lock_waits"));
        assert_eq!(registry.len(), 2);
    }
}
