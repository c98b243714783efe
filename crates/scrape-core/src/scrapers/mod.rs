//! Concrete scrapers and the registry the orchestrator selects them from.

mod aurora_host_status;
mod innodb_trx;

pub use aurora_host_status::AuroraHostStatus;
pub use innodb_trx::InnodbTrx;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::descriptor::DescriptorRegistry;
use crate::error::Result;
use crate::scraper::Scraper;

/// Scrapers keyed by their unique name.
#[derive(Default, Clone)]
pub struct ScraperRegistry {
    scrapers: BTreeMap<&'static str, Arc<dyn Scraper>>,
}

impl ScraperRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            scrapers: BTreeMap::new(),
        }
    }

    /// Create a registry with every built-in scraper, defining their
    /// descriptors in `descriptors`.
    pub fn with_defaults(descriptors: &mut DescriptorRegistry) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(InnodbTrx::new(descriptors)?));
        registry.register(Arc::new(AuroraHostStatus::new(descriptors)?));
        Ok(registry)
    }

    /// Register a scraper. Returns false if the name is already taken.
    pub fn register(&mut self, scraper: Arc<dyn Scraper>) -> bool {
        let name = scraper.name();
        if self.scrapers.contains_key(name) {
            return false;
        }
        self.scrapers.insert(name, scraper);
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Scraper>> {
        self.scrapers.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.scrapers.keys().copied().collect()
    }

    /// Keep only the scrapers whose name satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.scrapers.retain(|name, _| keep(name));
    }

    /// Scrapers whose minimum version is at or below `engine_version`.
    pub fn compatible_with(&self, engine_version: f64) -> Vec<Arc<dyn Scraper>> {
        self.scrapers
            .values()
            .filter(|s| s.version() <= engine_version)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Scraper>> {
        self.scrapers.values()
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}
