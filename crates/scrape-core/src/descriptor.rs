//! Metric descriptors and the process-wide descriptor registry.
//!
//! Descriptors are defined once while the scrapers are being constructed at
//! startup. After that the registry is shared behind an `Arc` and never
//! mutated again.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, ScrapeError};

/// Default metric namespace.
pub const NAMESPACE: &str = "mysql";

/// Subsystem for scrapers reading `information_schema` views.
pub const INFORMATION_SCHEMA: &str = "info_schema";

/// Join the non-empty parts of a metric name with `_`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Immutable identity of one metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    fq_name: String,
    help: String,
    label_names: Vec<String>,
}

impl Descriptor {
    /// Create a descriptor outside of a registry.
    pub fn new(
        fq_name: impl Into<String>,
        help: impl Into<String>,
        label_names: &[&str],
    ) -> Self {
        Self {
            fq_name: fq_name.into(),
            help: help.into(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Fully-qualified metric name.
    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// Label names in the order label values must be supplied.
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }
}

/// Registry of every descriptor the process exports.
#[derive(Debug)]
pub struct DescriptorRegistry {
    namespace: String,
    descriptors: Vec<Arc<Descriptor>>,
    by_name: HashMap<String, usize>,
}

impl DescriptorRegistry {
    /// Create an empty registry for the given namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            descriptors: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Define a descriptor under this registry's namespace.
    ///
    /// Defining the same name twice with an identical schema hands back the
    /// existing descriptor, so scrapers sharing a family can both call this.
    pub fn define(
        &mut self,
        subsystem: &str,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Arc<Descriptor>> {
        let fq_name = build_fq_name(&self.namespace, subsystem, name);
        let candidate = Descriptor::new(fq_name.clone(), help, label_names);

        if let Some(&idx) = self.by_name.get(&fq_name) {
            let existing = &self.descriptors[idx];
            if **existing != candidate {
                return Err(ScrapeError::DuplicateDescriptor(fq_name));
            }
            return Ok(existing.clone());
        }

        let descriptor = Arc::new(candidate);
        self.by_name.insert(fq_name, self.descriptors.len());
        self.descriptors.push(descriptor.clone());
        Ok(descriptor)
    }

    /// Look up a descriptor by fully-qualified name.
    pub fn get(&self, fq_name: &str) -> Option<&Arc<Descriptor>> {
        self.by_name.get(fq_name).map(|&idx| &self.descriptors[idx])
    }

    /// Iterate descriptors in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Descriptor>> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new(NAMESPACE)
    }
}
