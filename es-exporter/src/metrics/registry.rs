//! Live series values, keyed by catalog entry and label tuple.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::catalog::{Catalog, Metric, MetricDescriptor};

/// Ordered label values, matching a descriptor's `label_names`.
pub type LabelValues = Vec<String>;

/// Mutable store of the current cycle's series.
///
/// Not synchronized itself; the collector owns it behind a lock.
#[derive(Debug)]
pub struct MetricRegistry {
    catalog: Arc<Catalog>,
    // Indexed by `Metric::index()`.
    series: Vec<BTreeMap<LabelValues, f64>>,
    up: bool,
}

impl MetricRegistry {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let series = vec![BTreeMap::new(); catalog.len()];
        Self {
            catalog,
            series,
            up: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Drop every series value and mark upstream unavailable.
    ///
    /// Descriptors are untouched; only label tuples go away.
    pub fn reset(&mut self) {
        for series in &mut self.series {
            series.clear();
        }
        self.up = false;
    }

    /// Insert or overwrite one series value.
    ///
    /// # Panics
    ///
    /// If `labels` does not have exactly one value per label name of the
    /// metric's descriptor.
    pub fn set(&mut self, metric: Metric, labels: &[&str], value: f64) {
        let descriptor = self.catalog.descriptor(metric);
        assert_eq!(
            labels.len(),
            descriptor.arity(),
            "{} takes labels {:?}, got values {:?}",
            descriptor.name,
            descriptor.label_names,
            labels
        );

        let key = labels.iter().map(|l| l.to_string()).collect();
        self.series[metric.index()].insert(key, value);
    }

    pub fn get(&self, metric: Metric, labels: &[&str]) -> Option<f64> {
        let key: LabelValues = labels.iter().map(|l| l.to_string()).collect();
        self.series[metric.index()].get(&key).copied()
    }

    pub fn set_up(&mut self, up: bool) {
        self.up = up;
    }

    pub fn up(&self) -> bool {
        self.up
    }

    /// Number of populated series across all descriptors.
    pub fn series_count(&self) -> usize {
        self.series.iter().map(BTreeMap::len).sum()
    }

    /// Copy out the populated families in catalog order.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let families = self
            .catalog
            .iter()
            .zip(&self.series)
            .filter(|(_, series)| !series.is_empty())
            .map(|(descriptor, series)| MetricFamily {
                descriptor: descriptor.clone(),
                series: series
                    .iter()
                    .map(|(labels, value)| Series {
                        label_values: labels.clone(),
                        value: *value,
                    })
                    .collect(),
            })
            .collect();

        RegistrySnapshot {
            families,
            up: self.up,
        }
    }
}

/// One labeled value.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label_values: LabelValues,
    pub value: f64,
}

/// All populated series of one descriptor, ordered by label values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub descriptor: MetricDescriptor,
    pub series: Vec<Series>,
}

/// Immutable copy of the registry after a completed cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrySnapshot {
    /// Non-empty families only.
    pub families: Vec<MetricFamily>,
    pub up: bool,
}

impl RegistrySnapshot {
    pub fn family(&self, metric: Metric) -> Option<&MetricFamily> {
        self.families.iter().find(|f| f.descriptor.metric == metric)
    }

    pub fn value(&self, metric: Metric, labels: &[&str]) -> Option<f64> {
        self.family(metric)?
            .series
            .iter()
            .find(|s| s.label_values.iter().map(String::as_str).eq(labels.iter().copied()))
            .map(|s| s.value)
    }

    pub fn series_count(&self) -> usize {
        self.families.iter().map(|f| f.series.len()).sum()
    }

    /// Iterate the distinct `node` label values present in any family.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        let mut nodes: Vec<&str> = self
            .families
            .iter()
            .flat_map(|f| f.series.iter())
            .filter_map(|s| s.label_values.get(1).map(String::as_str))
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes.into_iter()
    }
}
