//! The published-metric store.
//!
//! The queue manager publishes resource metrics in a three-level hierarchy:
//! classes (e.g. `CPU`, `STATMQI`, `STATQ`) contain types, types contain
//! elements, and each element carries one raw counter or gauge value per
//! monitored object key. Discovery builds the hierarchy once at startup;
//! after that only the per-key value maps change, refreshed by incoming
//! publications and wiped at the start of every collection cycle.

use std::collections::HashMap;

use crate::normalize::Normalization;

/// Object key under which a metric element stores the queue manager's own
/// (non per-queue) value. Flattening maps this key back to the queue
/// manager's identity instead of treating it as a queue name.
pub const QMGR_OBJECT_KEY: &str = "@self";

/// One class of published metrics, the top level of the hierarchy.
#[derive(Debug, Clone)]
pub struct MetricClass {
    name: String,
    types: Vec<MetricType>,
}

impl MetricClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[MetricType] {
        &self.types
    }

    pub fn push_type(&mut self, ty: MetricType) -> &mut MetricType {
        self.types.push(ty);
        self.types.last_mut().unwrap()
    }
}

/// A group of related metric elements within a class.
#[derive(Debug, Clone)]
pub struct MetricType {
    name: String,
    elements: Vec<MetricElement>,
}

impl MetricType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elements(&self) -> &[MetricElement] {
        &self.elements
    }

    pub fn push_element(&mut self, elem: MetricElement) -> &mut MetricElement {
        self.elements.push(elem);
        self.elements.last_mut().unwrap()
    }
}

/// One metric definition plus its per-object-key raw values.
///
/// The definition (name, description, normalization rule) is immutable after
/// discovery; the value map is rewritten every cycle.
#[derive(Debug, Clone)]
pub struct MetricElement {
    metric_name: String,
    description: String,
    normalization: Normalization,
    values: HashMap<String, i64>,
}

impl MetricElement {
    pub fn new(
        metric_name: impl Into<String>,
        description: impl Into<String>,
        normalization: Normalization,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            description: description.into(),
            normalization,
            values: HashMap::new(),
        }
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Record a raw sample for an object key, replacing any earlier sample
    /// from the same cycle.
    pub fn set_value(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), value);
    }

    pub fn value(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
    }
}

/// The full metric hierarchy owned by the collector.
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    classes: Vec<MetricClass>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> &[MetricClass] {
        &self.classes
    }

    pub fn push_class(&mut self, class: MetricClass) -> &mut MetricClass {
        self.classes.push(class);
        self.classes.last_mut().unwrap()
    }

    /// Iterate every element in the hierarchy, in discovery order.
    pub fn elements(&self) -> impl Iterator<Item = &MetricElement> {
        self.classes
            .iter()
            .flat_map(|c| c.types.iter())
            .flat_map(|t| t.elements.iter())
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut MetricElement> {
        self.classes
            .iter_mut()
            .flat_map(|c| c.types.iter_mut())
            .flat_map(|t| t.elements.iter_mut())
    }

    /// Find an element by its published metric name.
    pub fn element_mut(&mut self, metric_name: &str) -> Option<&mut MetricElement> {
        self.elements_mut().find(|e| e.metric_name == metric_name)
    }

    /// Wipe every element's value map so the next cycle reflects only values
    /// reported after the reset. The hierarchy itself is untouched.
    pub fn reset_all(&mut self) {
        for elem in self.elements_mut() {
            elem.clear_values();
        }
    }
}
