//! Channel and queue status attribute tables.
//!
//! Status-style metrics are not published by the queue manager; they are
//! polled on demand. A poll fills a [`StatusSet`]: one [`StatusAttribute`]
//! per well-known attribute id, each holding a value per object key. The
//! object key is an opaque per-instance key chosen by the fetcher; the
//! attributes that identify an instance (names, connection, job) are stored
//! as text values under the same key.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::normalize::Normalization;

/// Attribute ids shared between fetchers and the flattening core. The id
/// doubles as the tag name on emitted points.
pub const ATTR_CHL_NAME: &str = "channelName";
pub const ATTR_CHL_TYPE: &str = "channelType";
pub const ATTR_CHL_CONNNAME: &str = "connectionName";
pub const ATTR_CHL_JOBNAME: &str = "jobName";
pub const ATTR_CHL_RQMNAME: &str = "remoteQMgrName";
pub const ATTR_Q_NAME: &str = "queueName";

/// A single polled attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Text(String),
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Int(_) => None,
            AttrValue::Text(s) => Some(s.as_str()),
        }
    }
}

/// One attribute table: the metric it reports as, how to normalize it, and
/// a value per object key.
#[derive(Debug, Clone)]
pub struct StatusAttribute {
    metric_name: String,
    normalization: Normalization,
    values: HashMap<String, AttrValue>,
}

impl StatusAttribute {
    pub fn new(metric_name: impl Into<String>, normalization: Normalization) -> Self {
        Self {
            metric_name: metric_name.into(),
            normalization,
            values: HashMap::new(),
        }
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn value(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: AttrValue) {
        self.values.insert(key.into(), value);
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
    }
}

/// A full status poll result, keyed by attribute id.
///
/// Kept in a `BTreeMap` so flattening walks attributes in a stable order.
#[derive(Debug, Clone, Default)]
pub struct StatusSet {
    attributes: BTreeMap<String, StatusAttribute>,
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &StatusAttribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attribute(&self, id: &str) -> Option<&StatusAttribute> {
        self.attributes.get(id)
    }

    /// Get or create the attribute table for an id. The metric name and
    /// normalization are only applied on creation.
    pub fn ensure_attribute(
        &mut self,
        id: &str,
        metric_name: &str,
        normalization: Normalization,
    ) -> &mut StatusAttribute {
        self.attributes
            .entry(id.to_string())
            .or_insert_with(|| StatusAttribute::new(metric_name, normalization))
    }

    /// Text value of an attribute for an object key, if present and textual.
    pub fn text(&self, id: &str, key: &str) -> Option<&str> {
        self.attribute(id)?.value(key)?.as_text()
    }

    /// Integer value of an attribute for an object key, if present and integral.
    pub fn int(&self, id: &str, key: &str) -> Option<i64> {
        self.attribute(id)?.value(key)?.as_int()
    }

    /// Drop every per-key value while keeping the attribute definitions, so
    /// a failed poll leaves no stale instances behind.
    pub fn reset_values(&mut self) {
        for attr in self.attributes.values_mut() {
            attr.clear_values();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.values().all(|a| a.values.is_empty())
    }
}
