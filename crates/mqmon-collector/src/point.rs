//! Points and the per-cycle collection report.
//!
//! A point is one monitored object's worth of normalized metrics for one
//! cycle: an object type, a unique tag set, and a metric-name → value map.
//! The serialized field names are part of the wire contract with existing
//! report consumers and must not change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const OBJECT_TYPE_QMGR: &str = "queueManager";
pub const OBJECT_TYPE_QUEUE: &str = "queue";
pub const OBJECT_TYPE_CHANNEL: &str = "channel";

pub const TAG_QMGR: &str = "qmgr";
pub const TAG_QUEUE: &str = "queue";
pub const TAG_CHANNEL: &str = "channel";
pub const TAG_PLATFORM: &str = "platform";

/// One tagged group of normalized metric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "objectType")]
    pub object_type: String,
    pub tags: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
}

impl Point {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            tags: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Store a tag, trimming surrounding whitespace first.
    pub fn set_tag(&mut self, name: impl Into<String>, value: &str) {
        self.tags.insert(name.into(), value.trim().to_string());
    }

    pub fn set_metric(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.insert(name.into(), value);
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// When a collection was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionTime {
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    pub epoch: i64,
}

/// One cycle's finished output, handed to the reporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionReport {
    #[serde(rename = "collectionTime")]
    pub collection_time: CollectionTime,
    pub points: Vec<Point>,
}

/// The in-cycle identity-key → point map. Each distinct identity gets
/// exactly one point; flattening passes merge into existing entries.
#[derive(Debug, Default)]
pub(crate) struct PointMap {
    points: BTreeMap<String, Point>,
}

impl PointMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the point for an identity key, creating it with `init` on
    /// first sight.
    pub fn get_or_insert_with(
        &mut self,
        identity: &str,
        init: impl FnOnce() -> Point,
    ) -> &mut Point {
        self.points
            .entry(identity.to_string())
            .or_insert_with(init)
    }

    /// Finish the cycle: emit the points ordered by identity key.
    pub fn into_points(self) -> Vec<Point> {
        self.points.into_values().collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_with_contract_field_names() {
        let mut point = Point::new(OBJECT_TYPE_QUEUE);
        point.set_tag(TAG_QMGR, "QM1");
        point.set_tag(TAG_QUEUE, "APP.REQUEST");
        point.set_tag(TAG_PLATFORM, "UNIX");
        point.set_metric("queueDepth", 5.0);

        let report = CollectionReport {
            collection_time: CollectionTime {
                time_stamp: "2024-05-01T12:00:00+00:00".into(),
                epoch: 1_714_564_800,
            },
            points: vec![point],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["collectionTime"]["timeStamp"], "2024-05-01T12:00:00+00:00");
        assert_eq!(json["collectionTime"]["epoch"], 1_714_564_800);
        assert_eq!(json["points"][0]["objectType"], "queue");
        assert_eq!(json["points"][0]["tags"]["queue"], "APP.REQUEST");
        assert_eq!(json["points"][0]["metrics"]["queueDepth"], 5.0);
    }

    #[test]
    fn test_tags_are_trimmed() {
        let mut point = Point::new(OBJECT_TYPE_CHANNEL);
        point.set_tag(TAG_CHANNEL, "  TO.QM2   ");
        assert_eq!(point.tag(TAG_CHANNEL), Some("TO.QM2"));
    }

    #[test]
    fn test_point_map_merges_by_identity() {
        let mut map = PointMap::new();
        map.get_or_insert_with("APP.REQUEST", || Point::new(OBJECT_TYPE_QUEUE))
            .set_metric("queueDepth", 5.0);
        map.get_or_insert_with("APP.REQUEST", || {
            panic!("must not re-create an existing identity")
        })
        .set_metric("queueUncommittedMessages", 1.0);

        assert_eq!(map.len(), 1);
        let points = map.into_points();
        assert_eq!(points[0].metric("queueDepth"), Some(5.0));
        assert_eq!(points[0].metric("queueUncommittedMessages"), Some(1.0));
    }

    #[test]
    fn test_points_emitted_in_identity_order() {
        let mut map = PointMap::new();
        map.get_or_insert_with("b", || Point::new(OBJECT_TYPE_QUEUE));
        map.get_or_insert_with("a", || Point::new(OBJECT_TYPE_QUEUE));
        let order: Vec<_> = map
            .into_points()
            .into_iter()
            .map(|p| p.object_type)
            .collect();
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_report_round_trips() {
        let report = CollectionReport {
            collection_time: CollectionTime {
                time_stamp: "2024-05-01T12:00:00+00:00".into(),
                epoch: 1,
            },
            points: vec![],
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: CollectionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
