//! Prometheus gauge exposition.
//!
//! Mirrors each emitted report into a registry of gauges so the snapshot
//! can be polled over HTTP. One `GaugeVec` exists per (object type, metric
//! name); its label dimensions are the tag names that object type carries.
//! Before every update the existing gauges are reset so objects that
//! disappeared between cycles stop being exported.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::Mutex;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use mqmon_metric::{
    ATTR_CHL_CONNNAME, ATTR_CHL_JOBNAME, ATTR_CHL_RQMNAME, ATTR_CHL_TYPE,
};

use crate::point::{
    CollectionReport, OBJECT_TYPE_CHANNEL, OBJECT_TYPE_QMGR, OBJECT_TYPE_QUEUE, TAG_CHANNEL,
    TAG_PLATFORM, TAG_QMGR, TAG_QUEUE,
};

const QMGR_LABELS: &[&str] = &[TAG_QMGR, TAG_PLATFORM];
const QUEUE_LABELS: &[&str] = &[TAG_QMGR, TAG_QUEUE, TAG_PLATFORM];
const CHANNEL_LABELS: &[&str] = &[
    TAG_QMGR,
    TAG_CHANNEL,
    TAG_PLATFORM,
    ATTR_CHL_TYPE,
    ATTR_CHL_RQMNAME,
    ATTR_CHL_CONNNAME,
    ATTR_CHL_JOBNAME,
];

fn label_names(object_type: &str) -> &'static [&'static str] {
    match object_type {
        OBJECT_TYPE_QUEUE => QUEUE_LABELS,
        OBJECT_TYPE_CHANNEL => CHANNEL_LABELS,
        OBJECT_TYPE_QMGR => QMGR_LABELS,
        _ => QMGR_LABELS,
    }
}

/// Registry of pollable gauges, updated from each collection report.
pub struct GaugeRegistry {
    registry: Registry,
    namespace: String,
    gauges: Mutex<HashMap<(String, String), GaugeVec>>,
}

impl GaugeRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            registry: Registry::new(),
            namespace: namespace.into(),
            gauges: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the exported gauge values with the report's points.
    pub fn update(&self, report: &CollectionReport) -> Result<(), prometheus::Error> {
        let mut gauges = self.gauges.lock();

        for gauge in gauges.values() {
            gauge.reset();
        }

        for point in &report.points {
            let labels = label_names(&point.object_type);
            for (metric, value) in &point.metrics {
                let key = (point.object_type.clone(), metric.clone());
                let gauge = match gauges.entry(key) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        let opts =
                            Opts::new(metric.clone(), format!("{} {}", point.object_type, metric))
                                .namespace(self.namespace.clone())
                                .subsystem(point.object_type.clone());
                        let gauge = GaugeVec::new(opts, labels)?;
                        self.registry.register(Box::new(gauge.clone()))?;
                        entry.insert(gauge)
                    }
                };
                let values: Vec<&str> = labels
                    .iter()
                    .map(|name| point.tag(name).unwrap_or(""))
                    .collect();
                gauge.with_label_values(&values).set(*value);
            }
        }
        Ok(())
    }

    /// Render the registry in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{CollectionTime, Point};

    fn report_with_queue(queue: &str, depth: f64) -> CollectionReport {
        let mut point = Point::new(OBJECT_TYPE_QUEUE);
        point.set_tag(TAG_QMGR, "QM1");
        point.set_tag(TAG_QUEUE, queue);
        point.set_tag(TAG_PLATFORM, "UNIX");
        point.set_metric("queueDepth", depth);
        CollectionReport {
            collection_time: CollectionTime {
                time_stamp: "2024-05-01T12:00:00+00:00".into(),
                epoch: 1_714_564_800,
            },
            points: vec![point],
        }
    }

    #[test]
    fn test_update_and_render() {
        let gauges = GaugeRegistry::new("mqmon");
        gauges.update(&report_with_queue("APP.REQUEST", 5.0)).unwrap();

        let text = gauges.render().unwrap();
        assert!(text.contains("mqmon_queue_queueDepth"));
        assert!(text.contains("queue=\"APP.REQUEST\""));
        assert!(text.contains("qmgr=\"QM1\""));
        assert!(text.contains("5"));
    }

    #[test]
    fn test_disappeared_objects_are_reset() {
        let gauges = GaugeRegistry::new("mqmon");
        gauges.update(&report_with_queue("APP.OLD", 1.0)).unwrap();
        gauges.update(&report_with_queue("APP.NEW", 2.0)).unwrap();

        let text = gauges.render().unwrap();
        assert!(text.contains("APP.NEW"));
        assert!(!text.contains("APP.OLD"));
    }

    #[test]
    fn test_values_refresh_in_place() {
        let gauges = GaugeRegistry::new("mqmon");
        gauges.update(&report_with_queue("APP.REQUEST", 5.0)).unwrap();
        gauges.update(&report_with_queue("APP.REQUEST", 9.0)).unwrap();

        let text = gauges.render().unwrap();
        assert!(text.contains("9"));
    }

    #[test]
    fn test_channel_points_use_channel_labels() {
        let gauges = GaugeRegistry::new("mqmon");
        let mut point = Point::new(crate::point::OBJECT_TYPE_CHANNEL);
        point.set_tag(TAG_QMGR, "QM1");
        point.set_tag(TAG_CHANNEL, "TO.QM2");
        point.set_tag(TAG_PLATFORM, "UNIX");
        point.set_tag(ATTR_CHL_TYPE, "SENDER");
        point.set_tag(ATTR_CHL_RQMNAME, "QM2");
        point.set_tag(ATTR_CHL_CONNNAME, "9.1.1.1");
        point.set_tag(ATTR_CHL_JOBNAME, "00001234");
        point.set_metric("channelMessages", 100.0);
        let report = CollectionReport {
            collection_time: CollectionTime {
                time_stamp: "2024-05-01T12:00:00+00:00".into(),
                epoch: 1_714_564_800,
            },
            points: vec![point],
        };

        gauges.update(&report).unwrap();
        let text = gauges.render().unwrap();
        assert!(text.contains("mqmon_channel_channelMessages"));
        assert!(text.contains("channel=\"TO.QM2\""));
        assert!(text.contains("remoteQMgrName=\"QM2\""));
        assert!(text.contains("connectionName=\"9.1.1.1\""));
    }
}
