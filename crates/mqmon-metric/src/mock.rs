//! A scripted queue manager source.
//!
//! Stands in for a real middleware connection: tests script publications
//! and status rows explicitly, and the exporter binary can run it in demo
//! mode where it synthesizes a small drifting workload each cycle so the
//! whole pipeline is observable without a queue manager.

use crate::normalize::Normalization;
use crate::platform::{ChannelType, Platform};
use crate::source::{matches_monitored, QmgrSource, SourceError};
use crate::status::{
    AttrValue, StatusSet, ATTR_CHL_CONNNAME, ATTR_CHL_JOBNAME, ATTR_CHL_NAME, ATTR_CHL_RQMNAME,
    ATTR_CHL_TYPE, ATTR_Q_NAME,
};
use crate::store::{MetricClass, MetricElement, MetricStore, MetricType, QMGR_OBJECT_KEY};

/// One channel instance the mock reports status for.
#[derive(Debug, Clone)]
pub struct MockChannel {
    pub name: String,
    pub channel_type: ChannelType,
    pub connection_name: String,
    pub job_name: String,
    /// Absent for server-connection channels.
    pub remote_qmgr: Option<String>,
    pub messages: i64,
    pub bytes_sent: i64,
    pub status: i64,
}

/// One queue the mock reports status for.
#[derive(Debug, Clone)]
pub struct MockQueueStatus {
    pub name: String,
    pub uncommitted_messages: i64,
    pub oldest_message_age: i64,
}

/// Scripted implementation of [`QmgrSource`].
pub struct MockQmgrSource {
    platform: Platform,
    pending: Vec<(String, String, i64)>,
    channels: Vec<MockChannel>,
    queue_status: Vec<MockQueueStatus>,
    demo_queues: Vec<String>,
    cycle: u64,
    channel_fetches: u64,
    queue_fetches: u64,
    fail_channel_status: Option<String>,
    fail_queue_status: Option<String>,
}

impl MockQmgrSource {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            pending: Vec::new(),
            channels: Vec::new(),
            queue_status: Vec::new(),
            demo_queues: Vec::new(),
            cycle: 0,
            channel_fetches: 0,
            queue_fetches: 0,
            fail_channel_status: None,
            fail_queue_status: None,
        }
    }

    /// A source seeded with a small simulated workload: two application
    /// queues, a sender channel to a remote queue manager and a
    /// server-connection channel. Values drift deterministically per cycle.
    pub fn demo() -> Self {
        let mut source = Self::new(Platform::Unix);
        source.demo_queues = vec!["APP.REQUEST".to_string(), "APP.REPLY".to_string()];
        source.add_channel(MockChannel {
            name: "TO.QM2".into(),
            channel_type: ChannelType::Sender,
            connection_name: "9.20.4.159(1414)".into(),
            job_name: "00001234".into(),
            remote_qmgr: Some("QM2".into()),
            messages: 100,
            bytes_sent: 250_000,
            status: 3,
        });
        source.add_channel(MockChannel {
            name: "APP.SVRCONN".into(),
            channel_type: ChannelType::ServerConn,
            connection_name: "127.0.0.1".into(),
            job_name: "00005678".into(),
            remote_qmgr: None,
            messages: 40,
            bytes_sent: 9_000,
            status: 3,
        });
        source.add_queue_status(MockQueueStatus {
            name: "APP.REQUEST".into(),
            uncommitted_messages: 0,
            oldest_message_age: 12,
        });
        source.add_queue_status(MockQueueStatus {
            name: "APP.REPLY".into(),
            uncommitted_messages: 1,
            oldest_message_age: 3,
        });
        source
    }

    /// Build the discovered metric hierarchy this source publishes into.
    pub fn discover(&self) -> MetricStore {
        let mut store = MetricStore::new();

        let cpu = store.push_class(MetricClass::new("CPU"));
        let summary = cpu.push_type(MetricType::new("SystemSummary"));
        summary.push_element(MetricElement::new(
            "user_cpu_time_percentage",
            "User CPU time percentage",
            Normalization::Percent,
        ));
        summary.push_element(MetricElement::new(
            "ram_total_estimate",
            "Estimate of RAM in use",
            Normalization::MegaBytes,
        ));

        let statq = store.push_class(MetricClass::new("STATQ"));
        let general = statq.push_type(MetricType::new("GENERAL"));
        general.push_element(MetricElement::new(
            "queue_depth",
            "Queue depth",
            Normalization::Raw,
        ));
        general.push_element(MetricElement::new(
            "queue_avoided_bytes",
            "Queue avoided bytes",
            Normalization::Raw,
        ));

        store
    }

    /// Queue a publication to be applied on the next
    /// [`process_publications`](QmgrSource::process_publications) call.
    pub fn publish(&mut self, metric: impl Into<String>, key: impl Into<String>, value: i64) {
        self.pending.push((metric.into(), key.into(), value));
    }

    pub fn add_channel(&mut self, channel: MockChannel) {
        self.channels.push(channel);
    }

    pub fn add_queue_status(&mut self, queue: MockQueueStatus) {
        self.queue_status.push(queue);
    }

    /// Make the next channel-status polls fail with the given reason.
    pub fn set_fail_channel_status(&mut self, reason: Option<String>) {
        self.fail_channel_status = reason;
    }

    /// Make the next queue-status polls fail with the given reason.
    pub fn set_fail_queue_status(&mut self, reason: Option<String>) {
        self.fail_queue_status = reason;
    }

    pub fn channel_fetch_count(&self) -> u64 {
        self.channel_fetches
    }

    pub fn queue_fetch_count(&self) -> u64 {
        self.queue_fetches
    }

    fn synthesize_demo_publications(&mut self) {
        let cycle = self.cycle as i64;
        for (i, queue) in self.demo_queues.clone().into_iter().enumerate() {
            let phase = i as i64 * 13;
            self.publish("queue_depth", queue.clone(), (cycle * 7 + phase) % 50);
            self.publish("queue_avoided_bytes", queue, (cycle * 512 + phase) % 65_536);
        }
        self.publish(
            "user_cpu_time_percentage",
            QMGR_OBJECT_KEY,
            1_200 + (cycle % 10) * 150,
        );
        self.publish("ram_total_estimate", QMGR_OBJECT_KEY, 640);
    }
}

impl QmgrSource for MockQmgrSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn process_publications(&mut self, store: &mut MetricStore) -> Result<(), SourceError> {
        self.cycle += 1;
        if !self.demo_queues.is_empty() {
            self.synthesize_demo_publications();
        }
        for (metric, key, value) in std::mem::take(&mut self.pending) {
            store
                .element_mut(&metric)
                .ok_or_else(|| SourceError::UnknownMetric(metric.clone()))?
                .set_value(key, value);
        }
        Ok(())
    }

    fn fetch_channel_status(
        &mut self,
        monitored: &str,
        status: &mut StatusSet,
    ) -> Result<(), SourceError> {
        self.channel_fetches += 1;
        if let Some(reason) = &self.fail_channel_status {
            return Err(SourceError::StatusFetch {
                object: "channel",
                reason: reason.clone(),
            });
        }

        let drift = self.cycle as i64;
        for (idx, ch) in self
            .channels
            .iter()
            .filter(|c| matches_monitored(&c.name, monitored))
            .enumerate()
        {
            let key = idx.to_string();
            status
                .ensure_attribute(ATTR_CHL_NAME, ATTR_CHL_NAME, Normalization::Raw)
                .set_value(&key, AttrValue::Text(ch.name.clone()));
            status
                .ensure_attribute(ATTR_CHL_CONNNAME, ATTR_CHL_CONNNAME, Normalization::Raw)
                .set_value(&key, AttrValue::Text(ch.connection_name.clone()));
            status
                .ensure_attribute(ATTR_CHL_JOBNAME, ATTR_CHL_JOBNAME, Normalization::Raw)
                .set_value(&key, AttrValue::Text(ch.job_name.clone()));
            if let Some(rqm) = &ch.remote_qmgr {
                status
                    .ensure_attribute(ATTR_CHL_RQMNAME, ATTR_CHL_RQMNAME, Normalization::Raw)
                    .set_value(&key, AttrValue::Text(rqm.clone()));
            }
            status
                .ensure_attribute(ATTR_CHL_TYPE, "channel_type", Normalization::Raw)
                .set_value(&key, AttrValue::Int(ch.channel_type.code()));
            status
                .ensure_attribute("channel_messages", "channel_messages", Normalization::Raw)
                .set_value(&key, AttrValue::Int(ch.messages + drift * 3));
            status
                .ensure_attribute("channel_bytes_sent", "channel_bytes_sent", Normalization::Raw)
                .set_value(&key, AttrValue::Int(ch.bytes_sent + drift * 640));
            status
                .ensure_attribute("channel_status", "channel_status", Normalization::Raw)
                .set_value(&key, AttrValue::Int(ch.status));
        }
        Ok(())
    }

    fn fetch_queue_status(
        &mut self,
        monitored: &str,
        status: &mut StatusSet,
    ) -> Result<(), SourceError> {
        self.queue_fetches += 1;
        if let Some(reason) = &self.fail_queue_status {
            return Err(SourceError::StatusFetch {
                object: "queue",
                reason: reason.clone(),
            });
        }

        for (idx, q) in self
            .queue_status
            .iter()
            .filter(|q| matches_monitored(&q.name, monitored))
            .enumerate()
        {
            let key = idx.to_string();
            status
                .ensure_attribute(ATTR_Q_NAME, ATTR_Q_NAME, Normalization::Raw)
                .set_value(&key, AttrValue::Text(q.name.clone()));
            status
                .ensure_attribute(
                    "queue_uncommitted_messages",
                    "queue_uncommitted_messages",
                    Normalization::Raw,
                )
                .set_value(&key, AttrValue::Int(q.uncommitted_messages));
            status
                .ensure_attribute(
                    "queue_oldest_message_age",
                    "queue_oldest_message_age",
                    Normalization::Raw,
                )
                .set_value(&key, AttrValue::Int(q.oldest_message_age));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_process() {
        let mut source = MockQmgrSource::new(Platform::Unix);
        let mut store = source.discover();

        source.publish("queue_depth", "APP.REQUEST", 5);
        source.process_publications(&mut store).unwrap();
        assert_eq!(
            store.element_mut("queue_depth").unwrap().value("APP.REQUEST"),
            Some(5)
        );

        // Pending list drains; a second call applies nothing new.
        store.reset_all();
        source.process_publications(&mut store).unwrap();
        assert_eq!(
            store.element_mut("queue_depth").unwrap().value("APP.REQUEST"),
            None
        );
    }

    #[test]
    fn test_unknown_metric_is_an_error() {
        let mut source = MockQmgrSource::new(Platform::Unix);
        let mut store = source.discover();
        source.publish("no_such_metric", "X", 1);
        let err = source.process_publications(&mut store).unwrap_err();
        assert!(matches!(err, SourceError::UnknownMetric(_)));
    }

    #[test]
    fn test_channel_status_respects_monitored_set() {
        let mut source = MockQmgrSource::demo();
        let mut status = StatusSet::new();
        source.fetch_channel_status("TO.*", &mut status).unwrap();

        let names: Vec<_> = status
            .attribute(ATTR_CHL_NAME)
            .unwrap()
            .values()
            .map(|(_, v)| v.as_text().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["TO.QM2"]);
        assert_eq!(source.channel_fetch_count(), 1);
    }

    #[test]
    fn test_injected_status_failure() {
        let mut source = MockQmgrSource::demo();
        source.set_fail_channel_status(Some("broken".into()));
        let mut status = StatusSet::new();
        let err = source.fetch_channel_status("*", &mut status).unwrap_err();
        assert!(matches!(
            err,
            SourceError::StatusFetch { object: "channel", .. }
        ));
    }

    #[test]
    fn test_svrconn_has_no_remote_qmgr_attribute() {
        let mut source = MockQmgrSource::demo();
        let mut status = StatusSet::new();
        source.fetch_channel_status("APP.SVRCONN", &mut status).unwrap();

        assert_eq!(status.text(ATTR_CHL_NAME, "0"), Some("APP.SVRCONN"));
        assert!(status.attribute(ATTR_CHL_RQMNAME).is_none());
        assert_eq!(
            status.int(ATTR_CHL_TYPE, "0"),
            Some(ChannelType::ServerConn.code())
        );
    }

    #[test]
    fn test_demo_publications_drift_between_cycles() {
        let mut source = MockQmgrSource::demo();
        let mut store = source.discover();

        source.process_publications(&mut store).unwrap();
        let first = store
            .element_mut("queue_depth")
            .unwrap()
            .value("APP.REQUEST")
            .unwrap();

        store.reset_all();
        source.process_publications(&mut store).unwrap();
        let second = store
            .element_mut("queue_depth")
            .unwrap()
            .value("APP.REQUEST")
            .unwrap();

        assert_ne!(first, second);
    }
}
