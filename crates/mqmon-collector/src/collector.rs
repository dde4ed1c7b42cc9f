//! The aggregation engine.
//!
//! One [`Collector::run_cycle`] call per external trigger: reset the metric
//! store, drain pending publications, poll object status if the poll
//! interval has elapsed, then flatten everything into one point per
//! distinct identity and assemble the cycle's report. The very first cycle
//! after startup is discarded because counters accumulated before we
//! connected would show up as a misleading spike.

use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info};

use mqmon_metric::{
    channel_normalize, normalize, queue_normalize, ChannelType, MetricStore, QmgrSource,
    SourceError, StatusSet, ATTR_CHL_CONNNAME, ATTR_CHL_JOBNAME, ATTR_CHL_NAME, ATTR_CHL_RQMNAME,
    ATTR_CHL_TYPE, ATTR_Q_NAME, QMGR_OBJECT_KEY,
};

use crate::config::CollectorConfig;
use crate::names::normalize_metric_name;
use crate::point::{
    CollectionReport, CollectionTime, Point, PointMap, OBJECT_TYPE_CHANNEL, OBJECT_TYPE_QMGR,
    OBJECT_TYPE_QUEUE, TAG_CHANNEL, TAG_PLATFORM, TAG_QMGR, TAG_QUEUE,
};

/// Errors that abort a collection cycle.
///
/// Status-poll failures are not in here: they are logged and the cycle
/// continues with partial data.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Draining pending publications failed.
    #[error("publication processing failed: {0}")]
    Ingest(#[from] SourceError),

    /// A status instance carried metric values but lacked an attribute the
    /// identity key is built from. Emitting a point would corrupt the
    /// report, so the cycle fails instead.
    #[error("status instance {key:?} is missing required attribute {attribute}")]
    MissingStatusAttribute {
        attribute: &'static str,
        key: String,
    },
}

/// Time source for the collector. Injected so tests can drive the poll
/// interval deterministically.
pub trait Clock: Send {
    /// Monotonic instant for elapsed-time arithmetic.
    fn now(&self) -> Instant;

    /// Wall-clock time stamped onto reports.
    fn wall(&self) -> DateTime<Utc>;
}

/// The real time source.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Long-lived state carried across cycles.
struct CycleState {
    last_poll: Instant,
    first_cycle_done: bool,
    platform: Option<String>,
}

/// The aggregation engine. Owns the metric store, the status tables and
/// the middleware source; external triggers drive it one cycle at a time.
pub struct Collector<S> {
    config: CollectorConfig,
    store: MetricStore,
    channel_status: StatusSet,
    queue_status: StatusSet,
    source: S,
    state: CycleState,
    clock: Box<dyn Clock>,
}

impl<S: QmgrSource> Collector<S> {
    pub fn new(config: CollectorConfig, store: MetricStore, source: S) -> Self {
        Self::with_clock(config, store, source, Box::new(SystemClock))
    }

    pub fn with_clock(
        config: CollectorConfig,
        store: MetricStore,
        source: S,
        clock: Box<dyn Clock>,
    ) -> Self {
        let state = CycleState {
            last_poll: clock.now(),
            first_cycle_done: false,
            platform: None,
        };
        Self {
            config,
            store,
            channel_status: StatusSet::new(),
            queue_status: StatusSet::new(),
            source,
            state,
            clock,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Run one collection cycle.
    ///
    /// Returns `Ok(None)` for the discarded first cycle, `Ok(Some(report))`
    /// for every later successful cycle. Status-poll failures are logged
    /// and absorbed; any other failure aborts the cycle and leaves the
    /// cross-cycle state usable for the next trigger.
    pub fn run_cycle(&mut self) -> Result<Option<CollectionReport>, CollectError> {
        debug!(qmgr = %self.config.qmgr_name, "collection cycle started");

        // Status polling is gated purely on elapsed time, no matter how
        // often cycles run or how many publications arrived.
        let now = self.clock.now();
        let poll_status =
            now.duration_since(self.state.last_poll) >= self.config.poll_interval();
        if poll_status {
            debug!("polling for object status");
            self.state.last_poll = now;
        }

        if self.state.platform.is_none() {
            self.state.platform = Some(self.source.platform().as_str().to_string());
        }

        // Wipe all raw values so this cycle reflects only what is reported
        // after the reset.
        self.store.reset_all();

        self.source.process_publications(&mut self.store)?;

        if poll_status {
            self.channel_status.reset_values();
            match self
                .source
                .fetch_channel_status(&self.config.monitored_channels, &mut self.channel_status)
            {
                Ok(()) => debug!("collected all channel status"),
                Err(e) => error!(error = %e, "error collecting channel status"),
            }

            if self.config.queue_status {
                self.queue_status.reset_values();
                match self
                    .source
                    .fetch_queue_status(&self.config.monitored_queues, &mut self.queue_status)
                {
                    Ok(()) => debug!("collected all queue status"),
                    Err(e) => error!(error = %e, "error collecting queue status"),
                }
            }
        }

        if !self.state.first_cycle_done {
            self.state.first_cycle_done = true;
            info!("discarding first collection cycle");
            return Ok(None);
        }

        let mut points = PointMap::new();
        self.flatten_publications(&mut points);
        if poll_status {
            self.flatten_channel_status(&mut points)?;
            if self.config.queue_status {
                self.flatten_queue_status(&mut points)?;
            }
        }

        let wall = self.clock.wall();
        let report = CollectionReport {
            collection_time: CollectionTime {
                time_stamp: wall.to_rfc3339(),
                epoch: wall.timestamp(),
            },
            points: points.into_points(),
        };
        debug!(points = report.points.len(), "collection cycle finished");
        Ok(Some(report))
    }

    fn platform_tag(&self) -> &str {
        self.state.platform.as_deref().unwrap_or("")
    }

    /// Walk the published-metric hierarchy. The identity key is the object
    /// key itself; the distinguished aggregate key becomes the queue
    /// manager's own point, everything else a queue point.
    fn flatten_publications(&self, points: &mut PointMap) {
        let qmgr = &self.config.qmgr_name;
        let platform = self.platform_tag();

        for class in self.store.classes() {
            for ty in class.types() {
                for elem in ty.elements() {
                    let metric = normalize_metric_name(elem.metric_name());
                    for (key, value) in elem.values() {
                        let point = points.get_or_insert_with(key, || {
                            let mut point = Point::new(OBJECT_TYPE_QMGR);
                            point.set_tag(TAG_QMGR, qmgr);
                            point.set_tag(TAG_PLATFORM, platform);
                            if key != QMGR_OBJECT_KEY {
                                point.object_type = OBJECT_TYPE_QUEUE.to_string();
                                point.set_tag(TAG_QUEUE, key);
                            }
                            point
                        });
                        point.set_metric(metric.clone(), normalize(elem, key, value));
                    }
                }
            }
        }
    }

    /// Flatten polled channel status. A channel instance is identified by
    /// name, connection and job plus the remote queue manager (absent for
    /// server-connection channels), so several instances of one channel
    /// definition stay distinct.
    fn flatten_channel_status(&self, points: &mut PointMap) -> Result<(), CollectError> {
        let set = &self.channel_status;
        let qmgr = &self.config.qmgr_name;
        let platform = self.platform_tag();

        for (_, attr) in set.attributes() {
            let metric = normalize_metric_name(attr.metric_name());
            for (key, value) in attr.values() {
                let Some(raw) = value.as_int() else {
                    continue;
                };

                let chl_name = set
                    .text(ATTR_CHL_NAME, key)
                    .ok_or_else(|| missing(ATTR_CHL_NAME, key))?;
                let conn_name = set
                    .text(ATTR_CHL_CONNNAME, key)
                    .ok_or_else(|| missing(ATTR_CHL_CONNNAME, key))?;
                let job_name = set
                    .text(ATTR_CHL_JOBNAME, key)
                    .ok_or_else(|| missing(ATTR_CHL_JOBNAME, key))?;
                let rqm_name = set.text(ATTR_CHL_RQMNAME, key).unwrap_or("");
                let chl_type = set
                    .int(ATTR_CHL_TYPE, key)
                    .map(|code| ChannelType::from_code(code).as_str())
                    .unwrap_or("");

                let identity = format!(
                    "{}/{}/{}/{}",
                    chl_name.trim(),
                    conn_name.trim(),
                    job_name.trim(),
                    rqm_name.trim()
                );
                let point = points.get_or_insert_with(&identity, || {
                    let mut point = Point::new(OBJECT_TYPE_CHANNEL);
                    point.set_tag(TAG_QMGR, qmgr);
                    point.set_tag(TAG_CHANNEL, chl_name);
                    point.set_tag(TAG_PLATFORM, platform);
                    point.set_tag(ATTR_CHL_TYPE, chl_type);
                    point.set_tag(ATTR_CHL_RQMNAME, rqm_name);
                    point.set_tag(ATTR_CHL_CONNNAME, conn_name);
                    point.set_tag(ATTR_CHL_JOBNAME, job_name);
                    point
                });
                point.set_metric(metric.clone(), channel_normalize(attr, raw));
            }
        }
        Ok(())
    }

    /// Flatten polled queue status. Identified by queue name, so these
    /// points merge with publication-derived points for the same queue.
    fn flatten_queue_status(&self, points: &mut PointMap) -> Result<(), CollectError> {
        let set = &self.queue_status;
        let qmgr = &self.config.qmgr_name;
        let platform = self.platform_tag();

        for (_, attr) in set.attributes() {
            let metric = normalize_metric_name(attr.metric_name());
            for (key, value) in attr.values() {
                let Some(raw) = value.as_int() else {
                    continue;
                };

                let q_name = set
                    .text(ATTR_Q_NAME, key)
                    .ok_or_else(|| missing(ATTR_Q_NAME, key))?;

                let identity = q_name.trim().to_string();
                let point = points.get_or_insert_with(&identity, || {
                    let mut point = Point::new(OBJECT_TYPE_QUEUE);
                    point.set_tag(TAG_QMGR, qmgr);
                    point.set_tag(TAG_QUEUE, q_name);
                    point.set_tag(TAG_PLATFORM, platform);
                    point
                });
                point.set_metric(metric.clone(), queue_normalize(attr, raw));
            }
        }
        Ok(())
    }
}

fn missing(attribute: &'static str, key: &str) -> CollectError {
    CollectError::MissingStatusAttribute {
        attribute,
        key: key.to_string(),
    }
}
