//! Metric data model for mqmon.
//!
//! Holds everything the aggregation core reads from the queue manager side:
//! the published-metric store (a class → type → element hierarchy with
//! per-object-key raw values), the channel/queue status attribute tables,
//! the raw-value normalizer, and the translation of platform and
//! channel-type codes into display strings.
//!
//! The middleware connection itself stays behind the [`QmgrSource`] trait;
//! a scripted [`MockQmgrSource`] ships here for tests and local runs.

pub mod mock;
pub mod normalize;
pub mod platform;
pub mod source;
pub mod status;
pub mod store;

pub use mock::{MockChannel, MockQmgrSource, MockQueueStatus};
pub use normalize::{channel_normalize, normalize, queue_normalize, Normalization};
pub use platform::{ChannelType, Platform};
pub use source::{matches_monitored, QmgrSource, SourceError};
pub use status::{
    AttrValue, StatusAttribute, StatusSet, ATTR_CHL_CONNNAME, ATTR_CHL_JOBNAME, ATTR_CHL_NAME,
    ATTR_CHL_RQMNAME, ATTR_CHL_TYPE, ATTR_Q_NAME,
};
pub use store::{MetricClass, MetricElement, MetricStore, MetricType, QMGR_OBJECT_KEY};
