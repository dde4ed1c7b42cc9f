//! The middleware-facing contract.
//!
//! Everything the collector needs from a live queue manager connection goes
//! through [`QmgrSource`]: draining pending metric publications into the
//! store, polling channel/queue status into attribute tables, and reporting
//! the platform. Connection management, subscriptions and discovery are the
//! implementation's concern.

use thiserror::Error;

use crate::platform::Platform;
use crate::status::StatusSet;
use crate::store::MetricStore;

/// Errors surfaced by a queue manager source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The connection to the queue manager is gone.
    #[error("not connected to queue manager")]
    NotConnected,

    /// A publication referenced a metric the store never discovered.
    #[error("publication for unknown metric {0:?}")]
    UnknownMetric(String),

    /// A status poll failed.
    #[error("{object} status fetch failed: {reason}")]
    StatusFetch {
        object: &'static str,
        reason: String,
    },
}

/// A live (or scripted) queue manager connection.
pub trait QmgrSource: Send {
    /// Platform the queue manager reports for itself.
    fn platform(&self) -> Platform;

    /// Drain pending metric publications into the store's value maps.
    fn process_publications(&mut self, store: &mut MetricStore) -> Result<(), SourceError>;

    /// Poll status for the channels matching the monitored set.
    fn fetch_channel_status(
        &mut self,
        monitored: &str,
        status: &mut StatusSet,
    ) -> Result<(), SourceError>;

    /// Poll status for the queues matching the monitored set.
    fn fetch_queue_status(
        &mut self,
        monitored: &str,
        status: &mut StatusSet,
    ) -> Result<(), SourceError>;
}

/// Match an object name against a comma-separated pattern list. A pattern
/// is either an exact name or a prefix ending in `*`; `*` alone matches
/// everything. Blanks around patterns are ignored.
pub fn matches_monitored(name: &str, monitored: &str) -> bool {
    monitored.split(',').map(str::trim).any(|pat| {
        if pat == "*" {
            true
        } else if let Some(prefix) = pat.strip_suffix('*') {
            name.starts_with(prefix)
        } else {
            name == pat
        }
    })
}
