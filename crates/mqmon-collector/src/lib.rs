//! Aggregation core for mqmon.
//!
//! Turns the raw values held in a [`mqmon_metric::MetricStore`] and the
//! polled status tables into one tagged point per monitored object and
//! assembles a collection report per cycle. Reports flow to pluggable
//! exporter backends and into a Prometheus gauge registry; both run only
//! after a cycle's flattening has completed.

pub mod collector;
pub mod config;
pub mod exporter;
pub mod gauges;
pub mod names;
pub mod point;

pub use collector::{Clock, CollectError, Collector, SystemClock};
pub use config::{CollectorConfig, ConfigError};
pub use exporter::{
    build_exporter, ExportError, Exporter, FileExporter, HttpExporter, InMemoryExporter,
    LogExporter,
};
pub use gauges::GaugeRegistry;
pub use names::normalize_metric_name;
pub use point::{CollectionReport, CollectionTime, Point};
