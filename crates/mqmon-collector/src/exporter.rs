//! Reporting backends.
//!
//! A finished [`CollectionReport`] is handed to an [`Exporter`] after the
//! cycle completes; nothing here runs while flattening is in progress.
//! Backends: structured log, JSON-lines file, HTTP push to a configured
//! endpoint, and an in-memory store for tests.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use crate::config::CollectorConfig;
use crate::point::CollectionReport;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("http push failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Sink for assembled collection reports.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, report: &CollectionReport) -> Result<(), ExportError>;
}

/// Logs each report's points via tracing.
pub struct LogExporter;

#[async_trait]
impl Exporter for LogExporter {
    async fn export(&self, report: &CollectionReport) -> Result<(), ExportError> {
        tracing::info!(
            timestamp = %report.collection_time.time_stamp,
            points = report.points.len(),
            "collection report"
        );
        for point in &report.points {
            tracing::info!(
                object_type = %point.object_type,
                tags = ?point.tags,
                metrics = ?point.metrics,
                "point"
            );
        }
        Ok(())
    }
}

/// Appends each report as one JSON line.
pub struct FileExporter {
    path: PathBuf,
}

impl FileExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Exporter for FileExporter {
    async fn export(&self, report: &CollectionReport) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(report)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// POSTs each report as JSON to the configured endpoint.
pub struct HttpExporter {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpExporter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Exporter for HttpExporter {
    async fn export(&self, report: &CollectionReport) -> Result<(), ExportError> {
        self.client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Stores reports in memory for inspection.
#[derive(Default)]
pub struct InMemoryExporter {
    reports: Mutex<Vec<CollectionReport>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_reports(&self) -> Vec<CollectionReport> {
        std::mem::take(&mut *self.reports.lock())
    }

    pub fn count(&self) -> usize {
        self.reports.lock().len()
    }
}

#[async_trait]
impl Exporter for InMemoryExporter {
    async fn export(&self, report: &CollectionReport) -> Result<(), ExportError> {
        self.reports.lock().push(report.clone());
        Ok(())
    }
}

/// Build the exporter selected by `reporter_type`, or `None` for "none".
///
/// The configuration is assumed validated, so an unknown type falls back
/// to the log backend rather than failing this late.
pub fn build_exporter(config: &CollectorConfig) -> Option<Box<dyn Exporter>> {
    match config.reporter_type.as_str() {
        "none" => None,
        "file" => Some(Box::new(FileExporter::new(&config.export_path))),
        "http" => Some(Box::new(HttpExporter::new(&config.http_endpoint))),
        _ => Some(Box::new(LogExporter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{CollectionTime, Point};

    fn sample_report() -> CollectionReport {
        let mut point = Point::new("queue");
        point.set_tag("qmgr", "QM1");
        point.set_tag("queue", "APP.REQUEST");
        point.set_metric("queueDepth", 5.0);
        CollectionReport {
            collection_time: CollectionTime {
                time_stamp: "2024-05-01T12:00:00+00:00".into(),
                epoch: 1_714_564_800,
            },
            points: vec![point],
        }
    }

    #[tokio::test]
    async fn test_log_exporter_is_infallible() {
        LogExporter.export(&sample_report()).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_exporter_appends_json_lines() {
        let dir = std::env::temp_dir().join("mqmon-test-file-exporter");
        let _ = fs::remove_dir_all(&dir);

        let path = dir.join("reports.jsonl");
        let exporter = FileExporter::new(&path);

        exporter.export(&sample_report()).await.unwrap();
        exporter.export(&sample_report()).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let report: CollectionReport = serde_json::from_str(line).unwrap();
            assert_eq!(report.points.len(), 1);
            assert_eq!(report.points[0].metric("queueDepth"), Some(5.0));
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_in_memory_exporter() {
        let exporter = InMemoryExporter::new();
        exporter.export(&sample_report()).await.unwrap();
        assert_eq!(exporter.count(), 1);
        let reports = exporter.take_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(exporter.count(), 0);
    }

    #[test]
    fn test_build_exporter_selection() {
        let mut config = CollectorConfig {
            qmgr_name: "QM1".into(),
            ..Default::default()
        };
        assert!(build_exporter(&config).is_some());

        config.reporter_type = "none".into();
        assert!(build_exporter(&config).is_none());

        config.reporter_type = "file".into();
        assert!(build_exporter(&config).is_some());
    }
}
