use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::merger::AggregateReport;

/// A completed analysis as handed to persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub transcript_chars: usize,
    pub report: AggregateReport,
}

impl AnalysisRecord {
    pub fn new(language: &str, transcript_chars: usize, report: AggregateReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            language: language.to_string(),
            transcript_chars,
            report,
        }
    }
}

/// Trait for the persistence collaborator that receives finished reports.
#[async_trait]
pub trait ReportSink: Send + Sync + 'static {
    async fn store(&self, record: &AnalysisRecord) -> anyhow::Result<()>;
}

/// Discards every record.
#[derive(Debug, Clone, Default)]
pub struct NullSink;

#[async_trait]
impl ReportSink for NullSink {
    async fn store(&self, _record: &AnalysisRecord) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes each record as `<dir>/<timestamp>-<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_path(&self, record: &AnalysisRecord) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.json",
            record.created_at.format("%Y%m%dT%H%M%SZ"),
            record.id
        ))
    }
}

#[async_trait]
impl ReportSink for JsonFileSink {
    async fn store(&self, record: &AnalysisRecord) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create '{}'", self.dir.display()))?;

        let path = self.file_path(record);
        let json = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write '{}'", path.display()))?;

        info!(id = %record.id, file = %path.display(), "Analysis record stored");
        Ok(())
    }
}
