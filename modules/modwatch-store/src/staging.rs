//! The staged dataset: a single JSON document holding the pre-persistence
//! content batch, plus the externally-produced incident-report document.
//! A missing or unparsable file reads as empty, with a loud warning,
//! since an unexpected reset makes the next fetch rediscover everything.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use modwatch_common::{ContentRecord, Incident, ModwatchError};

use crate::traits::Result;

/// The staged content dataset, read and written whole.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Load the current dataset. Missing or corrupt data reads as empty.
    async fn load(&self) -> Vec<ContentRecord>;

    async fn save(&self, records: &[ContentRecord]) -> Result<()>;
}

/// The incident-report dataset produced outside this pipeline.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Load the current report batch. Missing or corrupt data reads as empty.
    async fn load_reports(&self) -> Vec<Incident>;
}

// --- File-backed implementations ---

pub struct FileStaging {
    path: PathBuf,
}

impl FileStaging {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl StagingStore for FileStaging {
    async fn load(&self) -> Vec<ContentRecord> {
        read_json_array(&self.path, "staging dataset").await
    }

    async fn save(&self, records: &[ContentRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| ModwatchError::Staging(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ModwatchError::Staging(e.to_string()))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| ModwatchError::Staging(e.to_string()))
    }
}

pub struct FileReports {
    path: PathBuf,
}

impl FileReports {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ReportSource for FileReports {
    async fn load_reports(&self) -> Vec<Incident> {
        read_json_array(&self.path, "incident-report dataset").await
    }
}

async fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Vec<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "{what} unreadable, treating as empty");
            return Vec::new();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "{what} unparsable, treating as empty");
            Vec::new()
        }
    }
}

// --- In-memory implementations for tests ---

#[derive(Default)]
pub struct MemoryStaging {
    records: Mutex<Vec<ContentRecord>>,
    saves: AtomicUsize,
}

impl MemoryStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `save` ran. Lets tests assert the write-skip.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StagingStore for MemoryStaging {
    async fn load(&self) -> Vec<ContentRecord> {
        self.records.lock().unwrap().clone()
    }

    async fn save(&self, records: &[ContentRecord]) -> Result<()> {
        *self.records.lock().unwrap() = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MemoryReports {
    reports: Vec<Incident>,
}

impl MemoryReports {
    pub fn new(reports: Vec<Incident>) -> Self {
        Self { reports }
    }
}

#[async_trait]
impl ReportSource for MemoryReports {
    async fn load_reports(&self) -> Vec<Incident> {
        self.reports.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use modwatch_common::ContentType;

    fn record(id: &str) -> ContentRecord {
        ContentRecord {
            content_type: ContentType::Post,
            content_id: id.to_string(),
            parent_id: None,
            author_id: Some("u-1".into()),
            body: "hello".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn file_staging_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let staging = FileStaging::new(dir.path().join("staged.json"));

        assert!(staging.load().await.is_empty());

        staging.save(&[record("p-1"), record("p-2")]).await.unwrap();
        let loaded = staging.load().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].content_id, "p-1");
    }

    #[tokio::test]
    async fn corrupt_staging_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staged.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let staging = FileStaging::new(path);
        assert!(staging.load().await.is_empty());
    }

    #[tokio::test]
    async fn missing_report_file_reads_as_empty() {
        let reports = FileReports::new(PathBuf::from("/definitely/not/here.json"));
        assert!(reports.load_reports().await.is_empty());
    }
}
