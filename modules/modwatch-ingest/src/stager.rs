//! Deduplicating stager. This is the idempotency boundary: re-running the
//! fetcher against unchanged upstream data must be a no-op write.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use modwatch_common::ContentRecord;
use modwatch_store::StagingStore;

use crate::Result;

/// Records from `fetched` whose identity key is absent from `existing`,
/// deduplicated within the batch as well. Pure, so the dedup rules are
/// testable without any storage.
pub fn merge_new(existing: &[ContentRecord], fetched: Vec<ContentRecord>) -> Vec<ContentRecord> {
    let mut seen: HashSet<(modwatch_common::ContentType, String)> = existing
        .iter()
        .map(|r| (r.content_type, r.content_id.clone()))
        .collect();

    let mut fresh = Vec::new();
    for record in fetched {
        let key = (record.content_type, record.content_id.clone());
        if seen.insert(key) {
            fresh.push(record);
        }
    }
    fresh
}

pub struct Stager {
    staging: Arc<dyn StagingStore>,
}

impl Stager {
    pub fn new(staging: Arc<dyn StagingStore>) -> Self {
        Self { staging }
    }

    /// Merge fetched records into the staged dataset. Writes back only if
    /// the dataset grew; returns how many records were appended.
    pub async fn stage(&self, fetched: Vec<ContentRecord>) -> Result<usize> {
        let mut dataset = self.staging.load().await;
        let fresh = merge_new(&dataset, fetched);

        if fresh.is_empty() {
            debug!("No new records, skipping staging write");
            return Ok(0);
        }

        let appended = fresh.len();
        dataset.extend(fresh);
        self.staging.save(&dataset).await?;

        info!(appended, total = dataset.len(), "Staged dataset updated");
        Ok(appended)
    }
}
