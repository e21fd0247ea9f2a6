//! Promotes staged content and externally-reported incidents into durable
//! storage. Runs on its own schedule, independent of the fetch job.

use std::sync::Arc;

use tracing::{info, warn};

use modwatch_common::SeverityPolicy;
use modwatch_store::{
    ContentStore, IncidentStore, InsertOutcome, ReportSource, StagingStore, Store,
};

use crate::Result;

/// Counters from one upload run, logged as a single summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadStats {
    pub content_inserted: u32,
    pub content_skipped: u32,
    pub incidents_inserted: u32,
    pub incidents_skipped: u32,
}

impl std::fmt::Display for UploadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "content {} inserted / {} skipped, incidents {} inserted / {} skipped",
            self.content_inserted,
            self.content_skipped,
            self.incidents_inserted,
            self.incidents_skipped
        )
    }
}

pub struct Uploader {
    store: Arc<dyn Store>,
    staging: Arc<dyn StagingStore>,
    reports: Arc<dyn ReportSource>,
    policy: SeverityPolicy,
}

impl Uploader {
    pub fn new(
        store: Arc<dyn Store>,
        staging: Arc<dyn StagingStore>,
        reports: Arc<dyn ReportSource>,
        policy: SeverityPolicy,
    ) -> Self {
        Self {
            store,
            staging,
            reports,
            policy,
        }
    }

    /// One upload pass: upsert staged content by identity field, then
    /// reported incidents with the severity policy applied up front.
    pub async fn run(&self) -> Result<UploadStats> {
        let mut stats = UploadStats::default();

        let staged = self.staging.load().await;
        for record in &staged {
            if self
                .store
                .content_exists(record.content_type, &record.content_id)
                .await?
            {
                stats.content_skipped += 1;
                continue;
            }
            // A writer that slipped in between the check and the insert
            // loses to the unique index and shows up as Duplicate here.
            match self.store.insert_content(record).await? {
                InsertOutcome::Inserted => stats.content_inserted += 1,
                InsertOutcome::Duplicate => stats.content_skipped += 1,
            }
        }

        let reports = self.reports.load_reports().await;
        for incident in &reports {
            // Policy applies before the existence check: a medium-severity
            // report counts as skipped regardless of duplication status.
            if !self.policy.admits(incident.severity_level) {
                stats.incidents_skipped += 1;
                continue;
            }
            if self.store.incident_exists(&incident.incident_id).await? {
                stats.incidents_skipped += 1;
                continue;
            }
            match self.store.create_incident(incident).await {
                Ok(()) => stats.incidents_inserted += 1,
                Err(modwatch_common::ModwatchError::Conflict(_)) => {
                    stats.incidents_skipped += 1;
                }
                Err(modwatch_common::ModwatchError::Validation(msg)) => {
                    warn!(incident_id = %incident.incident_id, %msg, "Invalid incident report, skipping");
                    stats.incidents_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            content_inserted = stats.content_inserted,
            content_skipped = stats.content_skipped,
            incidents_inserted = stats.incidents_inserted,
            incidents_skipped = stats.incidents_skipped,
            "Upload run complete"
        );
        Ok(stats)
    }
}
