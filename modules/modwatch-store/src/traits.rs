//! Store seams. Postgres in production, memory in tests; the identity
//! key, not the storage medium, is the invariant.

use std::collections::HashMap;

use async_trait::async_trait;

use modwatch_common::{Alert, ContentRecord, ContentType, Incident, IncidentStatus, ModwatchError};

pub type Result<T> = std::result::Result<T, ModwatchError>;

/// Outcome of an identity-keyed insert. The unique constraint on the
/// identity field is the safety net against concurrent writers: a losing
/// writer observes `Duplicate`, never a silently-absorbed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// Durable storage for fetched content, one collection per kind, keyed by
/// the type-specific identity field.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert_content(&self, record: &ContentRecord) -> Result<InsertOutcome>;

    async fn content_exists(&self, content_type: ContentType, content_id: &str) -> Result<bool>;

    async fn count_content(&self, content_type: ContentType) -> Result<i64>;
}

/// A status update for an incident. `author_id` is carried only so the
/// guard can reject attempts to change it.
#[derive(Debug, Clone, Default)]
pub struct IncidentUpdate {
    pub status: Option<IncidentStatus>,
    pub author_id: Option<String>,
}

/// Apply an update against the stored incident, enforcing the author
/// guard. Pure so both store implementations share one set of rules.
pub fn apply_update(existing: &Incident, update: &IncidentUpdate) -> Result<Incident> {
    if let Some(author_id) = &update.author_id {
        if author_id != &existing.author_id {
            return Err(ModwatchError::Validation(
                "authorId is immutable after creation".into(),
            ));
        }
    }
    let mut updated = existing.clone();
    if let Some(status) = update.status {
        updated.status = status;
    }
    Ok(updated)
}

/// Incident lifecycle storage. Creation rejects duplicate identifiers
/// with `Conflict`; update and delete report `NotFound` for missing ids.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn create_incident(&self, incident: &Incident) -> Result<()>;

    async fn incident_exists(&self, incident_id: &str) -> Result<bool>;

    async fn get_incident(&self, incident_id: &str) -> Result<Option<Incident>>;

    /// Full collection, newest first. Aggregations recompute from this.
    async fn list_incidents(&self) -> Result<Vec<Incident>>;

    async fn count_incidents(&self) -> Result<i64>;

    async fn update_incident(&self, incident_id: &str, update: &IncidentUpdate)
        -> Result<Incident>;

    async fn delete_incident(&self, incident_id: &str) -> Result<()>;

    async fn create_alert(&self, alert: &Alert) -> Result<()>;
}

/// Author/school lookups: the existence check on creation and the
/// incident → author → school join for analytics.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn author_exists(&self, author_id: &str) -> Result<bool>;

    /// Map of author id → school name for every known author.
    async fn author_schools(&self) -> Result<HashMap<String, String>>;
}

/// The full store surface the API and jobs run against.
pub trait Store: ContentStore + IncidentStore + DirectoryStore {}

impl<T: ContentStore + IncidentStore + DirectoryStore> Store for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use modwatch_common::Severity;

    fn stored() -> Incident {
        Incident {
            incident_id: "inc-1".into(),
            content_id: "p-1".into(),
            content_type: ContentType::Post,
            author_id: "u-1".into(),
            severity_level: Severity::Low,
            status: IncidentStatus::PendingReview,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn update_applies_status() {
        let updated = apply_update(
            &stored(),
            &IncidentUpdate {
                status: Some(IncidentStatus::Resolved),
                author_id: None,
            },
        )
        .unwrap();
        assert_eq!(updated.status, IncidentStatus::Resolved);
        assert_eq!(updated.author_id, "u-1");
    }

    #[test]
    fn update_rejects_author_change() {
        let err = apply_update(
            &stored(),
            &IncidentUpdate {
                status: None,
                author_id: Some("u-2".into()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ModwatchError::Validation(_)));
    }

    #[test]
    fn update_accepts_same_author() {
        let updated = apply_update(
            &stored(),
            &IncidentUpdate {
                status: Some(IncidentStatus::Resolved),
                author_id: Some("u-1".into()),
            },
        )
        .unwrap();
        assert_eq!(updated.status, IncidentStatus::Resolved);
    }
}
