//! In-memory store used by tests (and the one-shot CLI's dry-run mode).
//! Same identity-key semantics as the Postgres store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use modwatch_common::{Alert, ContentRecord, ContentType, Incident, ModwatchError};

use crate::traits::{
    apply_update, ContentStore, DirectoryStore, IncidentStore, IncidentUpdate, InsertOutcome,
    Result,
};

#[derive(Default)]
struct Inner {
    content: HashMap<(ContentType, String), ContentRecord>,
    incidents: Vec<Incident>,
    alerts: Vec<Alert>,
    /// author id → school name
    authors: HashMap<String, Option<String>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an author, optionally with a school, for directory lookups.
    pub fn add_author(&self, author_id: &str, school: Option<&str>) {
        self.inner
            .lock()
            .unwrap()
            .authors
            .insert(author_id.to_string(), school.map(str::to_string));
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert_content(&self, record: &ContentRecord) -> Result<InsertOutcome> {
        let mut inner = self.inner.lock().unwrap();
        let key = (record.content_type, record.content_id.clone());
        if inner.content.contains_key(&key) {
            return Ok(InsertOutcome::Duplicate);
        }
        inner.content.insert(key, record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn content_exists(&self, content_type: ContentType, content_id: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .content
            .contains_key(&(content_type, content_id.to_string())))
    }

    async fn count_content(&self, content_type: ContentType) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .content
            .keys()
            .filter(|(t, _)| *t == content_type)
            .count() as i64)
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn create_incident(&self, incident: &Incident) -> Result<()> {
        incident.validate()?;
        let mut inner = self.inner.lock().unwrap();
        if inner
            .incidents
            .iter()
            .any(|i| i.incident_id == incident.incident_id)
        {
            return Err(ModwatchError::Conflict(format!(
                "incident '{}' already exists",
                incident.incident_id
            )));
        }
        inner.incidents.push(incident.clone());
        Ok(())
    }

    async fn incident_exists(&self, incident_id: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.incidents.iter().any(|i| i.incident_id == incident_id))
    }

    async fn get_incident(&self, incident_id: &str) -> Result<Option<Incident>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .incidents
            .iter()
            .find(|i| i.incident_id == incident_id)
            .cloned())
    }

    async fn list_incidents(&self) -> Result<Vec<Incident>> {
        let inner = self.inner.lock().unwrap();
        let mut incidents = inner.incidents.clone();
        incidents.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(incidents)
    }

    async fn count_incidents(&self) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.incidents.len() as i64)
    }

    async fn update_incident(
        &self,
        incident_id: &str,
        update: &IncidentUpdate,
    ) -> Result<Incident> {
        let mut inner = self.inner.lock().unwrap();
        let pos = inner
            .incidents
            .iter()
            .position(|i| i.incident_id == incident_id)
            .ok_or_else(|| ModwatchError::NotFound(format!("incident '{incident_id}'")))?;

        let updated = apply_update(&inner.incidents[pos], update)?;
        inner.incidents[pos] = updated.clone();
        Ok(updated)
    }

    async fn delete_incident(&self, incident_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.incidents.len();
        inner.incidents.retain(|i| i.incident_id != incident_id);
        if inner.incidents.len() == before {
            return Err(ModwatchError::NotFound(format!("incident '{incident_id}'")));
        }
        Ok(())
    }

    async fn create_alert(&self, alert: &Alert) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.alerts.iter().any(|a| a.alert_id == alert.alert_id) {
            return Err(ModwatchError::Conflict(format!(
                "alert '{}' already exists",
                alert.alert_id
            )));
        }
        inner.alerts.push(alert.clone());
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn author_exists(&self, author_id: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.authors.contains_key(author_id))
    }

    async fn author_schools(&self) -> Result<HashMap<String, String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .authors
            .iter()
            .filter_map(|(id, school)| school.clone().map(|s| (id.clone(), s)))
            .collect())
    }
}
