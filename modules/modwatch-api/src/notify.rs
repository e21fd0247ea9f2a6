//! Notification differ for the dashboard poll loop. The diff itself is a
//! pure function over two snapshots; `NotificationCenter` owns the
//! previous snapshot and the live entries. Nothing here is persisted, so
//! a restart starts from an empty snapshot.

use std::collections::HashMap;

use modwatch_common::{Incident, IncidentStatus, Severity};

/// Classification of one poll against the previous snapshot.
#[derive(Debug, Default)]
pub struct NotificationDiff {
    /// Pending incidents that were absent before, or present with a
    /// different prior status.
    pub newly_pending: Vec<Incident>,
    /// Ids of incidents that moved pending-review → resolved.
    pub newly_resolved: Vec<String>,
}

pub fn diff(previous: &[Incident], current: &[Incident]) -> NotificationDiff {
    let prior_status: HashMap<&str, IncidentStatus> = previous
        .iter()
        .map(|i| (i.incident_id.as_str(), i.status))
        .collect();

    let mut out = NotificationDiff::default();
    for incident in current {
        let prior = prior_status.get(incident.incident_id.as_str()).copied();
        match incident.status {
            IncidentStatus::PendingReview => {
                if prior != Some(IncidentStatus::PendingReview) {
                    out.newly_pending.push(incident.clone());
                }
            }
            IncidentStatus::Resolved => {
                if prior == Some(IncidentStatus::PendingReview) {
                    out.newly_resolved.push(incident.incident_id.clone());
                }
            }
        }
    }
    out
}

/// A live notification entry. Read state survives subsequent polls.
#[derive(Debug, Clone)]
pub struct Notification {
    pub incident_id: String,
    pub severity: Severity,
    pub read: bool,
}

/// Result of applying one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub added: usize,
    pub withdrawn: usize,
    /// Play the audio cue. At most once per poll, however many
    /// incidents arrived in the batch.
    pub chime: bool,
}

#[derive(Default)]
pub struct NotificationCenter {
    previous: Vec<Incident>,
    entries: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    /// Apply a fresh poll of the incident list: add one entry per
    /// newly-pending incident (never two live entries for one incident),
    /// withdraw entries for newly-resolved ones, leave the rest alone.
    pub fn poll(&mut self, current: Vec<Incident>) -> PollOutcome {
        let d = diff(&self.previous, &current);

        let mut added = 0;
        for incident in &d.newly_pending {
            if self
                .entries
                .iter()
                .any(|n| n.incident_id == incident.incident_id)
            {
                continue;
            }
            self.entries.push(Notification {
                incident_id: incident.incident_id.clone(),
                severity: incident.severity_level,
                read: false,
            });
            added += 1;
        }

        let before = self.entries.len();
        self.entries
            .retain(|n| !d.newly_resolved.iter().any(|id| id == &n.incident_id));
        let withdrawn = before - self.entries.len();

        self.previous = current;

        PollOutcome {
            added,
            withdrawn,
            chime: added > 0,
        }
    }

    pub fn mark_read(&mut self, incident_id: &str) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|n| n.incident_id == incident_id)
        {
            entry.read = true;
        }
    }
}
