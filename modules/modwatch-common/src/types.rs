use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModwatchError;

// --- Content ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Comment,
    Message,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Post => write!(f, "post"),
            ContentType::Comment => write!(f, "comment"),
            ContentType::Message => write!(f, "message"),
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = ModwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentType::Post),
            "comment" => Ok(ContentType::Comment),
            "message" => Ok(ContentType::Message),
            other => Err(ModwatchError::Validation(format!(
                "invalid content type '{other}', expected post, comment, or message"
            ))),
        }
    }
}

impl ContentType {
    /// The identity field this content kind is keyed by in durable storage.
    pub fn identity_field(&self) -> &'static str {
        match self {
            ContentType::Post => "post_id",
            ContentType::Comment => "comment_id",
            ContentType::Message => "message_id",
        }
    }
}

/// A sanitized record staged ahead of durable persistence.
/// Identity is `(content_type, content_id)`, unique within the staged
/// dataset and within durable storage. Never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub content_type: ContentType,
    pub content_id: String,
    /// For comments: the `content_id` of the parent post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ContentRecord {
    pub fn identity(&self) -> (ContentType, &str) {
        (self.content_type, self.content_id.as_str())
    }
}

// --- Incidents ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ModwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(ModwatchError::Validation(format!(
                "invalid severity level '{other}', expected low, medium, or high"
            ))),
        }
    }
}

/// Review states. The only transition exercised by the system is
/// pending-review → resolved; the reverse is not structurally forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentStatus {
    PendingReview,
    Resolved,
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentStatus::PendingReview => write!(f, "pending-review"),
            IncidentStatus::Resolved => write!(f, "resolved"),
        }
    }
}

impl std::str::FromStr for IncidentStatus {
    type Err = ModwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending-review" => Ok(IncidentStatus::PendingReview),
            "resolved" => Ok(IncidentStatus::Resolved),
            other => Err(ModwatchError::Validation(format!(
                "invalid status '{other}', expected pending-review or resolved"
            ))),
        }
    }
}

/// A moderation incident derived from flagged content.
/// `author_id` is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub incident_id: String,
    pub content_id: String,
    pub content_type: ContentType,
    pub author_id: String,
    pub severity_level: Severity,
    pub status: IncidentStatus,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Incident {
    /// Field-presence validation for creation. Severity and status values
    /// are already constrained by their types; this guards the rest.
    pub fn validate(&self) -> Result<(), ModwatchError> {
        if self.incident_id.trim().is_empty() {
            return Err(ModwatchError::Validation("incidentId is required".into()));
        }
        if self.content_id.trim().is_empty() {
            return Err(ModwatchError::Validation("contentId is required".into()));
        }
        if self.author_id.trim().is_empty() {
            return Err(ModwatchError::Validation("authorId is required".into()));
        }
        Ok(())
    }
}

// --- Alerts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Unresolved,
    Resolved,
    Reviewed,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Unresolved => write!(f, "unresolved"),
            AlertStatus::Resolved => write!(f, "resolved"),
            AlertStatus::Reviewed => write!(f, "reviewed"),
        }
    }
}

/// A staff annotation on an incident, created lazily when someone acts.
/// Many-to-one with Incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub alert_id: String,
    pub incident_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}
