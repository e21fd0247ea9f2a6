//! Incident lifecycle REST handlers. Validation failures come back as
//! 400 with a message, duplicate identifiers as 409, missing ids as 404.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use modwatch_common::{
    Alert, AlertStatus, ContentType, Incident, IncidentStatus, ModwatchError, Severity,
    SeverityPolicy,
};
use modwatch_store::{ContentStore, DirectoryStore, IncidentStore, IncidentUpdate};

use crate::AppState;

// --- Request bodies ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    incident_id: String,
    content_id: String,
    content_type: String,
    author_id: String,
    severity_level: String,
    status: String,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncidentRequest {
    status: Option<String>,
    author_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    admin_id: Option<String>,
}

// --- Helpers ---

fn bad_request(message: String) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

fn store_error(e: ModwatchError, what: &str) -> axum::response::Response {
    match e {
        ModwatchError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": msg})),
        )
            .into_response(),
        ModwatchError::Conflict(msg) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": msg})),
        )
            .into_response(),
        ModwatchError::Validation(msg) => bad_request(msg),
        e => {
            warn!(error = %e, "Failed to {what}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Handlers ---

pub async fn list_incidents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_incidents().await {
        Ok(incidents) => Json(incidents).into_response(),
        Err(e) => store_error(e, "list incidents"),
    }
}

pub async fn incident_count(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.count_incidents().await {
        Ok(count) => Json(serde_json::json!({"count": count})).into_response(),
        Err(e) => store_error(e, "count incidents"),
    }
}

pub async fn get_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_incident(&id).await {
        Ok(Some(incident)) => Json(incident).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("incident '{id}' not found")})),
        )
            .into_response(),
        Err(e) => store_error(e, "load incident"),
    }
}

/// Manual/administrative creation path: all three severities are
/// permitted, unlike the automated pipeline.
pub async fn create_incident(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateIncidentRequest>,
) -> impl IntoResponse {
    let severity: Severity = match body.severity_level.parse() {
        Ok(s) => s,
        Err(ModwatchError::Validation(msg)) => return bad_request(msg),
        Err(e) => return store_error(e, "parse severity"),
    };
    let status: IncidentStatus = match body.status.parse() {
        Ok(s) => s,
        Err(ModwatchError::Validation(msg)) => return bad_request(msg),
        Err(e) => return store_error(e, "parse status"),
    };
    let content_type: ContentType = match body.content_type.parse() {
        Ok(t) => t,
        Err(ModwatchError::Validation(msg)) => return bad_request(msg),
        Err(e) => return store_error(e, "parse content type"),
    };

    let policy = SeverityPolicy::manual();
    if !policy.admits(severity) {
        return bad_request(format!(
            "severity '{severity}' is not admitted on the {} path",
            policy.name()
        ));
    }

    // Referential checks: the author and the flagged content must exist.
    match state.store.author_exists(&body.author_id).await {
        Ok(true) => {}
        Ok(false) => return bad_request(format!("author '{}' not found", body.author_id)),
        Err(e) => return store_error(e, "check author"),
    }
    match state
        .store
        .content_exists(content_type, &body.content_id)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            return bad_request(format!(
                "{} '{}' not found",
                content_type, body.content_id
            ))
        }
        Err(e) => return store_error(e, "check content"),
    }

    let incident = Incident {
        incident_id: body.incident_id,
        content_id: body.content_id,
        content_type,
        author_id: body.author_id,
        severity_level: severity,
        status,
        timestamp: body.timestamp.unwrap_or_else(Utc::now),
    };

    match state.store.create_incident(&incident).await {
        Ok(()) => (StatusCode::CREATED, Json(incident)).into_response(),
        Err(e) => store_error(e, "create incident"),
    }
}

pub async fn update_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateIncidentRequest>,
) -> impl IntoResponse {
    let status = match body
        .status
        .as_deref()
        .map(|s| s.parse::<IncidentStatus>())
        .transpose()
    {
        Ok(s) => s,
        Err(ModwatchError::Validation(msg)) => return bad_request(msg),
        Err(e) => return store_error(e, "parse status"),
    };

    let update = IncidentUpdate {
        status,
        author_id: body.author_id,
    };

    match state.store.update_incident(&id, &update).await {
        Ok(incident) => Json(incident).into_response(),
        Err(e) => store_error(e, "update incident"),
    }
}

pub async fn delete_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_incident(&id).await {
        Ok(()) => Json(serde_json::json!({"deleted": id})).into_response(),
        Err(e) => store_error(e, "delete incident"),
    }
}

/// Lazily attach an alert when staff act on an incident.
pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CreateAlertRequest>,
) -> impl IntoResponse {
    match state.store.incident_exists(&id).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": format!("incident '{id}' not found")})),
            )
                .into_response()
        }
        Err(e) => return store_error(e, "check incident"),
    }

    let alert = Alert {
        alert_id: Uuid::new_v4().to_string(),
        incident_id: id,
        admin_id: body.admin_id,
        status: AlertStatus::Unresolved,
        created_at: Utc::now(),
    };

    match state.store.create_alert(&alert).await {
        Ok(()) => (StatusCode::CREATED, Json(alert)).into_response(),
        Err(e) => store_error(e, "create alert"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modwatch_common::ContentRecord;
    use modwatch_store::{ContentStore, IncidentStore, MemoryStore};

    fn state_with_author() -> Arc<AppState> {
        let store = MemoryStore::new();
        store.add_author("u-1", Some("Northside High"));
        Arc::new(AppState {
            store: Arc::new(store),
        })
    }

    async fn seed_content(state: &AppState) {
        state
            .store
            .insert_content(&ContentRecord {
                content_type: ContentType::Post,
                content_id: "p-1".into(),
                parent_id: None,
                author_id: Some("u-1".into()),
                body: "flagged".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    fn create_body(id: &str, severity: &str, status: &str) -> CreateIncidentRequest {
        CreateIncidentRequest {
            incident_id: id.to_string(),
            content_id: "p-1".to_string(),
            content_type: "post".to_string(),
            author_id: "u-1".to_string(),
            severity_level: severity.to_string(),
            status: status.to_string(),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn manual_create_accepts_medium_severity() {
        let state = state_with_author();
        seed_content(&state).await;

        let resp = create_incident(
            State(state.clone()),
            Json(create_body("inc-1", "medium", "pending-review")),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert!(state.store.incident_exists("inc-1").await.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_bad_severity_and_status() {
        let state = state_with_author();
        seed_content(&state).await;

        let resp = create_incident(
            State(state.clone()),
            Json(create_body("inc-1", "catastrophic", "pending-review")),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = create_incident(
            State(state.clone()),
            Json(create_body("inc-1", "low", "open")),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_create_is_a_conflict() {
        let state = state_with_author();
        seed_content(&state).await;

        let resp = create_incident(
            State(state.clone()),
            Json(create_body("inc-1", "low", "pending-review")),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = create_incident(
            State(state.clone()),
            Json(create_body("inc-1", "high", "pending-review")),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_rejects_unknown_author_and_content() {
        let state = state_with_author();
        seed_content(&state).await;

        let mut body = create_body("inc-1", "low", "pending-review");
        body.author_id = "ghost".into();
        let resp = create_incident(State(state.clone()), Json(body))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let mut body = create_body("inc-1", "low", "pending-review");
        body.content_id = "p-404".into();
        let resp = create_incident(State(state.clone()), Json(body))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_moves_pending_to_resolved_but_guards_author() {
        let state = state_with_author();
        seed_content(&state).await;
        create_incident(
            State(state.clone()),
            Json(create_body("inc-1", "high", "pending-review")),
        )
        .await
        .into_response();

        let resp = update_incident(
            State(state.clone()),
            Path("inc-1".to_string()),
            Json(UpdateIncidentRequest {
                status: Some("resolved".into()),
                author_id: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let incident = state.store.get_incident("inc-1").await.unwrap().unwrap();
        assert_eq!(incident.status, IncidentStatus::Resolved);

        let resp = update_incident(
            State(state.clone()),
            Path("inc-1".to_string()),
            Json(UpdateIncidentRequest {
                status: None,
                author_id: Some("u-2".into()),
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_missing_incident_is_not_found() {
        let state = state_with_author();
        let resp = delete_incident(State(state), Path("nope".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn alert_attaches_to_an_existing_incident_only() {
        let state = state_with_author();
        seed_content(&state).await;
        create_incident(
            State(state.clone()),
            Json(create_body("inc-1", "high", "pending-review")),
        )
        .await
        .into_response();

        let resp = create_alert(
            State(state.clone()),
            Path("inc-1".to_string()),
            Json(CreateAlertRequest {
                admin_id: Some("admin-1".into()),
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = create_alert(
            State(state.clone()),
            Path("inc-404".to_string()),
            Json(CreateAlertRequest { admin_id: None }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
