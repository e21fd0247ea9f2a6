//! Read-only rollups over the incident collection. Recomputed from the
//! full collection on every call, no caching.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;

use modwatch_common::Incident;
use modwatch_store::{DirectoryStore, IncidentStore};

use crate::AppState;

const TOP_N: usize = 10;
/// Authors below this incident count stay out of the top-authors rollup.
const MIN_AUTHOR_INCIDENTS: i64 = 10;

const EMPTY_LABEL: &str = "No incidents reported";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCount {
    pub author_id: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolCount {
    pub school: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: i64,
}

fn counted<K: Eq + std::hash::Hash>(keys: impl Iterator<Item = K>) -> HashMap<K, i64> {
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Sort by count descending, label ascending for stable ties, cap at top N.
fn ranked<K: Ord>(counts: HashMap<K, i64>) -> Vec<(K, i64)> {
    let mut rows: Vec<(K, i64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(TOP_N);
    rows
}

/// Authors with at least `MIN_AUTHOR_INCIDENTS` incidents, most first.
/// A single placeholder row stands in when nobody qualifies.
pub fn top_authors(incidents: &[Incident]) -> Vec<AuthorCount> {
    let counts = counted(incidents.iter().map(|i| i.author_id.clone()));
    let rows: Vec<AuthorCount> = ranked(
        counts
            .into_iter()
            .filter(|(_, n)| *n >= MIN_AUTHOR_INCIDENTS)
            .collect(),
    )
    .into_iter()
    .map(|(author_id, count)| AuthorCount { author_id, count })
    .collect();

    if rows.is_empty() {
        return vec![AuthorCount {
            author_id: EMPTY_LABEL.to_string(),
            count: 0,
        }];
    }
    rows
}

/// Incident counts grouped by the author's school. Incidents whose author
/// has no known school fall out of the join.
pub fn top_schools(
    incidents: &[Incident],
    author_schools: &HashMap<String, String>,
) -> Vec<SchoolCount> {
    let counts = counted(
        incidents
            .iter()
            .filter_map(|i| author_schools.get(&i.author_id).cloned()),
    );
    let rows: Vec<SchoolCount> = ranked(counts)
        .into_iter()
        .map(|(school, count)| SchoolCount { school, count })
        .collect();

    if rows.is_empty() {
        return vec![SchoolCount {
            school: EMPTY_LABEL.to_string(),
            count: 0,
        }];
    }
    rows
}

/// Incident counts per calendar day (UTC). The placeholder row carries
/// `today` so an empty dashboard still renders a current date.
pub fn incidents_by_day(incidents: &[Incident], today: NaiveDate) -> Vec<DayCount> {
    let counts = counted(incidents.iter().map(|i| i.timestamp.date_naive()));
    let rows: Vec<DayCount> = ranked(counts)
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect();

    if rows.is_empty() {
        return vec![DayCount {
            date: today,
            count: 0,
        }];
    }
    rows
}

// --- Handlers ---

pub async fn api_top_authors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_incidents().await {
        Ok(incidents) => Json(top_authors(&incidents)).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load incidents for top-authors rollup");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn api_top_schools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let incidents = match state.store.list_incidents().await {
        Ok(incidents) => incidents,
        Err(e) => {
            warn!(error = %e, "Failed to load incidents for top-schools rollup");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    match state.store.author_schools().await {
        Ok(schools) => Json(top_schools(&incidents, &schools)).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load author schools");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn api_by_day(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_incidents().await {
        Ok(incidents) => {
            Json(incidents_by_day(&incidents, Utc::now().date_naive())).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to load incidents for by-day rollup");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
