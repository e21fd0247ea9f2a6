pub mod analytics;
pub mod notify;
pub mod rest;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use modwatch_store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/incidents",
            get(rest::list_incidents).post(rest::create_incident),
        )
        .route("/api/incidents/count", get(rest::incident_count))
        .route(
            "/api/incidents/{id}",
            get(rest::get_incident)
                .put(rest::update_incident)
                .delete(rest::delete_incident),
        )
        .route("/api/incidents/{id}/alerts", post(rest::create_alert))
        .route("/api/analytics/top-authors", get(analytics::api_top_authors))
        .route("/api/analytics/top-schools", get(analytics::api_top_schools))
        .route("/api/analytics/by-day", get(analytics::api_by_day))
        .route("/", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
