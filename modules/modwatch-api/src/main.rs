use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use forum_client::ForumClient;
use modwatch_api::{build_router, AppState};
use modwatch_common::{Config, SeverityPolicy};
use modwatch_ingest::{
    fetch_and_stage, run_periodic, ContentFetcher, JobSlot, Stager, Uploader,
};
use modwatch_store::{FileReports, FileStaging, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let store = PgStore::connect(&config.database_url).await?;
    store.migrate().await?;
    let store = Arc::new(store);

    let staging = Arc::new(FileStaging::new(config.staging_path.clone()));

    // Fetch→stage job: pull topics, dedupe into the staged dataset.
    let fetcher = Arc::new(ContentFetcher::new(
        ForumClient::new(
            config.forum_api_url.clone(),
            config.forum_api_token.clone(),
        ),
        config.forum_topics.clone(),
    ));
    let fetch_slot = JobSlot::new("fetch");
    let fetch_period = Duration::from_secs(config.fetch_interval_secs);
    let fetch_staging = staging.clone();
    tokio::spawn(run_periodic(fetch_slot, fetch_period, move || {
        let fetcher = fetcher.clone();
        let stager = Stager::new(fetch_staging.clone());
        async move {
            fetch_and_stage(&fetcher, &stager).await?;
            Ok(())
        }
    }));

    // Upload job: promote staged content and reported incidents.
    let uploader = Arc::new(Uploader::new(
        store.clone(),
        staging.clone(),
        Arc::new(FileReports::new(config.incident_report_path.clone())),
        SeverityPolicy::automated(),
    ));
    let upload_slot = JobSlot::new("upload");
    let upload_period = Duration::from_secs(config.upload_interval_secs);
    tokio::spawn(run_periodic(upload_slot, upload_period, move || {
        let uploader = uploader.clone();
        async move {
            uploader.run().await?;
            Ok(())
        }
    }));

    let state = Arc::new(AppState {
        store: store.clone(),
    });
    let app = build_router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(%addr, "modwatch API listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
