use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use forum_client::ForumClient;
use modwatch_common::{Config, SeverityPolicy};
use modwatch_ingest::{fetch_and_stage, ContentFetcher, Stager, Uploader};
use modwatch_store::{FileReports, FileStaging, PgStore};

#[derive(Parser)]
#[command(name = "ingest", about = "One-shot modwatch ingestion runs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch configured topics and merge new records into the staged dataset.
    Fetch,
    /// Promote staged content and reported incidents into durable storage.
    Upload,
    /// Fetch, then upload.
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Fetch => fetch(&config).await?,
        Command::Upload => upload(&config).await?,
        Command::All => {
            fetch(&config).await?;
            upload(&config).await?;
        }
    }

    Ok(())
}

async fn fetch(config: &Config) -> Result<()> {
    let client = ForumClient::new(
        config.forum_api_url.clone(),
        config.forum_api_token.clone(),
    );
    let fetcher = ContentFetcher::new(client, config.forum_topics.clone());
    let stager = Stager::new(Arc::new(FileStaging::new(config.staging_path.clone())));

    let appended = fetch_and_stage(&fetcher, &stager).await?;
    tracing::info!(appended, "Fetch run complete");
    Ok(())
}

async fn upload(config: &Config) -> Result<()> {
    let store = PgStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let uploader = Uploader::new(
        Arc::new(store),
        Arc::new(FileStaging::new(config.staging_path.clone())),
        Arc::new(FileReports::new(config.incident_report_path.clone())),
        SeverityPolicy::automated(),
    );

    let stats = uploader.run().await?;
    tracing::info!(%stats, "Upload run complete");
    Ok(())
}
