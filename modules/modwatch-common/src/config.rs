use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // External discussion API
    pub forum_api_url: String,
    pub forum_api_token: String,
    pub forum_topics: Vec<String>,

    // Postgres
    pub database_url: String,

    // Staging files
    pub staging_path: PathBuf,
    pub incident_report_path: PathBuf,

    // Job intervals (seconds)
    pub fetch_interval_secs: u64,
    pub upload_interval_secs: u64,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            forum_api_url: required_env("FORUM_API_URL"),
            forum_api_token: required_env("FORUM_API_TOKEN"),
            forum_topics: env::var("FORUM_TOPICS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            database_url: required_env("DATABASE_URL"),
            staging_path: env::var("STAGING_PATH")
                .unwrap_or_else(|_| "data/staged_content.json".to_string())
                .into(),
            incident_report_path: env::var("INCIDENT_REPORT_PATH")
                .unwrap_or_else(|_| "data/incident_reports.json".to_string())
                .into(),
            fetch_interval_secs: env_u64("FETCH_INTERVAL_SECS", 300),
            upload_interval_secs: env_u64("UPLOAD_INTERVAL_SECS", 600),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
