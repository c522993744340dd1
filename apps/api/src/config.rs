use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_LOCAL_STORE_PATH: &str = "reports_data.json";
const DEFAULT_WORKSHEET: &str = "Account A Data";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    /// Primary report store. Reports are kept locally only when unset.
    pub firebase_database_url: Option<String>,
    pub firebase_auth_token: Option<String>,
    pub google_sheets_api_key: Option<String>,
    pub local_store_path: PathBuf,
    pub default_worksheet: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            firebase_database_url: optional_env("FIREBASE_DATABASE_URL"),
            firebase_auth_token: optional_env("FIREBASE_AUTH_TOKEN"),
            google_sheets_api_key: optional_env("GOOGLE_SHEETS_API_KEY"),
            local_store_path: optional_env("LOCAL_STORE_PATH")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORE_PATH.to_string())
                .into(),
            default_worksheet: optional_env("DEFAULT_WORKSHEET")
                .unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated alike.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
