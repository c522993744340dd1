//! Report Store: persists analysis reports across an ordered list of backends.
//!
//! Backends are tried in fixed priority order (hosted document store first,
//! local JSON file last). The id and timestamp of a new report are chosen once,
//! before the first attempt, so whichever backend accepts the write holds the
//! same document. Listings merge every backend and dedupe by id.

pub mod firebase;
pub mod handlers;
pub mod local;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::report::{Report, StoredReport};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error("Verification read failed for report {0}")]
    Verification(String),

    #[error("All storage backends failed: {0}")]
    Exhausted(String),
}

/// One storage implementation holding reports in the shared document shape.
#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Writes the report under `report.id`, replacing any existing document.
    async fn put(&self, report: &Report) -> Result<(), StoreError>;

    async fn fetch(&self, id: &str) -> Result<Option<Report>, StoreError>;

    /// Every report the backend holds, in no particular order.
    async fn fetch_all(&self) -> Result<Vec<Report>, StoreError>;

    /// Returns `false` when the id was not present.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;
}

/// Fields supplied by the caller when saving.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub query: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct SavedReport {
    pub report: Report,
    /// Name of the backend that accepted the write.
    pub backend: String,
}

pub struct ReportStore {
    backends: Vec<Arc<dyn ReportBackend>>,
}

impl ReportStore {
    /// `backends` in priority order.
    pub fn new(backends: Vec<Arc<dyn ReportBackend>>) -> Self {
        Self { backends }
    }

    /// Firebase (when `FIREBASE_DATABASE_URL` is set) followed by the local file.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let mut backends: Vec<Arc<dyn ReportBackend>> = Vec::new();

        if let Some(url) = &config.firebase_database_url {
            let firebase =
                firebase::FirebaseBackend::new(url.clone(), config.firebase_auth_token.clone())?;
            info!("Primary report store: Firebase at {}", firebase.database_url());
            backends.push(Arc::new(firebase));
        } else {
            warn!("FIREBASE_DATABASE_URL not set; reports are stored locally only");
        }

        let local = local::LocalFileBackend::new(config.local_store_path.clone());
        info!("Fallback report store: {}", local.path().display());
        backends.push(Arc::new(local));

        Ok(Self::new(backends))
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Assigns a fresh id and timestamp, then writes to the first backend that
    /// accepts it.
    pub async fn save(&self, new: NewReport) -> Result<SavedReport, StoreError> {
        let report = Report {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            query: new.query,
            content: new.content,
            created_at: Report::timestamp_now(),
        };

        let mut failures = Vec::new();
        for backend in &self.backends {
            match backend.put(&report).await {
                Ok(()) => {
                    info!("Report {} saved to {}", report.id, backend.name());
                    return Ok(SavedReport {
                        backend: backend.name().to_string(),
                        report,
                    });
                }
                Err(e) => {
                    warn!(
                        "Saving report {} to {} failed, trying next backend: {e}",
                        report.id,
                        backend.name()
                    );
                    failures.push(format!("{}: {e}", backend.name()));
                }
            }
        }

        Err(StoreError::Exhausted(failures.join("; ")))
    }

    /// First hit in priority order.
    pub async fn get(&self, id: &str) -> Result<Option<Report>, StoreError> {
        let mut failures = Vec::new();
        for backend in &self.backends {
            match backend.fetch(id).await {
                Ok(Some(report)) => return Ok(Some(report)),
                Ok(None) => {}
                Err(e) => {
                    warn!("Reading report {id} from {} failed: {e}", backend.name());
                    failures.push(format!("{}: {e}", backend.name()));
                }
            }
        }

        if !self.backends.is_empty() && failures.len() == self.backends.len() {
            return Err(StoreError::Exhausted(failures.join("; ")));
        }
        Ok(None)
    }

    /// Up to `limit` reports across all backends, newest first. A report held
    /// by several backends appears once, as the higher-priority copy.
    pub async fn list(&self, limit: usize) -> Result<Vec<Report>, StoreError> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut failures = Vec::new();

        for backend in &self.backends {
            match backend.fetch_all().await {
                Ok(reports) => {
                    for report in reports {
                        if seen.insert(report.id.clone()) {
                            merged.push(report);
                        }
                    }
                }
                Err(e) => {
                    warn!("Listing reports from {} failed: {e}", backend.name());
                    failures.push(format!("{}: {e}", backend.name()));
                }
            }
        }

        if !self.backends.is_empty() && failures.len() == self.backends.len() {
            return Err(StoreError::Exhausted(failures.join("; ")));
        }

        sort_newest_first(&mut merged);
        merged.truncate(limit);
        Ok(merged)
    }

    /// Removes the report from every backend holding it. Deletion is permanent.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        let mut failures = Vec::new();

        for backend in &self.backends {
            match backend.remove(id).await {
                Ok(true) => {
                    info!("Report {id} deleted from {}", backend.name());
                    removed = true;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Deleting report {id} from {} failed: {e}", backend.name());
                    failures.push(format!("{}: {e}", backend.name()));
                }
            }
        }

        if !removed && !self.backends.is_empty() && failures.len() == self.backends.len() {
            return Err(StoreError::Exhausted(failures.join("; ")));
        }
        Ok(removed)
    }
}

pub(crate) fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Converts an `{id: document}` map into reports, skipping entries that are
/// not report documents (e.g. marker keys).
pub(crate) fn collect_reports(entries: Map<String, Value>) -> Vec<Report> {
    entries
        .into_iter()
        .filter(|(_, value)| value.is_object())
        .filter_map(|(key, value)| match serde_json::from_value::<StoredReport>(value) {
            Ok(stored) => Some(stored.into_report(&key)),
            Err(e) => {
                warn!("Skipping unreadable report document {key}: {e}");
                None
            }
        })
        .collect()
}
