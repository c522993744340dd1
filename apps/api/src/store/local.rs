//! Local JSON file backend.
//!
//! All reports live in a single file shaped `{"reports": {"<id>": {...}}}`,
//! the same document shape the hosted store uses. Read-modify-write cycles are
//! serialized by an in-process mutex; writes land in a sibling temp file that is
//! renamed over the target.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{collect_reports, ReportBackend, StoreError};
use crate::models::report::{Report, StoredReport};

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalDocument {
    #[serde(default)]
    reports: Map<String, Value>,
}

pub struct LocalFileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as empty. A corrupt file is logged and read as empty
    /// so the next write replaces it.
    async fn load(&self) -> Result<LocalDocument, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LocalDocument::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<LocalDocument>(&raw) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(
                    "Local report store {} is not valid JSON, starting empty: {e}",
                    self.path.display()
                );
                Ok(LocalDocument::default())
            }
        }
    }

    async fn persist(&self, doc: &LocalDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "reports_data.json".into());
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, serde_json::to_string_pretty(doc)?).await?;
        fs::rename(&tmp_path, &self.path).await?;
        debug!("Local report store written: {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl ReportBackend for LocalFileBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(&self, report: &Report) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        doc.reports.insert(report.id.clone(), report.to_document());
        self.persist(&doc).await
    }

    async fn fetch(&self, id: &str) -> Result<Option<Report>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        match doc.reports.remove(id) {
            Some(value) if value.is_object() => {
                let stored: StoredReport = serde_json::from_value(value)?;
                Ok(Some(stored.into_report(id)))
            }
            _ => Ok(None),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Report>, StoreError> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(collect_reports(doc.reports))
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.reports.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(&doc).await?;
        Ok(true)
    }
}
