//! Per-process dashboard session.
//!
//! Holds what the dashboard caches between requests: the currently loaded
//! worksheet and the reports saved since the session began. Starts empty and
//! returns to empty on `reset`.

pub mod handlers;

use serde::Serialize;

use crate::models::video::VideoRecord;

/// Matches the default report listing size.
const SAVED_REPORTS_CAP: usize = 50;

/// A worksheet fetched by `POST /api/v1/sheets/load`, rows already enriched.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedSheet {
    pub sheet_url: String,
    pub worksheet: String,
    pub records: Vec<VideoRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedEntry {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Default)]
pub struct Session {
    loaded_sheet: Option<LoadedSheet>,
    saved_reports: Vec<SavedEntry>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub sheet_url: Option<String>,
    pub worksheet: Option<String>,
    pub row_count: usize,
    pub saved_reports: Vec<SavedEntry>,
}

impl Session {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn loaded_sheet(&self) -> Option<&LoadedSheet> {
        self.loaded_sheet.as_ref()
    }

    /// Replaces any previously loaded sheet.
    pub fn load_sheet(&mut self, sheet: LoadedSheet) {
        self.loaded_sheet = Some(sheet);
    }

    /// Newest first. Only the most recent 50 entries are kept.
    pub fn record_saved(&mut self, id: String, title: String) {
        self.saved_reports.retain(|e| e.id != id);
        self.saved_reports.insert(0, SavedEntry { id, title });
        self.saved_reports.truncate(SAVED_REPORTS_CAP);
    }

    pub fn forget_report(&mut self, id: &str) {
        self.saved_reports.retain(|e| e.id != id);
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            sheet_url: self.loaded_sheet.as_ref().map(|s| s.sheet_url.clone()),
            worksheet: self.loaded_sheet.as_ref().map(|s| s.worksheet.clone()),
            row_count: self.loaded_sheet.as_ref().map_or(0, |s| s.records.len()),
            saved_reports: self.saved_reports.clone(),
        }
    }
}
