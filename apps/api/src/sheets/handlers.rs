//! Axum route handlers for the worksheet workflow: load a sheet into the
//! session, inspect its rows, analyze some or all of them.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::generator::{analyze_record, AnalysisOutcome};
use crate::analysis::metrics::derive_ratios;
use crate::errors::AppError;
use crate::models::video::VideoRecord;
use crate::session::LoadedSheet;
use crate::sheets::parse_sheet_url;
use crate::sheets::rows::records_from_table;
use crate::state::AppState;

const PREVIEW_ROWS: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoadSheetRequest {
    pub sheet_url: String,
    /// Falls back to `DEFAULT_WORKSHEET`.
    pub worksheet: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoadSheetResponse {
    pub sheet_url: String,
    pub worksheet: String,
    pub row_count: usize,
    pub preview: Vec<VideoRecord>,
}

#[derive(Debug, Serialize)]
pub struct SheetRowsResponse {
    pub sheet_url: String,
    pub worksheet: String,
    pub rows: Vec<VideoRecord>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRowsRequest {
    /// Zero-based indices into the loaded rows. Empty selects every row.
    #[serde(default)]
    pub row_indices: Vec<usize>,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct RowAnalysis {
    pub row_index: usize,
    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeRowsResponse {
    pub results: Vec<RowAnalysis>,
    pub saved_count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sheets/load
///
/// Reads the worksheet, checks the required columns, derives ratios for every
/// row and caches the result in the session.
pub async fn handle_load_sheet(
    State(state): State<AppState>,
    Json(request): Json<LoadSheetRequest>,
) -> Result<Json<LoadSheetResponse>, AppError> {
    let sheet = parse_sheet_url(&request.sheet_url)?;
    let worksheet = request
        .worksheet
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .unwrap_or_else(|| state.config.default_worksheet.clone());

    let table = state.sheets.read_rows(&sheet, &worksheet).await?;
    let records =
        records_from_table(&table).map_err(|e| AppError::Validation(e.to_string()))?;
    let records: Vec<VideoRecord> = records.into_iter().map(derive_ratios).collect();

    info!(
        "Loaded {} rows from worksheet '{worksheet}' of sheet {}",
        records.len(),
        sheet.id
    );

    let response = LoadSheetResponse {
        sheet_url: sheet.url.clone(),
        worksheet: worksheet.clone(),
        row_count: records.len(),
        preview: records.iter().take(PREVIEW_ROWS).cloned().collect(),
    };

    state.session.write().await.load_sheet(LoadedSheet {
        sheet_url: sheet.url,
        worksheet,
        records,
    });

    Ok(Json(response))
}

/// GET /api/v1/sheets/rows
pub async fn handle_get_rows(
    State(state): State<AppState>,
) -> Result<Json<SheetRowsResponse>, AppError> {
    let session = state.session.read().await;
    let sheet = session
        .loaded_sheet()
        .ok_or_else(|| AppError::NotFound("No worksheet loaded".to_string()))?;

    Ok(Json(SheetRowsResponse {
        sheet_url: sheet.sheet_url.clone(),
        worksheet: sheet.worksheet.clone(),
        rows: sheet.records.clone(),
    }))
}

/// POST /api/v1/sheets/analyze
///
/// Analyzes the selected rows one after another. Each row carries its own
/// status; one failed row does not stop the rest.
pub async fn handle_analyze_rows(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRowsRequest>,
) -> Result<Json<AnalyzeRowsResponse>, AppError> {
    // Copy the selection out so the session lock is not held across generation.
    let selected = {
        let session = state.session.read().await;
        let sheet = session
            .loaded_sheet()
            .ok_or_else(|| AppError::Validation("Load a worksheet first".to_string()))?;
        select_rows(&sheet.records, &request.row_indices)?
    };

    let mut results = Vec::with_capacity(selected.len());
    for (row_index, record) in selected {
        let outcome = analyze_record(&state.generator, &state.store, record, request.save).await;
        results.push(RowAnalysis { row_index, outcome });
    }

    let mut saved_count = 0;
    {
        let mut session = state.session.write().await;
        for result in &results {
            if let Some(id) = &result.outcome.report_id {
                session.record_saved(id.clone(), result.outcome.title().to_string());
                saved_count += 1;
            }
        }
    }

    info!(
        "Analyzed {} rows, saved {saved_count} reports",
        results.len()
    );

    Ok(Json(AnalyzeRowsResponse {
        results,
        saved_count,
    }))
}

/// Resolves the requested indices against the loaded rows.
fn select_rows(
    records: &[VideoRecord],
    indices: &[usize],
) -> Result<Vec<(usize, VideoRecord)>, AppError> {
    if indices.is_empty() {
        return Ok(records.iter().cloned().enumerate().collect());
    }

    indices
        .iter()
        .map(|&i| {
            records.get(i).cloned().map(|r| (i, r)).ok_or_else(|| {
                AppError::Validation(format!(
                    "Row index {i} is out of range (worksheet has {} rows)",
                    records.len()
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<VideoRecord> {
        (0..n)
            .map(|i| VideoRecord {
                title: format!("Video {i}"),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_empty_selection_is_every_row() {
        let selected = select_rows(&records(3), &[]).unwrap();
        let indices: Vec<usize> = selected.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_selection_keeps_requested_order() {
        let selected = select_rows(&records(3), &[2, 0]).unwrap();
        assert_eq!(selected[0].1.title, "Video 2");
        assert_eq!(selected[1].1.title, "Video 0");
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let err = select_rows(&records(2), &[0, 2]).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Row index 2")));
    }
}
