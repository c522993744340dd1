//! Axum route handler for manual-form analysis.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::analysis::generator::{analyze_record, AnalysisOutcome};
use crate::errors::AppError;
use crate::models::video::VideoRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub record: VideoRecord,
    #[serde(default)]
    pub save: bool,
}

/// POST /api/v1/analysis
///
/// Derives ratios for one hand-entered record, generates its report and
/// optionally saves it. A failed generation or save is reported in the body's
/// `status`, not as an HTTP error.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisOutcome>, AppError> {
    validate_manual_record(&request.record)?;

    let outcome =
        analyze_record(&state.generator, &state.store, request.record, request.save).await;

    if let Some(id) = &outcome.report_id {
        state
            .session
            .write()
            .await
            .record_saved(id.clone(), outcome.title().to_string());
    }

    Ok(Json(outcome))
}

fn validate_manual_record(record: &VideoRecord) -> Result<(), AppError> {
    if record.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if !record.views.is_finite() || record.views <= 0.0 {
        return Err(AppError::Validation(
            "views must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
