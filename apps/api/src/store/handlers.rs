//! Axum route handlers for the Reports API.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analysis::export::{report_csv, source_record};
use crate::analysis::format::format_report_for_display;
use crate::errors::AppError;
use crate::models::report::Report;
use crate::state::AppState;
use crate::store::NewReport;

const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SaveReportRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub query: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SaveReportResponse {
    pub id: String,
    pub backend: String,
    pub report: Report,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ReportListResponse {
    pub reports: Vec<Report>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ReportDetailResponse {
    pub report: Report,
    pub formatted_content: String,
}

/// POST /api/v1/reports
pub async fn handle_save_report(
    State(state): State<AppState>,
    Json(request): Json<SaveReportRequest>,
) -> Result<(StatusCode, Json<SaveReportResponse>), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }

    let saved = state
        .store
        .save(NewReport {
            title: request.title,
            description: request.description,
            query: request.query,
            content: request.content,
        })
        .await?;

    state
        .session
        .write()
        .await
        .record_saved(saved.report.id.clone(), saved.report.title.clone());

    Ok((
        StatusCode::CREATED,
        Json(SaveReportResponse {
            id: saved.report.id.clone(),
            backend: saved.backend,
            report: saved.report,
        }),
    ))
}

/// GET /api/v1/reports?limit=n
///
/// Most recent first across every backend. `limit` defaults to 50.
pub async fn handle_list_reports(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ReportListResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit == 0 {
        return Err(AppError::Validation(
            "limit must be a positive number".to_string(),
        ));
    }

    let reports = state.store.list(limit).await?;
    Ok(Json(ReportListResponse {
        count: reports.len(),
        reports,
    }))
}

/// GET /api/v1/reports/:id
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReportDetailResponse>, AppError> {
    let report = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;

    Ok(Json(ReportDetailResponse {
        formatted_content: format_report_for_display(&report.content),
        report,
    }))
}

/// GET /api/v1/reports/:id/export
///
/// The report's source record and analysis text as a one-row CSV download.
pub async fn handle_export_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;

    let body = report_csv(&source_record(&report), &report.content)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"vidmetrics_report_{}.csv\"", report.id),
            ),
        ],
        body,
    ))
}

/// DELETE /api/v1/reports/:id
pub async fn handle_delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete(&id).await? {
        return Err(AppError::NotFound(format!("Report {id} not found")));
    }

    state.session.write().await.forget_report(&id);
    tracing::info!("Deleted report {id}");
    Ok(StatusCode::NO_CONTENT)
}
