pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::session::handlers as session;
use crate::sheets::handlers as sheets;
use crate::state::AppState;
use crate::store::handlers as reports;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Manual-form analysis
        .route("/api/v1/analysis", post(analysis::handle_analyze))
        // Worksheet workflow
        .route("/api/v1/sheets/load", post(sheets::handle_load_sheet))
        .route("/api/v1/sheets/rows", get(sheets::handle_get_rows))
        .route("/api/v1/sheets/analyze", post(sheets::handle_analyze_rows))
        // Session
        .route("/api/v1/session", get(session::handle_get_session))
        .route("/api/v1/session/reset", post(session::handle_reset_session))
        // Reports
        .route(
            "/api/v1/reports",
            get(reports::handle_list_reports).post(reports::handle_save_report),
        )
        .route(
            "/api/v1/reports/:id",
            get(reports::handle_get_report).delete(reports::handle_delete_report),
        )
        .route(
            "/api/v1/reports/:id/export",
            get(reports::handle_export_report),
        )
        .with_state(state)
}
