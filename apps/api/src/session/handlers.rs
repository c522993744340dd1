use axum::{extract::State, Json};

use crate::session::SessionSummary;
use crate::state::AppState;

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionSummary> {
    Json(state.session.read().await.summary())
}

/// POST /api/v1/session/reset
///
/// Drops the loaded sheet and the saved-report list. Stored reports are untouched.
pub async fn handle_reset_session(State(state): State<AppState>) -> Json<SessionSummary> {
    let mut session = state.session.write().await;
    session.reset();
    tracing::info!("Session reset");
    Json(session.summary())
}
