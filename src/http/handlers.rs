use super::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Response Types
// ============================================================================

/// What the publish and viewer pages need to join the live session
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    pub session_id: String,
    pub token: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /get-details
/// Join details for the most recent active session
pub async fn get_details(State(state): State<AppState>) -> impl IntoResponse {
    let record = match state.store.most_recent_active().await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "No active session".to_string());
        }
        Err(e) => {
            error!("Failed to query active session: {:#}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to query active session: {}", e),
            );
        }
    };

    match state.video.generate_token(&record.external_session_id) {
        Ok(token) => (
            StatusCode::OK,
            Json(SessionDetails {
                session_id: record.external_session_id,
                token,
                api_key: state.video.api_key().to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to generate token: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate token: {}", e),
            )
        }
    }
}

/// GET /status
/// Current controller snapshot
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.status.borrow().clone();
    (StatusCode::OK, Json(status))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
