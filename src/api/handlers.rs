//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ActionRequest, ActionResponse, CurrenciesResponse, ErrorResponse, SnapshotResponse,
};
use super::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Catalog
        .route("/api/currencies", get(list_currencies))
        // Snapshot
        .route("/api/state", get(get_state))
        .route("/api/stream", get(stream_state))
        // User actions
        .route("/api/actions", post(post_action))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn list_currencies(State(state): State<AppState>) -> Json<CurrenciesResponse> {
    Json(CurrenciesResponse {
        currencies: state.catalog.list_supported().to_vec(),
    })
}

async fn get_state(State(state): State<AppState>) -> Json<SnapshotResponse> {
    Json(SnapshotResponse::from(state.controller.current()))
}

async fn stream_state(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before reading the snapshot so no publish falls in between
    let broadcast_rx = state.controller.subscribe();
    let init = state.controller.current();
    sse_stream(init, broadcast_rx)
}

async fn post_action(
    State(state): State<AppState>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = req
        .into_action(&state.catalog)
        .map_err(AppError::BadRequest)?;

    state
        .controller
        .dispatch(action)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ActionResponse { queued: true }))
}

async fn get_version() -> &'static str {
    concat!("fx-converter ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
