//! Discovery endpoint and the catch-all for unmatched routes

use axum::{
    extract::{OriginalUri, State},
    http::Method,
    Json,
};
use pastpapers_common::errors::AppError;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub message: String,
}

/// Point callers at the papers collection
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: format!("Navigate to {}/papers", state.config.server.normalized_prefix()),
    })
}

/// Answer unmatched routes with the usual `{message}` body
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
