use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuditLogRequest {
    /// One review's events, or every event when absent.
    pub review_id: Option<String>,
}

/// `get_audit_log`: the append-only event record, in append order.
#[instrument(name = "audit_log_route", skip(state, body))]
pub async fn audit_log_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuditLogRequest>,
) -> Response {
    match state.broker.get_audit_log(body.review_id.as_deref()).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
