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

#[derive(Debug, Deserialize)]
pub struct GetReviewStatusRequest {
    pub review_id: String,
    /// Long-poll: park on this review's signal, then re-read.
    #[serde(default)]
    pub wait: bool,
    /// Caller label, for log correlation only.
    #[serde(default)]
    pub caller_id: Option<String>,
}

/// `get_review_status`: the full row minus diff bodies.
#[instrument(name = "get_review_status_route", skip(state), fields(review_id = %body.review_id))]
pub async fn get_review_status_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GetReviewStatusRequest>,
) -> Response {
    match state
        .broker
        .get_review_status(&body.review_id, body.wait, body.caller_id.as_deref())
        .await
    {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
