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
pub struct CloseReviewRequest {
    pub review_id: String,
    #[serde(default)]
    pub closer_role: Option<String>,
}

/// `close_review`: terminal from any non-terminal state; frees the
/// review's notification entry.
#[instrument(name = "close_review_route", skip(state), fields(review_id = %body.review_id))]
pub async fn close_review_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CloseReviewRequest>,
) -> Response {
    match state
        .broker
        .close_review(&body.review_id, body.closer_role.as_deref())
        .await
    {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
