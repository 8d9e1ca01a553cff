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
pub struct GetDiscussionRequest {
    pub review_id: String,
    /// Restrict to one round; rounds start at 1.
    #[serde(default)]
    pub round: Option<i64>,
}

/// `get_discussion`: messages in insertion order. Malformed metadata comes
/// back as `null` with a warning flag, never as an error.
#[instrument(name = "get_discussion_route", skip(state), fields(review_id = %body.review_id))]
pub async fn get_discussion_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GetDiscussionRequest>,
) -> Response {
    match state
        .broker
        .get_discussion(&body.review_id, body.round)
        .await
    {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
