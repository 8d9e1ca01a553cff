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
pub struct TimelineRequest {
    pub review_id: String,
}

/// `get_review_timeline`: chronological event sequence for one review.
#[instrument(name = "timeline_route", skip(state), fields(review_id = %body.review_id))]
pub async fn timeline_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TimelineRequest>,
) -> Response {
    match state.broker.get_review_timeline(&body.review_id).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
