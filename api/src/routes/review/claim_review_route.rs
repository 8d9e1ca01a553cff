use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppError;
use crate::routes::review::claim_review_request::ClaimReviewRequest;

/// `claim_review`: at-most-one claim per pending review. The returned
/// `claim_generation` is the optimistic-concurrency token for the verdict.
/// A stale diff auto-rejects the review and comes back as `diff_conflict`.
#[instrument(name = "claim_review_route", skip(state), fields(review_id = %body.review_id))]
pub async fn claim_review_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClaimReviewRequest>,
) -> Response {
    match state
        .broker
        .claim_review(&body.review_id, &body.reviewer_id)
        .await
    {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
