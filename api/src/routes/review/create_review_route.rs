use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppError;
use crate::routes::review::create_review_request::CreateReviewRequest;

/// `create_review`: new proposal, or a revision when `review_id` is set.
#[instrument(name = "create_review_route", skip(state, body))]
pub async fn create_review_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateReviewRequest>,
) -> Response {
    match state.broker.create_review(body.into()).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
