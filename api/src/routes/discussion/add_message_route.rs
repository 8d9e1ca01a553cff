use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppError;
use crate::routes::discussion::add_message_request::AddMessageRequest;

/// `add_message`: turn-alternating discussion entry; rejects two messages
/// in a row from the same role with `turn_violation`.
#[instrument(name = "add_message_route", skip(state, body), fields(review_id = %body.review_id))]
pub async fn add_message_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddMessageRequest>,
) -> Response {
    match state.broker.add_message(body.into()).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
