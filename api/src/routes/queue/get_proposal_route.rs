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
pub struct GetProposalRequest {
    pub review_id: String,
}

/// `get_proposal`: everything, including diff, counter-patch and affected files.
#[instrument(name = "get_proposal_route", skip(state), fields(review_id = %body.review_id))]
pub async fn get_proposal_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GetProposalRequest>,
) -> Response {
    match state.broker.get_proposal(&body.review_id).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
