use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use review_engine::{Verdict, VerdictInput};
use tracing::instrument;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::AppError;
use crate::routes::review::submit_verdict_request::SubmitVerdictRequest;

/// `submit_verdict`: approve, request changes, or comment (the only kind
/// that leaves the review where it is). May carry a counter-patch.
#[instrument(name = "submit_verdict_route", skip(state, body), fields(review_id = %body.review_id))]
pub async fn submit_verdict_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitVerdictRequest>,
) -> Response {
    let Some(verdict) = Verdict::parse(&body.verdict) else {
        return AppError::BadRequest(format!("unknown verdict: {}", body.verdict)).into_response();
    };

    let input = VerdictInput {
        review_id: body.review_id,
        verdict,
        notes: body.notes,
        counter_patch: body.counter_patch,
        claim_generation: body.claim_generation,
    };
    match state.broker.submit_verdict(input).await {
        Ok(out) => ApiResponse::ok(out),
        Err(err) => AppError::from(err).into_response(),
    }
}
