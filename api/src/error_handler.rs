use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use review_engine::BrokerError;
use review_store::StoreError;
use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open review store: {0}")]
    Store(#[from] StoreError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Verb-level failure mapped from the engine with its stable wire code.
    #[error("{message}")]
    Broker {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only
            AppError::Config(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Broker { status, .. } => *status,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Store(_) => "db_error",
            AppError::Bind(_) => "bind_error",
            AppError::Server(_) => "server_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::Broker { code, .. } => code,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        ApiResponse::<()>::error(self.error_code(), message).into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert common Axum rejections to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Maps engine errors onto HTTP statuses while keeping the engine's wire
/// code verbatim. The split: unknown id → 404, malformed input → 400,
/// validation failures → 422, state conflicts → 409, infrastructure → 500.
impl From<BrokerError> for AppError {
    fn from(err: BrokerError) -> Self {
        let status = match &err {
            BrokerError::NotFound => StatusCode::NOT_FOUND,
            BrokerError::BadRequest(_) => StatusCode::BAD_REQUEST,

            BrokerError::DiffValidationFailed(_)
            | BrokerError::CounterPatchValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,

            BrokerError::InvalidTransition(_)
            | BrokerError::InvalidState(_)
            | BrokerError::DiffConflict(_)
            | BrokerError::StaleCounterPatch(_)
            | BrokerError::CounterPatchNotAllowed
            | BrokerError::NoPendingCounterPatch
            | BrokerError::TurnViolation(_)
            | BrokerError::StaleClaimGeneration { .. } => StatusCode::CONFLICT,

            BrokerError::ToolFailure(_) | BrokerError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::Broker {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}
