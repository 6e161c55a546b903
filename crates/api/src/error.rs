//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{AppError, CommandOutcome, DomainError, ErrorCode, SaleError, ValidationError};

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders the same body shape as a failed command:
/// `{ "success": false, "errors": [...] }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The handler refused the command.
    #[error("command rejected")]
    Rejected(Vec<AppError>),

    /// The request failed validation before reaching a handler.
    #[error("request validation failed")]
    Invalid(Vec<ValidationError>),

    /// A path segment is not a valid identifier.
    #[error("Invalid {field}: {source}")]
    InvalidId {
        field: &'static str,
        #[source]
        source: uuid::Error,
    },

    /// The body id does not match the path id.
    #[error("Route id does not match body id")]
    IdMismatch,

    /// The body could not be parsed.
    #[error("{0}")]
    MalformedBody(String),

    /// Infrastructure failure.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Returns the HTTP status the error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected(errors) => rejected_status(errors),
            ApiError::Invalid(_)
            | ApiError::InvalidId { .. }
            | ApiError::IdMismatch
            | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_errors(self) -> Vec<AppError> {
        match self {
            ApiError::Rejected(errors) => errors,
            ApiError::Invalid(errors) => errors.iter().map(AppError::from).collect(),
            ApiError::InvalidId { field, source } => {
                vec![AppError::validation(field, format!("Invalid {field}: {source}"))]
            }
            ApiError::IdMismatch => {
                vec![AppError::validation("id", "Route id does not match body id")]
            }
            ApiError::MalformedBody(message) => vec![AppError::validation("body", message)],
            ApiError::Domain(_) => vec![AppError::internal("An unexpected error occurred")],
        }
    }
}

fn rejected_status(errors: &[AppError]) -> StatusCode {
    if errors.iter().any(|e| e.code == ErrorCode::NotFound) {
        StatusCode::NOT_FOUND
    } else if errors.iter().any(|e| e.code == ErrorCode::Validation) {
        StatusCode::BAD_REQUEST
    } else if errors.iter().any(is_conflict) {
        StatusCode::CONFLICT
    } else {
        StatusCode::BAD_REQUEST
    }
}

/// Business-rule failures caused by the sale's cancellation state.
fn is_conflict(error: &AppError) -> bool {
    error.code == ErrorCode::BusinessRule
        && (error.message == SaleError::AlreadyCancelled.to_string()
            || error.message == SaleError::SaleCancelled.to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Domain(err) = &self {
            tracing::error!(error = %err, "internal server error");
        }

        let body = CommandOutcome::<()>::fail(self.into_errors());
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

/// Turns a handler outcome into its data, or the errors it was refused with.
pub fn accept<T>(outcome: CommandOutcome<T>) -> Result<Option<T>, ApiError> {
    outcome.into_result().map_err(ApiError::Rejected)
}
