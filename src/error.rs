use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Every failure a request can end in. None of these are retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Referenced id does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Authenticated but not entitled: wrong owner or insufficient tier.
    #[error("{0}")]
    Forbidden(String),

    #[error("not authenticated")]
    Unauthenticated,

    /// Free-tier daily limit reached.
    #[error("daily generation limit of {limit} reached")]
    QuotaExceeded { limit: u32 },

    #[error("invalid request: {0}")]
    Validation(String),

    /// The external content generator failed or timed out.
    #[error("failed to generate content: {0}")]
    GenerationFailed(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthenticated => "unauthenticated",
            AppError::QuotaExceeded { .. } => "quota_exceeded",
            AppError::Validation(_) => "validation_error",
            AppError::GenerationFailed(_) => "generation_failed",
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) | AppError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::GenerationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            kind: self.kind().to_string(),
            message: self.to_string(),
        })
    }
}
