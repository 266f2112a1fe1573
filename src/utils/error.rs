use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDateTime;
use tracing::error;

use super::response::ErrorResponse;

/// Application-wide error type.
///
/// Business-rule failures (affordability, ownership) carry their own
/// variants and status codes so callers can branch on them; infrastructure
/// failures collapse into `InternalError` and surface a generic message.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    InternalError(String),
    ValidationError(String),
    JsonParseFailed(String),

    /// No ACTIVE/TRIALING subscription row for the caller.
    NoActiveSubscription,
    /// The usage type has no entry in the cost table and no preset was given.
    UnknownUsageType(String),
    /// Balance cannot cover the action; `next_refill` is the next rollover.
    InsufficientCredits { next_refill: Option<NaiveDateTime> },
    /// The per-type daily cap from the cost table is exhausted.
    DailyLimitReached(String),

    /// The LLM provider rejected our credentials.
    LlmAuthError,
    /// The LLM provider rate-limited us.
    LlmRateLimited,
    /// Transient LLM failure (timeout, connect error, 5xx).
    LlmTemporaryError,
    LlmError(String),

    /// External scheduler API failure.
    SchedulerError(String),
}

impl AppError {
    /// User-safe message table. Internal details never leak here; they are
    /// logged instead.
    pub fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::InternalError(_) => "Something went wrong. Please try again.".to_string(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::JsonParseFailed(msg) => format!("Malformed request body: {}", msg),
            AppError::NoActiveSubscription => {
                "An active subscription is required for this action.".to_string()
            }
            AppError::UnknownUsageType(usage_type) => {
                format!("Unknown AI usage type: {}", usage_type)
            }
            AppError::InsufficientCredits { .. } => {
                "You are out of credits for this billing period.".to_string()
            }
            AppError::DailyLimitReached(usage_type) => {
                format!("Daily limit reached for {}. Try again tomorrow.", usage_type)
            }
            AppError::LlmAuthError => {
                "The AI service is misconfigured. Please contact support.".to_string()
            }
            AppError::LlmRateLimited => {
                "The AI service is busy right now. Please try again in a moment.".to_string()
            }
            AppError::LlmTemporaryError => {
                "The AI service is temporarily unavailable. Please try again.".to_string()
            }
            AppError::LlmError(_) => {
                "The AI service could not complete your request.".to_string()
            }
            AppError::SchedulerError(_) => {
                "Scheduling is temporarily unavailable. Please try again.".to_string()
            }
        }
    }

    pub fn error_code(&self) -> String {
        match self {
            AppError::BadRequest(_) => "COMMON400",
            AppError::NotFound(_) => "COMMON404",
            AppError::Unauthorized(_) => "COMMON401",
            AppError::Forbidden(_) => "COMMON403",
            AppError::Conflict(_) => "COMMON409",
            AppError::InternalError(_) => "COMMON500",
            AppError::ValidationError(_) => "COMMON400",
            AppError::JsonParseFailed(_) => "COMMON400",
            AppError::NoActiveSubscription => "CREDIT403",
            AppError::UnknownUsageType(_) => "CREDIT404",
            AppError::InsufficientCredits { .. } => "CREDIT402",
            AppError::DailyLimitReached(_) => "CREDIT429",
            AppError::LlmAuthError => "AI500",
            AppError::LlmRateLimited => "AI429",
            AppError::LlmTemporaryError => "AI503",
            AppError::LlmError(_) => "AI502",
            AppError::SchedulerError(_) => "SCHED502",
        }
        .to_string()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::JsonParseFailed(_) => StatusCode::BAD_REQUEST,
            AppError::NoActiveSubscription => StatusCode::FORBIDDEN,
            AppError::UnknownUsageType(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::DailyLimitReached(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::LlmAuthError => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::LlmRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::LlmTemporaryError => StatusCode::SERVICE_UNAVAILABLE,
            AppError::LlmError(_) => StatusCode::BAD_GATEWAY,
            AppError::SchedulerError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.message();

        match &self {
            AppError::InternalError(detail) => {
                error!(detail = %detail, "Internal Server Error");
            }
            AppError::LlmError(detail) | AppError::SchedulerError(detail) => {
                error!(code = %error_code, detail = %detail, "Upstream failure");
            }
            _ => {
                error!("Error [{}]: {}", error_code, message);
            }
        }

        let mut error_response = ErrorResponse::new(error_code, message);
        if let AppError::InsufficientCredits { next_refill } = &self {
            error_response.next_refill = *next_refill;
        }

        (status, Json(error_response)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::JsonParseFailed(rejection.to_string())
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        AppError::InternalError(msg.into())
    }

    pub fn validation_error(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }
}
