use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

/// Standard response envelope.
///
/// Format:
/// ```json
/// {
///   "isSuccess": true,
///   "code": "COMMON200",
///   "message": "OK",
///   "result": { ... }
/// }
/// ```
/// Webhook endpoints do not use this envelope; their bodies are part of the
/// scheduler/extension contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse<T: Serialize> {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Option<T>,
}

impl<T: Serialize> BaseResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            is_success: true,
            code: "COMMON200".to_string(),
            message: "OK".to_string(),
            result: Some(result),
        }
    }
}

/// Error response body.
///
/// `nextRefill` is only present on insufficient-credit errors so clients can
/// show a retry time.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Option<()>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_refill: Option<NaiveDateTime>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            code: code.into(),
            message: message.into(),
            result: None,
            next_refill: None,
        }
    }
}
