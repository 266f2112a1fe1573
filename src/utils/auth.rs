use axum::{
    async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts,
};

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::jwt::{decode_access_token, Claims};

/// Extractor carrying the authenticated caller's identity.
///
/// Every core operation receives the caller's user id through this value
/// rather than an ambient session lookup.
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// User id from the JWT subject.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.0
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid user id in token.".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authentication required.".to_string()))?;

        let auth_header_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Malformed Authorization header.".to_string()))?;

        let token = auth_header_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Bearer token required.".to_string()))?;

        let claims = decode_access_token(token, &state.config.jwt_secret)?;

        Ok(AuthUser(claims))
    }
}
