use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::error::AppError;

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (User ID)
    pub sub: String,
    /// Issued At
    pub iat: usize,
    /// Expiration
    pub exp: usize,
    /// Token Type (access)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Create an access token for the given user id.
pub fn encode_access_token(
    sub: String,
    secret: &str,
    expiration_seconds: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::seconds(expiration_seconds))
        .ok_or_else(|| AppError::InternalError("Token expiration overflow".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub,
        iat: now.timestamp() as usize,
        exp: expiration,
        token_type: Some("access".to_string()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token creation failed: {}", e)))
}

/// Validate and decode an access token.
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::default();

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token has expired.".into())
        }
        _ => AppError::Unauthorized("Invalid token.".into()),
    })?;

    if claims.token_type.as_deref() != Some("access") {
        return Err(AppError::Unauthorized("Invalid token type.".into()));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_and_decode() {
        let secret = "test_secret";
        let sub = "42".to_string();

        let token =
            encode_access_token(sub.clone(), secret, 3600).expect("Token generation failed");
        let claims = decode_access_token(&token, secret).expect("Token validation failed");

        assert_eq!(claims.sub, sub);
        assert_eq!(claims.token_type.as_deref(), Some("access"));
    }

    #[test]
    fn test_invalid_token() {
        let secret = "test_secret";
        let result = decode_access_token("invalid_token", secret);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let token = encode_access_token("42".to_string(), "secret_a", 3600).unwrap();
        let result = decode_access_token(&token, "secret_b");
        assert!(result.is_err());
    }
}
