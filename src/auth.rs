use crate::{errors::ServiceError, AppState};
use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for client tokens. Token issuance lives with the identity
/// provider; this service only verifies.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Client id
    pub sub: String,
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Extractor yielding the verified client id from a Bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedClient(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedClient {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::AuthError("Missing authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::AuthError("Expected a Bearer token".to_string()))?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config().jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ServiceError::AuthError(format!("Invalid token: {}", e)))?;

        let client_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServiceError::AuthError("Invalid subject claim".to_string()))?;

        Ok(AuthenticatedClient(client_id))
    }
}

/// Signs a short-lived token for `client_id`. Used by integration tests and
/// operational tooling; the API itself never issues tokens.
pub fn issue_token(
    client_id: Uuid,
    email: Option<String>,
    secret: &str,
    ttl: Duration,
) -> Result<String, ServiceError> {
    let now = Utc::now();
    let claims = Claims {
        sub: client_id.to_string(),
        email,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::AuthError(format!("Token signing failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_back() {
        let client_id = Uuid::new_v4();
        let token = issue_token(
            client_id,
            Some("client@example.com".to_string()),
            "test-secret-which-is-long-enough-123",
            Duration::hours(1),
        )
        .unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret-which-is-long-enough-123"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, client_id.to_string());
        assert_eq!(data.claims.email.as_deref(), Some("client@example.com"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(
            Uuid::new_v4(),
            None,
            "test-secret-which-is-long-enough-123",
            Duration::hours(-2),
        )
        .unwrap();

        let err = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret-which-is-long-enough-123"),
            &Validation::default(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(
            Uuid::new_v4(),
            None,
            "test-secret-which-is-long-enough-123",
            Duration::hours(1),
        )
        .unwrap();

        let err = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"a-different-secret-entirely-456789"),
            &Validation::default(),
        );
        assert!(err.is_err());
    }
}
