use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::AppState;

/// Fixed session lifetime. There is no refresh mechanism and no
/// revocation list: a token stays valid until natural expiry.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// JWT payload: the user id and the expiry timestamp.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// The signing and verification keys derived from the server secret.
///
/// Lives in `AppState` so tests can run with their own secret instead
/// of a process-wide static.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mints a signed token embedding the user id, expiring in
    /// [`TOKEN_TTL_DAYS`].
    pub fn mint(&self, user_id: &str) -> Result<String, ApiError> {
        let exp = Utc::now() + Duration::days(TOKEN_TTL_DAYS);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verifies signature and expiry. Any failure collapses to the
    /// uniform unauthorized error; the client is never told which check
    /// failed.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthorized)
    }
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// Checks a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, hash)
        .map_err(|e| ApiError::Internal(format!("Failed to verify password: {e}")))
}

/// The authenticated caller, extracted from the bearer token.
///
/// Adding this extractor to a handler's arguments is what makes the
/// route protected: extraction fails with a uniform 401 when the header
/// is missing, malformed, expired or signed with another secret.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let claims = state.auth.verify(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}
