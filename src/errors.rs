use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::llm::LlmError;
use crate::textprep::TextPrepError;

/// The error type every handler returns.
///
/// The client only ever sees an HTTP status plus a free-text message in
/// the `{success: false, message}` envelope; there is no error-code
/// enum. Token problems are deliberately indistinguishable (uniform
/// 401) and ownership mismatches surface as 404.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthorized,

    #[error("AI access required: redeem an activation code first")]
    AiAccessRequired,

    #[error("Resource not found")]
    NotFound,

    #[error("Generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<TextPrepError> for ApiError {
    fn from(err: TextPrepError) -> Self {
        match err {
            TextPrepError::UnsupportedType(ext) => ApiError::UnsupportedType(ext),
            TextPrepError::Unreadable(msg) => ApiError::Internal(format!("Cannot read file: {msg}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) | ApiError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::AiAccessRequired => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Llm(_) | ApiError::Internal(_) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("titre is required".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::AiAccessRequired.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(anyhow::anyhow!("pool exhausted"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_body_is_the_failure_envelope() {
        let response = ApiError::NotFound.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert!(json["message"].is_string());
        assert!(json.get("data").is_none());
    }
}
