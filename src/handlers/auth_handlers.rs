use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::dto::{ApiResponse, ChangePasswordDto, LoginDto, RedeemCodeDto, RegisterDto};
use crate::errors::ApiError;
use crate::models::User;
use crate::repo::{self, RedeemError};
use crate::AppState;

use super::load_user;

/// Payload returned by register and login: the session token plus the
/// account (the password hash never serializes).
#[derive(Serialize, Debug)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let well_formed = email.contains('@') && email.contains('.') && !email.contains(char::is_whitespace);
    if !well_formed {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// Handler for creating an account
///
/// This function handles POST requests to `/api/auth/register`.
///
/// ### Returns
///
/// A fresh session token and the created account.
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterDto>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    info!("Registering new account");

    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }

    let existing = repo::get_user_by_email(&state.pool, &payload.email)
        .map_err(ApiError::Database)?;
    if existing.is_some() {
        return Err(ApiError::Validation(
            "An account with this email already exists".to_string(),
        ));
    }

    let hash = hash_password(&payload.password)?;
    let user = repo::create_user(
        &state.pool,
        User::new(payload.email, hash, payload.name.trim().to_string()),
    )
    .map_err(ApiError::Database)?;

    let token = state.auth.mint(&user.get_id())?;
    info!("Registered user {}", user.get_id());

    Ok(Json(ApiResponse::ok("Account created", AuthPayload { token, user })))
}

/// Handler for logging in
///
/// This function handles POST requests to `/api/auth/login`. Unknown
/// email and wrong password produce the same 401.
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginDto>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    let user = repo::get_user_by_email(&state.pool, &payload.email)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.get_password_hash())? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.auth.mint(&user.get_id())?;
    info!("User {} logged in", user.get_id());

    Ok(Json(ApiResponse::ok("Logged in", AuthPayload { token, user })))
}

/// Handler for validating the bearer token
///
/// This function handles GET requests to `/api/auth/verify` and returns
/// the account behind the token.
#[instrument(skip(state))]
pub async fn verify_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = load_user(&state, &auth.user_id)?;
    Ok(Json(ApiResponse::ok("Token is valid", user)))
}

/// Handler for changing the account password
///
/// This function handles PUT requests to `/api/auth/change-password`.
#[instrument(skip(state, payload))]
pub async fn change_password_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordDto>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user = load_user(&state, &auth.user_id)?;

    if !verify_password(&payload.current_password, &user.get_password_hash())? {
        return Err(ApiError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }
    validate_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    repo::update_password(&state.pool, &user.get_id(), &hash).map_err(ApiError::Database)?;

    Ok(Json(ApiResponse::message("Password updated")))
}

/// Handler for deleting the account and everything it owns
///
/// This function handles DELETE requests to `/api/auth/delete-account`.
/// Upload files are removed first, best effort: a missing file is
/// logged and skipped, it never aborts the deletion. The database rows
/// then go in one transaction.
#[instrument(skip(state))]
pub async fn delete_account_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user = load_user(&state, &auth.user_id)?;

    let courses = repo::list_courses(&state.pool, &user.get_id(), i64::MAX, 0)
        .map_err(ApiError::Database)?;
    for course in &courses {
        if let Some(stored) = course.get_file_path() {
            if let Err(e) = state.storage.remove(&stored) {
                warn!("Failed to remove file {} of course {}: {}", stored, course.get_id(), e);
            }
        }
    }

    repo::delete_user_cascade(&state.pool, &user.get_id()).map_err(ApiError::Database)?;
    info!("Deleted account {}", user.get_id());

    Ok(Json(ApiResponse::message("Account deleted")))
}

/// Handler for redeeming an AI activation code
///
/// This function handles POST requests to `/api/auth/redeem-code`.
#[instrument(skip(state, payload))]
pub async fn redeem_code_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RedeemCodeDto>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = load_user(&state, &auth.user_id)?;

    let code = payload.code.trim();
    if code.is_empty() {
        return Err(ApiError::Validation("Code is required".to_string()));
    }

    repo::redeem_code(&state.pool, code, &user.get_id()).map_err(|e| match e {
        RedeemError::Db(inner) => ApiError::Database(inner),
        refused => ApiError::Validation(refused.to_string()),
    })?;

    let user = load_user(&state, &auth.user_id)?;
    Ok(Json(ApiResponse::ok("AI access activated", user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::extract::State;

    fn register_dto(email: &str) -> RegisterDto {
        RegisterDto {
            email: email.to_string(),
            password: "motdepasse".to_string(),
            name: "Étudiant".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let state = test_state();

        let response = register_handler(State(state.clone()), Json(register_dto("a@ex.fr")))
            .await
            .unwrap();
        assert!(response.0.success);
        let registered = response.0.data.unwrap();
        assert!(!registered.token.is_empty());

        let response = login_handler(
            State(state),
            Json(LoginDto {
                email: "a@ex.fr".to_string(),
                password: "motdepasse".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.data.unwrap().user.get_id(), registered.user.get_id());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let state = test_state();
        register_handler(State(state.clone()), Json(register_dto("dup@ex.fr")))
            .await
            .unwrap();

        let result = register_handler(State(state), Json(register_dto("dup@ex.fr"))).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_uniform_401() {
        let state = test_state();
        register_handler(State(state.clone()), Json(register_dto("b@ex.fr")))
            .await
            .unwrap();

        let result = login_handler(
            State(state.clone()),
            Json(LoginDto {
                email: "b@ex.fr".to_string(),
                password: "wrong-password".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));

        let result = login_handler(
            State(state),
            Json(LoginDto {
                email: "nobody@ex.fr".to_string(),
                password: "motdepasse".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let state = test_state();

        let mut dto = register_dto("bad-email");
        let result = register_handler(State(state.clone()), Json(dto)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));

        dto = register_dto("ok@ex.fr");
        dto.password = "short".to_string();
        let result = register_handler(State(state), Json(dto)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
