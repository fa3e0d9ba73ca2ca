use axum::extract::State;
use axum::Json;
use tracing::{info, instrument};

use crate::auth::AuthUser;
use crate::dto::{ApiResponse, ProfileDto};
use crate::errors::ApiError;
use crate::models::StudentProfile;
use crate::repo;
use crate::AppState;

use super::load_user;

/// The subjects proposed during onboarding and on course upload.
const MATIERES: &[&str] = &[
    "Mathématiques",
    "Physique-Chimie",
    "SVT",
    "Français",
    "Philosophie",
    "Histoire-Géographie",
    "Anglais",
    "Espagnol",
    "SES",
    "NSI",
];

/// Handler for creating the onboarding profile
///
/// This function handles POST requests to `/api/onboarding/profile`.
/// Creating the profile is what flips the account's onboarding flag.
#[instrument(skip(state, payload))]
pub async fn create_profile_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ProfileDto>,
) -> Result<Json<ApiResponse<StudentProfile>>, ApiError> {
    let user = load_user(&state, &auth.user_id)?;

    if repo::get_profile(&state.pool, &user.get_id())
        .map_err(ApiError::Database)?
        .is_some()
    {
        return Err(ApiError::Validation(
            "Profile already exists, update it instead".to_string(),
        ));
    }

    let profile = StudentProfile::new(
        user.get_id(),
        payload.study_year,
        payload.major,
        &payload.strengths,
        &payload.weaknesses,
        &payload.goals,
        payload.difficulty_preference,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    let profile = repo::create_profile(&state.pool, profile).map_err(ApiError::Database)?;
    repo::set_onboarding_done(&state.pool, &user.get_id()).map_err(ApiError::Database)?;

    info!("Onboarding completed for user {}", user.get_id());
    Ok(Json(ApiResponse::ok("Profile created", profile)))
}

/// Handler for reading the onboarding profile
///
/// This function handles GET requests to `/api/onboarding/profile`.
#[instrument(skip(state))]
pub async fn get_profile_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<StudentProfile>>, ApiError> {
    let profile = repo::get_profile(&state.pool, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok("Profile", profile)))
}

/// Handler for updating the onboarding profile
///
/// This function handles PUT requests to `/api/onboarding/profile`.
#[instrument(skip(state, payload))]
pub async fn update_profile_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ProfileDto>,
) -> Result<Json<ApiResponse<StudentProfile>>, ApiError> {
    let updated = repo::update_profile(
        &state.pool,
        &auth.user_id,
        &payload.study_year,
        &payload.major,
        &payload.strengths,
        &payload.weaknesses,
        &payload.goals,
        &payload.difficulty_preference,
    )
    .map_err(ApiError::Database)?;

    if updated == 0 {
        return Err(ApiError::NotFound);
    }

    let profile = repo::get_profile(&state.pool, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok("Profile updated", profile)))
}

/// Handler for the subject list
///
/// This function handles GET requests to `/api/onboarding/matieres`.
#[instrument]
pub async fn matieres_handler() -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::ok("Matières", MATIERES.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{register_test_user, test_state};
    use axum::extract::State;

    fn profile_dto() -> ProfileDto {
        ProfileDto {
            study_year: "Terminale".to_string(),
            major: "Générale".to_string(),
            strengths: vec!["Maths".to_string()],
            weaknesses: vec![],
            goals: vec!["Bac mention".to_string()],
            difficulty_preference: "moyen".to_string(),
        }
    }

    #[tokio::test]
    async fn test_onboarding_flow_marks_user() {
        let state = test_state();
        let auth = register_test_user(&state, "on@ex.fr");

        create_profile_handler(State(state.clone()), auth.clone(), Json(profile_dto()))
            .await
            .unwrap();

        let user = crate::repo::get_user(&state.pool, &auth.user_id).unwrap().unwrap();
        assert!(user.is_onboarding_done());

        let fetched = get_profile_handler(State(state), auth).await.unwrap();
        assert_eq!(fetched.0.data.unwrap().get_study_year(), "Terminale");
    }

    #[tokio::test]
    async fn test_double_create_is_rejected() {
        let state = test_state();
        let auth = register_test_user(&state, "twice@ex.fr");

        create_profile_handler(State(state.clone()), auth.clone(), Json(profile_dto()))
            .await
            .unwrap();
        let result =
            create_profile_handler(State(state), auth, Json(profile_dto())).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_without_profile_is_404() {
        let state = test_state();
        let auth = register_test_user(&state, "none@ex.fr");

        let result = update_profile_handler(State(state), auth, Json(profile_dto())).await;
        assert!(matches!(result, Err(ApiError::NotFound)));
    }
}
