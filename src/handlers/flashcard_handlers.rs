use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::{info, instrument};

use crate::auth::AuthUser;
use crate::dto::{
    ApiResponse, GenerateFlashcardsDto, GenerateFlashcardsFromTextDto, PaginationQuery,
};
use crate::errors::ApiError;
use crate::llm::FlashcardOptions;
use crate::models::FlashcardSet;
use crate::{repo, AppState};

use super::{generation_input, require_ai_user, resolve_course_content};

const MAX_CARDS: usize = 60;

/// Handler for generating flashcards from a stored course
///
/// This function handles POST requests to
/// `/api/flashcards/generate-from-course/{id}`. All body fields are
/// optional; an empty object means fifteen cards at the default
/// difficulty.
#[instrument(skip(state, options), fields(course_id = %course_id))]
pub async fn generate_flashcards_from_course_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
    Json(options): Json<GenerateFlashcardsDto>,
) -> Result<Json<ApiResponse<FlashcardSet>>, ApiError> {
    let user = require_ai_user(&state, &auth.user_id)?;

    let course = repo::get_course(&state.pool, &course_id, &user.get_id())
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    let content = generation_input(&resolve_course_content(&state, &course)?)?;

    let cards = state
        .llm
        .generate_flashcards(
            &content,
            &FlashcardOptions {
                num_cards: options.num_cards.clamp(1, MAX_CARDS),
                difficulty: options.difficulty,
            },
        )
        .await?;

    let set = repo::create_flashcard_set(
        &state.pool,
        FlashcardSet::new(
            user.get_id(),
            Some(course.get_id()),
            format!("Flashcards – {}", course.get_title()),
            &cards,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?,
    )
    .map_err(ApiError::Database)?;

    info!("Generated flashcard set {} from course {}", set.get_id(), course_id);
    Ok(Json(ApiResponse::ok("Flashcards generated", set)))
}

/// Handler for generating flashcards from pasted text
///
/// This function handles POST requests to
/// `/api/flashcards/generate-from-text`.
#[instrument(skip(state, payload))]
pub async fn generate_flashcards_from_text_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<GenerateFlashcardsFromTextDto>,
) -> Result<Json<ApiResponse<FlashcardSet>>, ApiError> {
    let user = require_ai_user(&state, &auth.user_id)?;

    let content = generation_input(&payload.text)?;
    let cards = state
        .llm
        .generate_flashcards(
            &content,
            &FlashcardOptions {
                num_cards: payload.num_cards.clamp(1, MAX_CARDS),
                difficulty: payload.difficulty,
            },
        )
        .await?;

    let set = repo::create_flashcard_set(
        &state.pool,
        FlashcardSet::new(
            user.get_id(),
            None,
            payload.title.unwrap_or_else(|| "Flashcards".to_string()),
            &cards,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?,
    )
    .map_err(ApiError::Database)?;

    Ok(Json(ApiResponse::ok("Flashcards generated", set)))
}

/// Handler for listing flashcard sets
///
/// This function handles GET requests to `/api/flashcards`.
#[instrument(skip(state, query))]
pub async fn list_flashcard_sets_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<FlashcardSet>>>, ApiError> {
    let (limit, offset) = query.limit_offset();
    let sets = repo::list_flashcard_sets(&state.pool, &auth.user_id, limit, offset)
        .map_err(ApiError::Database)?;
    Ok(Json(ApiResponse::ok("Flashcard sets", sets)))
}

/// Handler for retrieving one flashcard set
///
/// This function handles GET requests to `/api/flashcards/{id}`.
#[instrument(skip(state), fields(set_id = %set_id))]
pub async fn get_flashcard_set_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(set_id): Path<String>,
) -> Result<Json<ApiResponse<FlashcardSet>>, ApiError> {
    let set = repo::get_flashcard_set(&state.pool, &set_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok("Flashcard set", set)))
}

/// Handler for deleting a flashcard set
///
/// This function handles DELETE requests to `/api/flashcards/{id}`.
#[instrument(skip(state), fields(set_id = %set_id))]
pub async fn delete_flashcard_set_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(set_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = repo::delete_flashcard_set(&state.pool, &set_id, &auth.user_id)
        .map_err(ApiError::Database)?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(ApiResponse::message("Flashcard set deleted")))
}
