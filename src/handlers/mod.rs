/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler extracts the authenticated user, validates the input,
/// calls the repository (and, for the AI features, the model gateway),
/// and wraps the result in the `{success, message, data?}` envelope.

mod auth_handlers;
mod course_handlers;
mod flashcard_handlers;
mod onboarding_handlers;
mod quiz_handlers;
mod summary_handlers;

// Re-export all handlers
pub use auth_handlers::*;
pub use course_handlers::*;
pub use flashcard_handlers::*;
pub use onboarding_handlers::*;
pub use quiz_handlers::*;
pub use summary_handlers::*;

use crate::errors::ApiError;
use crate::models::{Course, User};
use crate::{repo, textprep, AppState};

/// Loads the authenticated user's row. A valid token whose account has
/// since been deleted collapses to the uniform 401.
pub(crate) fn load_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    repo::get_user(&state.pool, user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::Unauthorized)
}

/// Loads the user and checks the AI-access flag that activation codes
/// unlock; the gated endpoints call this before touching the gateway.
pub(crate) fn require_ai_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    let user = load_user(state, user_id)?;
    if !user.has_ai_access() {
        return Err(ApiError::AiAccessRequired);
    }
    Ok(user)
}

/// Resolves the study text of a course: the edited version wins, then
/// inline text, then extraction from the stored file.
pub(crate) fn resolve_course_content(state: &AppState, course: &Course) -> Result<String, ApiError> {
    if let Some(text) = course.get_edited_text() {
        return Ok(text);
    }
    if let Some(text) = course.get_text_content() {
        return Ok(text);
    }
    match (course.get_file_path(), course.get_original_name()) {
        (Some(stored), Some(original)) => {
            Ok(textprep::extract_text(&state.storage.path_of(&stored), &original)?)
        }
        _ => Err(ApiError::Validation(
            "This course has no readable content".to_string(),
        )),
    }
}

/// Cleans content and returns the part that feeds the model.
///
/// TODO: aggregate generation across all chunks. Only the first chunk
/// is sent today, so anything past the chunk budget is silently ignored
/// by the generation features.
pub(crate) fn generation_input(content: &str) -> Result<String, ApiError> {
    let cleaned = textprep::clean_text(content);
    textprep::chunk_text(&cleaned, textprep::MAX_CHUNK_CHARS)
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Validation("Content is empty".to_string()))
}
