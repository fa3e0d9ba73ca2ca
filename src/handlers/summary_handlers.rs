use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::{info, instrument};

use crate::auth::AuthUser;
use crate::dto::{ApiResponse, AskDto, CreateSummaryDto, PaginationQuery, UpdateContentDto};
use crate::errors::ApiError;
use crate::models::Summary;
use crate::{repo, AppState};

use super::{generation_input, require_ai_user, resolve_course_content};

use super::course_handlers::ContentPayload;

/// Handler for creating a summary
///
/// This function handles POST requests to `/api/summaries/create`. The
/// source is either a stored course (`course_id`) or raw `text`; the
/// model writes the summary. The course title is copied, not linked:
/// the summary keeps it even if the course is deleted later.
#[instrument(skip(state, payload))]
pub async fn create_summary_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateSummaryDto>,
) -> Result<Json<ApiResponse<Summary>>, ApiError> {
    let user = require_ai_user(&state, &auth.user_id)?;

    let (content, course_id, source_title) = match (&payload.course_id, &payload.text) {
        (Some(course_id), _) => {
            let course = repo::get_course(&state.pool, course_id, &user.get_id())
                .map_err(ApiError::Database)?
                .ok_or(ApiError::NotFound)?;
            (
                resolve_course_content(&state, &course)?,
                Some(course.get_id()),
                Some(course.get_title()),
            )
        }
        (None, Some(text)) => (text.clone(), None, None),
        (None, None) => {
            return Err(ApiError::Validation(
                "Either course_id or text is required".to_string(),
            ))
        }
    };

    let input = generation_input(&content)?;
    let summary_text = state.llm.summarize(&input).await?;

    let title = payload.title.unwrap_or_else(|| match &source_title {
        Some(course_title) => format!("Résumé – {course_title}"),
        None => "Résumé".to_string(),
    });

    let summary = repo::create_summary(
        &state.pool,
        Summary::new(user.get_id(), course_id, title, summary_text, source_title),
    )
    .map_err(ApiError::Database)?;

    info!("Created summary {}", summary.get_id());
    Ok(Json(ApiResponse::ok("Summary created", summary)))
}

/// Handler for listing summaries
///
/// This function handles GET requests to `/api/summaries`.
#[instrument(skip(state, query))]
pub async fn list_summaries_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<Summary>>>, ApiError> {
    let (limit, offset) = query.limit_offset();
    let summaries = repo::list_summaries(&state.pool, &auth.user_id, limit, offset)
        .map_err(ApiError::Database)?;
    Ok(Json(ApiResponse::ok("Summaries", summaries)))
}

/// Handler for retrieving one summary
///
/// This function handles GET requests to `/api/summaries/{id}`.
#[instrument(skip(state), fields(summary_id = %summary_id))]
pub async fn get_summary_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(summary_id): Path<String>,
) -> Result<Json<ApiResponse<Summary>>, ApiError> {
    let summary = repo::get_summary(&state.pool, &summary_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok("Summary", summary)))
}

/// Handler for replacing a summary's content
///
/// This function handles PUT requests to `/api/summaries/{id}/content`.
#[instrument(skip(state, payload), fields(summary_id = %summary_id))]
pub async fn update_summary_content_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(summary_id): Path<String>,
    Json(payload): Json<UpdateContentDto>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let updated =
        repo::update_summary_content(&state.pool, &summary_id, &auth.user_id, &payload.content)
            .map_err(ApiError::Database)?;
    if updated == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(ApiResponse::message("Summary updated")))
}

/// Handler for reformatting a summary with the model
///
/// This function handles POST requests to `/api/summaries/{id}/reformat`.
#[instrument(skip(state), fields(summary_id = %summary_id))]
pub async fn reformat_summary_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(summary_id): Path<String>,
) -> Result<Json<ApiResponse<ContentPayload>>, ApiError> {
    require_ai_user(&state, &auth.user_id)?;

    let summary = repo::get_summary(&state.pool, &summary_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let reformatted = state.llm.reformat(&summary.get_content()).await?;
    repo::update_summary_content(&state.pool, &summary_id, &auth.user_id, &reformatted)
        .map_err(ApiError::Database)?;

    Ok(Json(ApiResponse::ok(
        "Summary reformatted",
        ContentPayload { content: reformatted },
    )))
}

/// Handler for free-form questions about a summary
///
/// This function handles POST requests to `/api/summaries/{id}/ask`.
#[instrument(skip(state, payload), fields(summary_id = %summary_id))]
pub async fn ask_summary_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(summary_id): Path<String>,
    Json(payload): Json<AskDto>,
) -> Result<Json<ApiResponse<ContentPayload>>, ApiError> {
    require_ai_user(&state, &auth.user_id)?;

    if payload.question.trim().is_empty() {
        return Err(ApiError::Validation("Question is required".to_string()));
    }

    let summary = repo::get_summary(&state.pool, &summary_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let answer = state.llm.ask(&summary.get_content(), &payload.question).await?;
    Ok(Json(ApiResponse::ok("Answer", ContentPayload { content: answer })))
}

/// Handler for deleting a summary
///
/// This function handles DELETE requests to `/api/summaries/{id}`.
#[instrument(skip(state), fields(summary_id = %summary_id))]
pub async fn delete_summary_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(summary_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = repo::delete_summary(&state.pool, &summary_id, &auth.user_id)
        .map_err(ApiError::Database)?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(ApiResponse::message("Summary deleted")))
}
