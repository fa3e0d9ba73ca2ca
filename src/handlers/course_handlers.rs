use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::auth::AuthUser;
use crate::dto::{ApiResponse, AskDto, PaginationQuery, SaveHighlightsDto, UpdateContentDto};
use crate::errors::ApiError;
use crate::models::{Course, CourseHighlight};
use crate::storage::{content_type_for, FileStore};
use crate::{repo, AppState};

use super::{load_user, require_ai_user, resolve_course_content};

/// Upper bound for OCR images, checked after the multipart read.
const MAX_OCR_IMAGE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Serialize, Debug)]
pub struct ContentPayload {
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct OcrPayload {
    pub text: String,
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Validation(format!("Malformed multipart body: {err}"))
}

/// Handler for uploading a course
///
/// This function handles POST requests to `/api/courses/upload`.
/// Multipart fields keep the client's French names: `titre`,
/// `description`, `annee_cible`, `matiere`, `type_document`, plus
/// either a `file` part or inline `text_content`.
#[instrument(skip(state, multipart))]
pub async fn upload_course_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Course>>, ApiError> {
    let user = load_user(&state, &auth.user_id)?;

    let mut title = None;
    let mut description = None;
    let mut target_year = None;
    let mut subject = None;
    let mut doc_type = None;
    let mut text_content = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or("") {
            "titre" => title = Some(field.text().await.map_err(multipart_error)?),
            "description" => description = Some(field.text().await.map_err(multipart_error)?),
            "annee_cible" => target_year = Some(field.text().await.map_err(multipart_error)?),
            "matiere" => subject = Some(field.text().await.map_err(multipart_error)?),
            "type_document" => doc_type = Some(field.text().await.map_err(multipart_error)?),
            "text_content" => text_content = Some(field.text().await.map_err(multipart_error)?),
            "file" => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::Validation("File part has no filename".to_string()))?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((name, bytes.to_vec()));
            }
            other => {
                debug!("Ignoring unknown multipart field {:?}", other);
                let _ = field.bytes().await;
            }
        }
    }

    let required = |value: Option<String>, name: &str| -> Result<String, ApiError> {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::Validation(format!("{name} is required")))
    };
    let title = required(title, "titre")?;
    let subject = required(subject, "matiere")?;
    let target_year = required(target_year, "annee_cible")?;
    let doc_type = required(doc_type, "type_document")?;

    if file.is_none() && text_content.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(ApiError::Validation(
            "Either a file or text_content is required".to_string(),
        ));
    }

    let (file_path, original_name) = match file {
        Some((name, bytes)) => {
            if !FileStore::extension_allowed(&name) {
                let ext = name.rsplit('.').next().unwrap_or("").to_string();
                return Err(ApiError::UnsupportedType(ext));
            }
            let stored = state
                .storage
                .store(&name, &bytes)
                .map_err(|e| ApiError::Internal(format!("Failed to store upload: {e}")))?;
            (Some(stored), Some(name))
        }
        None => (None, None),
    };

    let course = repo::create_course(
        &state.pool,
        Course::new(
            user.get_id(),
            title,
            description,
            subject,
            target_year,
            doc_type,
            file_path,
            original_name,
            text_content,
        ),
    )
    .map_err(ApiError::Database)?;

    info!("Uploaded course {}", course.get_id());
    Ok(Json(ApiResponse::ok("Course uploaded", course)))
}

/// Handler for OCR text extraction from an image
///
/// This function handles POST requests to `/api/courses/ocr`. The image
/// is forwarded to the vision model; the reply is plain text, not JSON.
#[instrument(skip(state, multipart))]
pub async fn ocr_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<OcrPayload>>, ApiError> {
    require_ai_user(&state, &auth.user_id)?;

    let mut image: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.file_name().is_some() || field.name() == Some("image") {
            let mime = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "image/jpeg".to_string());
            let bytes = field.bytes().await.map_err(multipart_error)?;
            image = Some((mime, bytes.to_vec()));
        } else {
            let _ = field.bytes().await;
        }
    }

    let (mime, bytes) =
        image.ok_or_else(|| ApiError::Validation("An image part is required".to_string()))?;
    if !mime.starts_with("image/") {
        return Err(ApiError::Validation(format!("Expected an image, got {mime}")));
    }
    if bytes.len() > MAX_OCR_IMAGE_BYTES {
        return Err(ApiError::Validation("Image exceeds the 20 MB limit".to_string()));
    }

    let text = state.llm.extract_image_text(&bytes, &mime).await?;
    Ok(Json(ApiResponse::ok("Text extracted", OcrPayload { text })))
}

/// Handler for listing courses
///
/// This function handles GET requests to `/api/courses`.
#[instrument(skip(state, query))]
pub async fn list_courses_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<Course>>>, ApiError> {
    let (limit, offset) = query.limit_offset();
    let courses =
        repo::list_courses(&state.pool, &auth.user_id, limit, offset).map_err(ApiError::Database)?;
    Ok(Json(ApiResponse::ok("Courses", courses)))
}

/// Handler for reading a course's study text
///
/// This function handles GET requests to `/api/courses/{id}/content`.
/// The edited version wins over inline text, which wins over extraction
/// from the stored file.
#[instrument(skip(state), fields(course_id = %course_id))]
pub async fn get_course_content_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<ApiResponse<ContentPayload>>, ApiError> {
    let course = repo::get_course(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let content = resolve_course_content(&state, &course)?;
    Ok(Json(ApiResponse::ok("Course content", ContentPayload { content })))
}

/// Handler for replacing a course's edited text
///
/// This function handles PUT requests to `/api/courses/{id}/content`.
#[instrument(skip(state, payload), fields(course_id = %course_id))]
pub async fn update_course_content_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
    Json(payload): Json<UpdateContentDto>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let updated = repo::update_edited_text(&state.pool, &course_id, &auth.user_id, &payload.content)
        .map_err(ApiError::Database)?;
    if updated == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(ApiResponse::message("Course content updated")))
}

/// Handler for streaming the original uploaded file
///
/// This function handles GET requests to `/api/courses/{id}/file`. The
/// MIME type is computed from the original filename's extension.
#[instrument(skip(state), fields(course_id = %course_id))]
pub async fn get_course_file_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Response, ApiError> {
    let course = repo::get_course(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let stored = course.get_file_path().ok_or(ApiError::NotFound)?;
    let bytes = state
        .storage
        .read(&stored)
        .map_err(|e| ApiError::Internal(format!("Cannot read file: {e}")))?;

    let name = course.get_original_name().unwrap_or(stored);
    Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes).into_response())
}

/// Handler for listing a course's highlights
///
/// This function handles GET requests to `/api/courses/{id}/highlights`.
#[instrument(skip(state), fields(course_id = %course_id))]
pub async fn list_highlights_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CourseHighlight>>>, ApiError> {
    repo::get_course(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let highlights = repo::list_highlights(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?;
    Ok(Json(ApiResponse::ok("Highlights", highlights)))
}

/// Handler for the bulk highlight save
///
/// This function handles POST requests to `/api/courses/{id}/highlights`.
/// The submitted set replaces the stored one wholesale.
#[instrument(skip(state, payload), fields(course_id = %course_id, count = payload.highlights.len()))]
pub async fn save_highlights_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
    Json(payload): Json<SaveHighlightsDto>,
) -> Result<Json<ApiResponse<Vec<CourseHighlight>>>, ApiError> {
    repo::get_course(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let rows = payload
        .highlights
        .into_iter()
        .map(|h| {
            CourseHighlight::new(
                course_id.clone(),
                auth.user_id.clone(),
                h.text,
                h.color,
                h.start_offset,
                h.end_offset,
                h.page,
            )
        })
        .collect();

    let saved = repo::replace_highlights(&state.pool, &course_id, &auth.user_id, rows)
        .map_err(ApiError::Database)?;
    Ok(Json(ApiResponse::ok("Highlights saved", saved)))
}

/// Handler for reformatting a course with the model
///
/// This function handles POST requests to `/api/courses/{id}/reformat`.
/// The rewritten text is stored as the course's edited version.
#[instrument(skip(state), fields(course_id = %course_id))]
pub async fn reformat_course_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<ApiResponse<ContentPayload>>, ApiError> {
    require_ai_user(&state, &auth.user_id)?;

    let course = repo::get_course(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let content = resolve_course_content(&state, &course)?;
    let reformatted = state.llm.reformat(&content).await?;

    repo::update_edited_text(&state.pool, &course_id, &auth.user_id, &reformatted)
        .map_err(ApiError::Database)?;

    info!("Reformatted course {}", course_id);
    Ok(Json(ApiResponse::ok(
        "Course reformatted",
        ContentPayload { content: reformatted },
    )))
}

/// Handler for free-form questions about a course
///
/// This function handles POST requests to `/api/courses/{id}/ask`.
#[instrument(skip(state, payload), fields(course_id = %course_id))]
pub async fn ask_course_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
    Json(payload): Json<AskDto>,
) -> Result<Json<ApiResponse<ContentPayload>>, ApiError> {
    require_ai_user(&state, &auth.user_id)?;

    if payload.question.trim().is_empty() {
        return Err(ApiError::Validation("Question is required".to_string()));
    }

    let course = repo::get_course(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let content = resolve_course_content(&state, &course)?;
    let answer = state.llm.ask(&content, &payload.question).await?;

    Ok(Json(ApiResponse::ok("Answer", ContentPayload { content: answer })))
}

/// Handler for deleting a course
///
/// This function handles DELETE requests to `/api/courses/{id}`. The
/// stored file goes first (best effort), then the course row and its
/// dependents in one transaction.
#[instrument(skip(state), fields(course_id = %course_id))]
pub async fn delete_course_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let course = repo::get_course(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    if let Some(stored) = course.get_file_path() {
        if let Err(e) = state.storage.remove(&stored) {
            warn!("Failed to remove file {} of course {}: {}", stored, course_id, e);
        }
    }

    repo::delete_course_cascade(&state.pool, &course_id, &auth.user_id)
        .map_err(ApiError::Database)?;
    Ok(Json(ApiResponse::message("Course deleted")))
}
