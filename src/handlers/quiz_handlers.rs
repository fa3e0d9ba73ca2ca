use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::auth::AuthUser;
use crate::dto::{
    ApiResponse, GenerateQuizDto, GenerateQuizFromTextDto, ImportQuizDto, PaginationQuery,
    SubmitAttemptDto,
};
use crate::errors::ApiError;
use crate::llm::QuizOptions;
use crate::models::{Quiz, QuizAttempt};
use crate::scoring::{grade_answers, QuestionOutcome};
use crate::textprep;
use crate::{repo, AppState};

use super::{generation_input, require_ai_user, resolve_course_content};

/// Bounds for the requested question count.
const MAX_QUESTIONS: usize = 50;

#[derive(Serialize, Debug)]
pub struct SubmitPayload {
    pub attempt_id: String,
    pub score: i32,
    pub percentage: f64,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub total_questions: usize,
    pub best_score: Option<i32>,
    pub results: Vec<QuestionOutcome>,
}

fn clamp_questions(requested: usize) -> usize {
    requested.clamp(1, MAX_QUESTIONS)
}

/// Handler for generating a quiz from a stored course
///
/// This function handles POST requests to
/// `/api/qcm/generate-from-course/{id}`. All body fields are optional;
/// an empty object means ten questions at the default difficulty.
#[instrument(skip(state, options), fields(course_id = %course_id))]
pub async fn generate_quiz_from_course_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<String>,
    Json(options): Json<GenerateQuizDto>,
) -> Result<Json<ApiResponse<Quiz>>, ApiError> {
    let user = require_ai_user(&state, &auth.user_id)?;

    let course = repo::get_course(&state.pool, &course_id, &user.get_id())
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    let content = generation_input(&resolve_course_content(&state, &course)?)?;

    let questions = state
        .llm
        .generate_quiz(
            &content,
            &QuizOptions {
                num_questions: clamp_questions(options.num_questions),
                difficulty: options.difficulty.clone(),
            },
        )
        .await?;

    let quiz = repo::create_quiz(
        &state.pool,
        Quiz::new(
            user.get_id(),
            Some(course.get_id()),
            format!("QCM – {}", course.get_title()),
            options.difficulty.unwrap_or_else(|| "moyen".to_string()),
            &questions,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?,
    )
    .map_err(ApiError::Database)?;

    info!("Generated quiz {} from course {}", quiz.get_id(), course_id);
    Ok(Json(ApiResponse::ok("Quiz generated", quiz)))
}

/// Handler for generating a quiz from pasted text
///
/// This function handles POST requests to `/api/qcm/generate-from-text`.
#[instrument(skip(state, payload))]
pub async fn generate_quiz_from_text_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<GenerateQuizFromTextDto>,
) -> Result<Json<ApiResponse<Quiz>>, ApiError> {
    let user = require_ai_user(&state, &auth.user_id)?;

    let content = generation_input(&payload.text)?;
    let questions = state
        .llm
        .generate_quiz(
            &content,
            &QuizOptions {
                num_questions: clamp_questions(payload.num_questions),
                difficulty: payload.difficulty.clone(),
            },
        )
        .await?;

    let quiz = repo::create_quiz(
        &state.pool,
        Quiz::new(
            user.get_id(),
            None,
            payload.title.unwrap_or_else(|| "QCM".to_string()),
            payload.difficulty.unwrap_or_else(|| "moyen".to_string()),
            &questions,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?,
    )
    .map_err(ApiError::Database)?;

    Ok(Json(ApiResponse::ok("Quiz generated", quiz)))
}

/// Handler for importing an existing quiz from pasted text
///
/// This function handles POST requests to `/api/qcm/import-from-text`.
/// The model structures the text without inventing questions.
#[instrument(skip(state, payload))]
pub async fn import_quiz_from_text_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ImportQuizDto>,
) -> Result<Json<ApiResponse<Quiz>>, ApiError> {
    let user = require_ai_user(&state, &auth.user_id)?;

    let content = generation_input(&payload.text)?;
    let questions = state.llm.parse_quiz(&content).await?;

    let quiz = repo::create_quiz(
        &state.pool,
        Quiz::new(
            user.get_id(),
            None,
            payload.title.unwrap_or_else(|| "QCM importé".to_string()),
            "moyen".to_string(),
            &questions,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?,
    )
    .map_err(ApiError::Database)?;

    Ok(Json(ApiResponse::ok("Quiz imported", quiz)))
}

/// Handler for importing a quiz from an uploaded document
///
/// This function handles POST requests to `/api/qcm/import-from-file`.
/// The file is held in the upload store only long enough to extract its
/// text.
#[instrument(skip(state, multipart))]
pub async fn import_quiz_from_file_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Quiz>>, ApiError> {
    let user = require_ai_user(&state, &auth.user_id)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if let Some(name) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?;
            file = Some((name, bytes.to_vec()));
        } else {
            let _ = field.bytes().await;
        }
    }

    let (name, bytes) =
        file.ok_or_else(|| ApiError::Validation("A file part is required".to_string()))?;

    let stored = state
        .storage
        .store(&name, &bytes)
        .map_err(|e| ApiError::Internal(format!("Failed to store upload: {e}")))?;
    let extracted = textprep::extract_text(&state.storage.path_of(&stored), &name);
    if let Err(e) = state.storage.remove(&stored) {
        warn!("Failed to remove scratch file {}: {}", stored, e);
    }
    let text = extracted?;

    let content = generation_input(&text)?;
    let questions = state.llm.parse_quiz(&content).await?;

    let title = name.rsplit_once('.').map(|(stem, _)| stem.to_string()).unwrap_or(name);
    let quiz = repo::create_quiz(
        &state.pool,
        Quiz::new(user.get_id(), None, title, "moyen".to_string(), &questions)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    )
    .map_err(ApiError::Database)?;

    Ok(Json(ApiResponse::ok("Quiz imported", quiz)))
}

/// Handler for listing quizzes
///
/// This function handles GET requests to `/api/qcm`.
#[instrument(skip(state, query))]
pub async fn list_quizzes_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<Quiz>>>, ApiError> {
    let (limit, offset) = query.limit_offset();
    let quizzes =
        repo::list_quizzes(&state.pool, &auth.user_id, limit, offset).map_err(ApiError::Database)?;
    Ok(Json(ApiResponse::ok("Quizzes", quizzes)))
}

/// Handler for retrieving one quiz
///
/// This function handles GET requests to `/api/qcm/{id}`.
#[instrument(skip(state), fields(quiz_id = %quiz_id))]
pub async fn get_quiz_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quiz_id): Path<String>,
) -> Result<Json<ApiResponse<Quiz>>, ApiError> {
    let quiz = repo::get_quiz(&state.pool, &quiz_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok("Quiz", quiz)))
}

/// Handler for submitting answers to a quiz
///
/// This function handles POST requests to `/api/qcm/{id}/submit`.
/// Answers are compared positionally; missing entries count as wrong.
/// The attempt snapshot and the best-score update land in one
/// transaction, so the stored best score never decreases.
#[instrument(skip(state, payload), fields(quiz_id = %quiz_id))]
pub async fn submit_quiz_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quiz_id): Path<String>,
    Json(payload): Json<SubmitAttemptDto>,
) -> Result<Json<ApiResponse<SubmitPayload>>, ApiError> {
    let quiz = repo::get_quiz(&state.pool, &quiz_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let questions = quiz
        .get_questions()
        .map_err(|e| ApiError::Internal(format!("Stored questions are corrupt: {e}")))?;

    let graded = grade_answers(&questions, &payload.answers);
    let attempt = QuizAttempt::new(
        quiz.get_id(),
        auth.user_id.clone(),
        &graded,
        payload.time_spent_seconds,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    let attempt = repo::record_attempt(&state.pool, attempt).map_err(ApiError::Database)?;

    let refreshed = repo::get_quiz(&state.pool, &quiz_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    info!("Quiz {} submitted: {}%", quiz_id, attempt.get_score());
    Ok(Json(ApiResponse::ok(
        "Attempt recorded",
        SubmitPayload {
            attempt_id: attempt.get_id(),
            score: graded.score,
            percentage: graded.percentage,
            correct_count: graded.correct_count,
            incorrect_count: graded.incorrect_count,
            total_questions: questions.len(),
            best_score: refreshed.get_best_score(),
            results: graded.outcomes,
        },
    )))
}

/// Handler for listing a quiz's attempts
///
/// This function handles GET requests to `/api/qcm/{id}/attempts`.
#[instrument(skip(state), fields(quiz_id = %quiz_id))]
pub async fn list_attempts_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quiz_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<QuizAttempt>>>, ApiError> {
    repo::get_quiz(&state.pool, &quiz_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let attempts =
        repo::list_attempts(&state.pool, &quiz_id, &auth.user_id).map_err(ApiError::Database)?;
    Ok(Json(ApiResponse::ok("Attempts", attempts)))
}

/// Handler for retrieving one attempt
///
/// This function handles GET requests to
/// `/api/qcm/{id}/attempts/{attempt_id}`.
#[instrument(skip(state), fields(quiz_id = %quiz_id, attempt_id = %attempt_id))]
pub async fn get_attempt_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((quiz_id, attempt_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<QuizAttempt>>, ApiError> {
    let attempt = repo::get_attempt(&state.pool, &quiz_id, &attempt_id, &auth.user_id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok("Attempt", attempt)))
}

/// Handler for deleting a quiz and its attempts
///
/// This function handles DELETE requests to `/api/qcm/{id}`.
#[instrument(skip(state), fields(quiz_id = %quiz_id))]
pub async fn delete_quiz_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(quiz_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = repo::delete_quiz_cascade(&state.pool, &quiz_id, &auth.user_id)
        .map_err(ApiError::Database)?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(ApiResponse::message("Quiz deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        create_test_course, grant_ai_access, register_test_user, test_state, test_state_full,
    };
    use axum::extract::State;

    #[tokio::test]
    async fn test_generate_requires_ai_access() {
        let state = test_state();
        let auth = register_test_user(&state, "gen@ex.fr");
        let course = create_test_course(&state, &auth, "Le cycle de l'eau.");

        let result = generate_quiz_from_course_handler(
            State(state.clone()),
            auth.clone(),
            Path(course.get_id()),
            Json(GenerateQuizDto::default()),
        )
        .await;
        assert!(matches!(result, Err(ApiError::AiAccessRequired)));
    }

    #[tokio::test]
    async fn test_generate_submit_and_best_score_flow() {
        let state = test_state();
        let auth = register_test_user(&state, "flow@ex.fr");
        grant_ai_access(&state, &auth);
        let course = create_test_course(&state, &auth, "Le cycle de l'eau.");

        let quiz = generate_quiz_from_course_handler(
            State(state.clone()),
            auth.clone(),
            Path(course.get_id()),
            Json(GenerateQuizDto::default()),
        )
        .await
        .unwrap()
        .0
        .data
        .unwrap();

        // Mock questions: correct answers are A then C. Perfect run.
        let response = submit_quiz_handler(
            State(state.clone()),
            auth.clone(),
            Path(quiz.get_id()),
            Json(SubmitAttemptDto {
                answers: vec![Some("A".to_string()), Some("C".to_string())],
                time_spent_seconds: Some(42),
            }),
        )
        .await
        .unwrap()
        .0
        .data
        .unwrap();
        assert_eq!(response.score, 100);
        assert_eq!(response.best_score, Some(100));

        // A worse run must not lower the stored best.
        let response = submit_quiz_handler(
            State(state.clone()),
            auth.clone(),
            Path(quiz.get_id()),
            Json(SubmitAttemptDto {
                answers: vec![Some("B".to_string())],
                time_spent_seconds: None,
            }),
        )
        .await
        .unwrap()
        .0
        .data
        .unwrap();
        assert_eq!(response.score, 0);
        assert_eq!(response.best_score, Some(100));

        let attempts = list_attempts_handler(State(state), auth, Path(quiz.get_id()))
            .await
            .unwrap();
        assert_eq!(attempts.0.data.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_missing_answers_count_wrong() {
        let state = test_state();
        let auth = register_test_user(&state, "miss@ex.fr");
        grant_ai_access(&state, &auth);

        let quiz = generate_quiz_from_text_handler(
            State(state.clone()),
            auth.clone(),
            Json(GenerateQuizFromTextDto {
                text: "Photosynthèse et respiration.".to_string(),
                title: None,
                num_questions: 2,
                difficulty: None,
            }),
        )
        .await
        .unwrap()
        .0
        .data
        .unwrap();

        let response = submit_quiz_handler(
            State(state),
            auth,
            Path(quiz.get_id()),
            Json(SubmitAttemptDto {
                answers: vec![],
                time_spent_seconds: None,
            }),
        )
        .await
        .unwrap()
        .0
        .data
        .unwrap();

        assert_eq!(response.correct_count, 0);
        assert_eq!(response.incorrect_count, 2);
        assert!(response.results.iter().all(|r| r.user_answer.is_none()));
    }

    #[tokio::test]
    async fn test_generation_failure_is_surfaced() {
        let (state, mock) = test_state_full();
        let auth = register_test_user(&state, "fail@ex.fr");
        grant_ai_access(&state, &auth);
        mock.set_fail(true);

        let result = generate_quiz_from_text_handler(
            State(state),
            auth,
            Json(GenerateQuizFromTextDto {
                text: "Un contenu.".to_string(),
                title: None,
                num_questions: 5,
                difficulty: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Llm(_))));
    }
}
