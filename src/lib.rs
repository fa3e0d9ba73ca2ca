/// Cortex: an education-assistant backend
///
/// This library provides the REST API behind the study dashboard and
/// mobile app: students upload course documents, then generate QCM
/// quizzes, flashcards and summaries from them through an external
/// model gateway, practice the quizzes, and track their scores.
///
/// ### Modules
///
/// - `auth`: password hashing, session tokens, the bearer extractor
/// - `config`: layered configuration (defaults, file, env/CLI)
/// - `db`: database connection management
/// - `dto`: request payloads and the response envelope
/// - `errors`: the API error type and its HTTP mapping
/// - `handlers`: one handler per REST endpoint
/// - `llm`: the model gateway trait, its OpenAI client and test mock
/// - `models`: database models and validated value types
/// - `repo`: repository layer for database operations
/// - `schema`: database schema definitions
/// - `scoring`: pure quiz grading
/// - `storage`: the local uploads directory
/// - `textprep`: document text extraction, cleaning and chunking
///
/// ### Web API
///
/// All endpoints live under `/api` and answer with the
/// `{success, message, data?}` envelope; everything except register and
/// login requires a bearer token.

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod repo;
pub mod schema;
pub mod scoring;
pub mod storage;
pub mod textprep;

#[cfg(test)]
pub mod test_support;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tower_http::cors::CorsLayer;

use crate::auth::AuthKeys;
use crate::db::DbPool;
use crate::llm::LlmProvider;
use crate::storage::FileStore;

/// Embedded database migrations
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Cap on request bodies; course uploads are the largest legitimate
/// payloads. The OCR endpoint applies its stricter 20 MB check itself.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state handed to every handler.
///
/// The model gateway is a trait object so tests can substitute a mock;
/// the pool, keys and upload store are plain handles, not globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub llm: Arc<dyn LlmProvider>,
    pub auth: Arc<AuthKeys>,
    pub storage: Arc<FileStore>,
}

/// Creates the application router with all routes
///
/// ### Arguments
///
/// * `state` - The shared state (pool, model gateway, keys, storage)
///
/// ### Returns
///
/// An Axum Router configured with every endpoint and the state attached
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Account lifecycle
        .route("/api/auth/register", post(handlers::register_handler))
        .route("/api/auth/login", post(handlers::login_handler))
        .route("/api/auth/verify", get(handlers::verify_handler))
        .route("/api/auth/change-password", put(handlers::change_password_handler))
        .route("/api/auth/delete-account", delete(handlers::delete_account_handler))
        .route("/api/auth/redeem-code", post(handlers::redeem_code_handler))
        // Onboarding
        .route(
            "/api/onboarding/profile",
            post(handlers::create_profile_handler)
                .get(handlers::get_profile_handler)
                .put(handlers::update_profile_handler),
        )
        .route("/api/onboarding/matieres", get(handlers::matieres_handler))
        // Courses
        .route("/api/courses", get(handlers::list_courses_handler))
        .route("/api/courses/upload", post(handlers::upload_course_handler))
        .route("/api/courses/ocr", post(handlers::ocr_handler))
        .route("/api/courses/{id}", delete(handlers::delete_course_handler))
        .route(
            "/api/courses/{id}/content",
            get(handlers::get_course_content_handler).put(handlers::update_course_content_handler),
        )
        .route("/api/courses/{id}/file", get(handlers::get_course_file_handler))
        .route(
            "/api/courses/{id}/highlights",
            get(handlers::list_highlights_handler).post(handlers::save_highlights_handler),
        )
        .route("/api/courses/{id}/reformat", post(handlers::reformat_course_handler))
        .route("/api/courses/{id}/ask", post(handlers::ask_course_handler))
        // Quizzes
        .route("/api/qcm", get(handlers::list_quizzes_handler))
        .route(
            "/api/qcm/generate-from-course/{id}",
            post(handlers::generate_quiz_from_course_handler),
        )
        .route("/api/qcm/generate-from-text", post(handlers::generate_quiz_from_text_handler))
        .route("/api/qcm/import-from-text", post(handlers::import_quiz_from_text_handler))
        .route("/api/qcm/import-from-file", post(handlers::import_quiz_from_file_handler))
        .route(
            "/api/qcm/{id}",
            get(handlers::get_quiz_handler).delete(handlers::delete_quiz_handler),
        )
        .route("/api/qcm/{id}/submit", post(handlers::submit_quiz_handler))
        .route("/api/qcm/{id}/attempts", get(handlers::list_attempts_handler))
        .route("/api/qcm/{id}/attempts/{attempt_id}", get(handlers::get_attempt_handler))
        // Flashcards
        .route("/api/flashcards", get(handlers::list_flashcard_sets_handler))
        .route(
            "/api/flashcards/generate-from-course/{id}",
            post(handlers::generate_flashcards_from_course_handler),
        )
        .route(
            "/api/flashcards/generate-from-text",
            post(handlers::generate_flashcards_from_text_handler),
        )
        .route(
            "/api/flashcards/{id}",
            get(handlers::get_flashcard_set_handler).delete(handlers::delete_flashcard_set_handler),
        )
        // Summaries
        .route("/api/summaries", get(handlers::list_summaries_handler))
        .route("/api/summaries/create", post(handlers::create_summary_handler))
        .route(
            "/api/summaries/{id}",
            get(handlers::get_summary_handler).delete(handlers::delete_summary_handler),
        )
        .route("/api/summaries/{id}/content", put(handlers::update_summary_content_handler))
        .route("/api/summaries/{id}/reformat", post(handlers::reformat_summary_handler))
        .route("/api/summaries/{id}/ask", post(handlers::ask_summary_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the embedded migrations
///
/// ### Panics
///
/// This function will panic if the migrations fail to run
pub fn run_migrations(conn: &mut diesel::SqliteConnection) {
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
}
