//! Shared helpers for the in-crate handler and repository tests.

use std::sync::Arc;

use crate::auth::{hash_password, AuthKeys, AuthUser};
use crate::llm::mock::MockLlm;
use crate::models::{AccessCode, Course, User};
use crate::repo::tests::setup_test_db;
use crate::storage::FileStore;
use crate::{repo, AppState};

/// Builds an `AppState` over an in-memory database, a throwaway uploads
/// directory and the mock gateway, returning the mock handle too.
pub fn test_state_full() -> (AppState, Arc<MockLlm>) {
    let pool = setup_test_db();
    let mock = Arc::new(MockLlm::new());

    let upload_dir = std::env::temp_dir().join(format!("cortex-test-{}", uuid::Uuid::new_v4()));
    let storage = FileStore::new(upload_dir).expect("Failed to create test upload dir");

    let state = AppState {
        pool,
        llm: mock.clone(),
        auth: Arc::new(AuthKeys::new("test-secret")),
        storage: Arc::new(storage),
    };
    (state, mock)
}

/// Like [`test_state_full`] when the test doesn't steer the mock.
pub fn test_state() -> AppState {
    test_state_full().0
}

/// Creates an account directly and returns its extractor value, as if a
/// valid token had been presented.
pub fn register_test_user(state: &AppState, email: &str) -> AuthUser {
    let hash = hash_password("motdepasse").expect("hash");
    let user = repo::create_user(
        &state.pool,
        User::new(email.to_string(), hash, "Étudiant".to_string()),
    )
    .expect("create user");
    AuthUser {
        user_id: user.get_id(),
    }
}

/// Grants the AI features the same way production does: by redeeming a
/// fresh activation code.
pub fn grant_ai_access(state: &AppState, auth: &AuthUser) {
    let code = AccessCode::random_code(12);
    repo::create_access_code(&state.pool, AccessCode::new(code.clone(), 1, None))
        .expect("create code");
    repo::redeem_code(&state.pool, &code, &auth.user_id).expect("redeem");
}

/// Creates a text-only course owned by the given user.
pub fn create_test_course(state: &AppState, auth: &AuthUser, text: &str) -> Course {
    repo::create_course(
        &state.pool,
        Course::new(
            auth.user_id.clone(),
            "Cours de test".to_string(),
            None,
            "Mathématiques".to_string(),
            "Terminale".to_string(),
            "cours".to_string(),
            None,
            None,
            Some(text.to_string()),
        ),
    )
    .expect("create course")
}
