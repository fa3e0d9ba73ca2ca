use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::models::User;
use crate::schema::{
    code_redemptions, course_highlights, courses, flashcard_sets, quiz_attempts, quizzes,
    student_profiles, summaries, users,
};

/// Inserts a new account row.
///
/// ### Errors
///
/// Returns an error if the pool is exhausted or the insert fails (in
/// particular on a duplicate email, which the unique index rejects).
#[instrument(skip(pool, user), fields(email = %user.get_email()))]
pub fn create_user(pool: &DbPool, user: User) -> Result<User> {
    debug!("Creating new user");
    let conn = &mut pool.get()?;

    diesel::insert_into(users::table)
        .values(user.clone())
        .execute(conn)?;

    info!("Created user {}", user.get_id());
    Ok(user)
}

/// Retrieves an account by id.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn get_user(pool: &DbPool, user_id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .filter(users::id.eq(user_id))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

/// Retrieves an account by login email.
#[instrument(skip(pool, email))]
pub fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

/// Replaces the stored password hash.
#[instrument(skip(pool, password_hash), fields(user_id = %user_id))]
pub fn update_password(pool: &DbPool, user_id: &str, password_hash: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    diesel::update(users::table.filter(users::id.eq(user_id)))
        .set((
            users::password_hash.eq(password_hash),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    info!("Updated password for user {}", user_id);
    Ok(())
}

/// Marks the onboarding flow as finished.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn set_onboarding_done(pool: &DbPool, user_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    diesel::update(users::table.filter(users::id.eq(user_id)))
        .set((
            users::onboarding_done.eq(true),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    Ok(())
}

/// Deletes an account and every row that belongs to it.
///
/// All dependent tables are cleared before the user row inside one
/// transaction, so a failure part-way leaves the account fully intact
/// rather than half-deleted. Upload files are the caller's problem:
/// they live outside the database and are removed (best effort) before
/// this runs.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn delete_user_cascade(pool: &DbPool, user_id: &str) -> Result<()> {
    debug!("Deleting user and all dependent rows");
    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::delete(
            course_highlights::table.filter(course_highlights::user_id.eq(user_id)),
        )
        .execute(conn)?;
        diesel::delete(quiz_attempts::table.filter(quiz_attempts::user_id.eq(user_id)))
            .execute(conn)?;
        diesel::delete(quizzes::table.filter(quizzes::user_id.eq(user_id))).execute(conn)?;
        diesel::delete(flashcard_sets::table.filter(flashcard_sets::user_id.eq(user_id)))
            .execute(conn)?;
        diesel::delete(summaries::table.filter(summaries::user_id.eq(user_id))).execute(conn)?;
        diesel::delete(courses::table.filter(courses::user_id.eq(user_id))).execute(conn)?;
        diesel::delete(student_profiles::table.filter(student_profiles::user_id.eq(user_id)))
            .execute(conn)?;
        diesel::delete(code_redemptions::table.filter(code_redemptions::user_id.eq(user_id)))
            .execute(conn)?;
        diesel::delete(users::table.filter(users::id.eq(user_id))).execute(conn)?;
        Ok(())
    })?;

    info!("Deleted user {} and dependents", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::tests::setup_test_db;

    fn sample_user(email: &str) -> User {
        User::new(email.to_string(), "hash".to_string(), "Student".to_string())
    }

    #[test]
    fn test_create_and_fetch_by_email() {
        let pool = setup_test_db();
        let user = create_user(&pool, sample_user("a@example.com")).unwrap();

        let found = get_user_by_email(&pool, "a@example.com").unwrap().unwrap();
        assert_eq!(found.get_id(), user.get_id());
        assert!(get_user_by_email(&pool, "b@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let pool = setup_test_db();
        create_user(&pool, sample_user("dup@example.com")).unwrap();
        assert!(create_user(&pool, sample_user("dup@example.com")).is_err());
    }

    #[test]
    fn test_cascade_delete_removes_dependents() {
        let pool = setup_test_db();
        let user = create_user(&pool, sample_user("gone@example.com")).unwrap();

        let course = crate::repo::create_course(
            &pool,
            crate::models::Course::new(
                user.get_id(),
                "Algèbre".to_string(),
                None,
                "Mathématiques".to_string(),
                "Terminale".to_string(),
                "cours".to_string(),
                None,
                None,
                Some("Un peu de texte.".to_string()),
            ),
        )
        .unwrap();

        delete_user_cascade(&pool, &user.get_id()).unwrap();

        assert!(get_user(&pool, &user.get_id()).unwrap().is_none());
        assert!(crate::repo::get_course(&pool, &course.get_id(), &user.get_id())
            .unwrap()
            .is_none());
    }
}
