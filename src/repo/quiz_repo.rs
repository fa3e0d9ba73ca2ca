use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::models::Quiz;
use crate::schema::{quiz_attempts, quizzes};

/// Inserts a new quiz with its validated question set.
#[instrument(skip(pool, quiz), fields(quiz_id = %quiz.get_id(), user_id = %quiz.get_user_id()))]
pub fn create_quiz(pool: &DbPool, quiz: Quiz) -> Result<Quiz> {
    debug!("Creating new quiz");
    let conn = &mut pool.get()?;
    diesel::insert_into(quizzes::table)
        .values(quiz.clone())
        .execute(conn)?;
    info!("Created quiz {}", quiz.get_id());
    Ok(quiz)
}

/// Retrieves a quiz scoped to its owner.
#[instrument(skip(pool), fields(quiz_id = %quiz_id, user_id = %user_id))]
pub fn get_quiz(pool: &DbPool, quiz_id: &str, user_id: &str) -> Result<Option<Quiz>> {
    let conn = &mut pool.get()?;
    let quiz = quizzes::table
        .filter(quizzes::id.eq(quiz_id))
        .filter(quizzes::user_id.eq(user_id))
        .select(Quiz::as_select())
        .first(conn)
        .optional()?;
    Ok(quiz)
}

/// Lists a user's quizzes, newest first.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_quizzes(pool: &DbPool, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Quiz>> {
    let conn = &mut pool.get()?;
    let list = quizzes::table
        .filter(quizzes::user_id.eq(user_id))
        .order(quizzes::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Quiz::as_select())
        .load(conn)?;
    Ok(list)
}

/// Deletes a quiz and its attempt history.
#[instrument(skip(pool), fields(quiz_id = %quiz_id, user_id = %user_id))]
pub fn delete_quiz_cascade(pool: &DbPool, quiz_id: &str, user_id: &str) -> Result<usize> {
    let conn = &mut pool.get()?;

    let deleted = conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::delete(
            quiz_attempts::table
                .filter(quiz_attempts::quiz_id.eq(quiz_id))
                .filter(quiz_attempts::user_id.eq(user_id)),
        )
        .execute(conn)?;
        let deleted = diesel::delete(
            quizzes::table
                .filter(quizzes::id.eq(quiz_id))
                .filter(quizzes::user_id.eq(user_id)),
        )
        .execute(conn)?;
        Ok(deleted)
    })?;

    info!("Deleted quiz {} ({} row)", quiz_id, deleted);
    Ok(deleted)
}
