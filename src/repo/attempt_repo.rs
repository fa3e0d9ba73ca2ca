use anyhow::{anyhow, Result};
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::models::QuizAttempt;
use crate::schema::{quiz_attempts, quizzes};

/// Records a graded submission and refreshes the parent quiz.
///
/// The attempt insert, the completion flag, and the best-score update
/// are one transaction: either the attempt exists and the quiz reflects
/// it, or nothing changed. The best score only moves when the new score
/// is strictly greater (a first attempt always sets it, since there is
/// no previous score to beat), so it is monotonically non-decreasing.
///
/// ### Errors
///
/// Returns an error if the quiz row vanished between the handler's
/// ownership check and this call, or on any database failure.
#[instrument(skip(pool, attempt), fields(quiz_id = %attempt.get_quiz_id(), score = attempt.get_score()))]
pub fn record_attempt(pool: &DbPool, attempt: QuizAttempt) -> Result<QuizAttempt> {
    debug!("Recording quiz attempt");
    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::insert_into(quiz_attempts::table)
            .values(attempt.clone())
            .execute(conn)?;

        let best: Option<i32> = quizzes::table
            .filter(quizzes::id.eq(attempt.get_quiz_id()))
            .filter(quizzes::user_id.eq(attempt.get_user_id()))
            .select(quizzes::best_score)
            .first(conn)
            .optional()?
            .ok_or_else(|| anyhow!("quiz {} no longer exists", attempt.get_quiz_id()))?;

        let now = Utc::now().naive_utc();
        let target = quizzes::table
            .filter(quizzes::id.eq(attempt.get_quiz_id()))
            .filter(quizzes::user_id.eq(attempt.get_user_id()));

        if best.is_none_or(|b| attempt.get_score() > b) {
            diesel::update(target)
                .set((
                    quizzes::best_score.eq(attempt.get_score()),
                    quizzes::completed.eq(true),
                    quizzes::updated_at.eq(now),
                ))
                .execute(conn)?;
        } else {
            diesel::update(target)
                .set((quizzes::completed.eq(true), quizzes::updated_at.eq(now)))
                .execute(conn)?;
        }
        Ok(())
    })?;

    info!(
        "Recorded attempt {} for quiz {}",
        attempt.get_id(),
        attempt.get_quiz_id()
    );
    Ok(attempt)
}

/// Lists a quiz's attempts, newest first.
#[instrument(skip(pool), fields(quiz_id = %quiz_id, user_id = %user_id))]
pub fn list_attempts(pool: &DbPool, quiz_id: &str, user_id: &str) -> Result<Vec<QuizAttempt>> {
    let conn = &mut pool.get()?;
    let attempts = quiz_attempts::table
        .filter(quiz_attempts::quiz_id.eq(quiz_id))
        .filter(quiz_attempts::user_id.eq(user_id))
        .order(quiz_attempts::created_at.desc())
        .select(QuizAttempt::as_select())
        .load(conn)?;
    Ok(attempts)
}

/// Retrieves one attempt, scoped to the quiz and its owner.
#[instrument(skip(pool), fields(attempt_id = %attempt_id, quiz_id = %quiz_id))]
pub fn get_attempt(
    pool: &DbPool,
    quiz_id: &str,
    attempt_id: &str,
    user_id: &str,
) -> Result<Option<QuizAttempt>> {
    let conn = &mut pool.get()?;
    let attempt = quiz_attempts::table
        .filter(quiz_attempts::id.eq(attempt_id))
        .filter(quiz_attempts::quiz_id.eq(quiz_id))
        .filter(quiz_attempts::user_id.eq(user_id))
        .select(QuizAttempt::as_select())
        .first(conn)
        .optional()?;
    Ok(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::sample_questions;
    use crate::models::{Quiz, User};
    use crate::repo::tests::setup_test_db;
    use crate::scoring::grade_answers;

    fn setup_quiz(pool: &DbPool) -> (User, Quiz) {
        let user = crate::repo::create_user(
            pool,
            User::new("q@example.com".to_string(), "hash".to_string(), "Q".to_string()),
        )
        .unwrap();
        let quiz = crate::repo::create_quiz(
            pool,
            Quiz::new(
                user.get_id(),
                None,
                "SVT".to_string(),
                "moyen".to_string(),
                &sample_questions(),
            )
            .unwrap(),
        )
        .unwrap();
        (user, quiz)
    }

    fn attempt_scoring(pool: &DbPool, user: &User, quiz: &Quiz, answers: &[Option<String>]) -> QuizAttempt {
        let questions = quiz.get_questions().unwrap();
        let graded = grade_answers(&questions, answers);
        let attempt =
            QuizAttempt::new(quiz.get_id(), user.get_id(), &graded, Some(60)).unwrap();
        record_attempt(pool, attempt).unwrap()
    }

    #[test]
    fn test_first_attempt_sets_best_score_and_completion() {
        let pool = setup_test_db();
        let (user, quiz) = setup_quiz(&pool);

        // sample_questions: correct answers are A then C; one right.
        attempt_scoring(&pool, &user, &quiz, &[Some("A".into()), Some("B".into())]);

        let stored = crate::repo::get_quiz(&pool, &quiz.get_id(), &user.get_id())
            .unwrap()
            .unwrap();
        assert_eq!(stored.get_best_score(), Some(50));
        assert!(stored.is_completed());
    }

    #[test]
    fn test_best_score_never_decreases() {
        let pool = setup_test_db();
        let (user, quiz) = setup_quiz(&pool);

        attempt_scoring(&pool, &user, &quiz, &[Some("A".into()), Some("C".into())]); // 100
        attempt_scoring(&pool, &user, &quiz, &[Some("B".into()), Some("B".into())]); // 0

        let stored = crate::repo::get_quiz(&pool, &quiz.get_id(), &user.get_id())
            .unwrap()
            .unwrap();
        assert_eq!(stored.get_best_score(), Some(100));

        let attempts = list_attempts(&pool, &quiz.get_id(), &user.get_id()).unwrap();
        assert_eq!(attempts.len(), 2);
    }

    #[test]
    fn test_attempt_snapshot_is_retrievable() {
        let pool = setup_test_db();
        let (user, quiz) = setup_quiz(&pool);

        let recorded =
            attempt_scoring(&pool, &user, &quiz, &[Some("A".into())]);

        let fetched = get_attempt(&pool, &quiz.get_id(), &recorded.get_id(), &user.get_id())
            .unwrap()
            .unwrap();
        assert_eq!(fetched.get_correct_count(), 1);
        assert_eq!(fetched.get_incorrect_count(), 1);

        let outcomes = fetched.get_results().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].user_answer, None);
    }

    #[test]
    fn test_attempt_for_missing_quiz_rolls_back() {
        let pool = setup_test_db();
        let (user, quiz) = setup_quiz(&pool);
        let questions = quiz.get_questions().unwrap();
        let graded = grade_answers(&questions, &[]);
        let attempt =
            QuizAttempt::new("no-such-quiz".to_string(), user.get_id(), &graded, None).unwrap();

        assert!(record_attempt(&pool, attempt).is_err());
        // The insert must not survive the failed transaction.
        assert!(list_attempts(&pool, "no-such-quiz", &user.get_id())
            .unwrap()
            .is_empty());
    }
}
