use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use super::JsonValue;
use crate::scoring::{GradedAttempt, QuestionOutcome};

/// An immutable snapshot of one quiz submission.
///
/// Attempts are append-only history; nothing updates them after insert.
/// The per-question outcomes are stored as one serialized column, the
/// aggregate counters are denormalized alongside for cheap listing.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::quiz_attempts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuizAttempt {
    id: String,
    quiz_id: String,
    user_id: String,

    /// Serialized `Vec<QuestionOutcome>`
    results: JsonValue,

    correct_count: i32,
    incorrect_count: i32,

    /// Percentage rounded to the nearest integer
    score: i32,

    /// Unrounded percentage
    percentage: f64,

    /// Elapsed time reported by the client
    time_spent_seconds: Option<i32>,

    created_at: NaiveDateTime,
}

impl QuizAttempt {
    /// Builds the stored snapshot from a graded submission.
    pub fn new(
        quiz_id: String,
        user_id: String,
        graded: &GradedAttempt,
        time_spent_seconds: Option<i32>,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            quiz_id,
            user_id,
            results: JsonValue::encode(&graded.outcomes)?,
            correct_count: graded.correct_count as i32,
            incorrect_count: graded.incorrect_count as i32,
            score: graded.score,
            percentage: graded.percentage,
            time_spent_seconds,
            created_at: Utc::now().naive_utc(),
        })
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_quiz_id(&self) -> String {
        self.quiz_id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    /// Decodes the stored per-question outcomes.
    pub fn get_results(&self) -> serde_json::Result<Vec<QuestionOutcome>> {
        self.results.decode()
    }

    pub fn get_correct_count(&self) -> i32 {
        self.correct_count
    }

    pub fn get_incorrect_count(&self) -> i32 {
        self.incorrect_count
    }

    pub fn get_score(&self) -> i32 {
        self.score
    }

    pub fn get_percentage(&self) -> f64 {
        self.percentage
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }
}
