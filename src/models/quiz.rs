use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::JsonValue;

/// A single multiple-choice question inside a quiz.
///
/// Question arrays come back from the generation gateway as JSON; this
/// type is the validated form they must take before anything is stored.
/// Keys in `options` are the answer letters ("A" through "D") and
/// `correct_answer` must be one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// The question prompt shown to the student
    pub question: String,

    /// Answer options keyed by letter
    pub options: BTreeMap<String, String>,

    /// The key of the correct option
    pub correct_answer: String,

    /// Why the correct answer is correct
    #[serde(default)]
    pub explanation: String,

    /// Difficulty label ("facile", "moyen", "difficile")
    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    /// Optional topic tag within the course
    #[serde(default)]
    pub topic: Option<String>,
}

fn default_difficulty() -> String {
    "moyen".to_string()
}

impl Question {
    /// Checks the structural invariants of a generated question.
    ///
    /// ### Errors
    ///
    /// Returns a message describing the first violated invariant: an
    /// empty prompt, an option count other than four, or a correct
    /// answer key that is not one of the options.
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question prompt is empty".to_string());
        }
        if self.options.len() != 4 {
            return Err(format!("expected 4 options, got {}", self.options.len()));
        }
        if !self.options.contains_key(&self.correct_answer) {
            return Err(format!(
                "correct answer '{}' is not one of the options",
                self.correct_answer
            ));
        }
        Ok(())
    }
}

/// Validates a whole generated question set.
///
/// An empty set is rejected: a quiz with no questions cannot be taken.
pub fn validate_questions(questions: &[Question]) -> Result<(), String> {
    if questions.is_empty() {
        return Err("question list is empty".to_string());
    }
    for (index, question) in questions.iter().enumerate() {
        question
            .validate()
            .map_err(|e| format!("question {}: {}", index + 1, e))?;
    }
    Ok(())
}

/// A quiz owned by one user, optionally derived from a course.
///
/// The question array is stored as a single serialized column and
/// replaced wholesale on update; there are no per-question rows.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::quizzes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Quiz {
    /// Unique identifier (UUID v4 as string)
    id: String,

    /// The owning user
    user_id: String,

    /// The course this quiz was generated from, if any
    course_id: Option<String>,

    /// Display title
    title: String,

    /// Requested difficulty for the whole quiz
    difficulty: String,

    /// The serialized `Vec<Question>`
    questions: JsonValue,

    /// Best score over all attempts (rounded percentage), once attempted
    best_score: Option<i32>,

    /// Whether the quiz has been completed at least once
    completed: bool,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Quiz {
    /// Creates a new quiz from a validated question set.
    pub fn new(
        user_id: String,
        course_id: Option<String>,
        title: String,
        difficulty: String,
        questions: &[Question],
    ) -> serde_json::Result<Self> {
        let now = Utc::now().naive_utc();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            course_id,
            title,
            difficulty,
            questions: JsonValue::encode(&questions)?,
            best_score: None,
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    pub fn get_course_id(&self) -> Option<String> {
        self.course_id.clone()
    }

    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    pub fn get_difficulty(&self) -> String {
        self.difficulty.clone()
    }

    /// Decodes the stored question array.
    pub fn get_questions(&self) -> serde_json::Result<Vec<Question>> {
        self.questions.decode()
    }

    pub fn get_best_score(&self) -> Option<i32> {
        self.best_score
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: &str) -> Question {
        Question {
            question: "2 + 2 = ?".to_string(),
            options: BTreeMap::from([
                ("A".to_string(), "3".to_string()),
                ("B".to_string(), "4".to_string()),
                ("C".to_string(), "5".to_string()),
                ("D".to_string(), "22".to_string()),
            ]),
            correct_answer: correct.to_string(),
            explanation: String::new(),
            difficulty: "facile".to_string(),
            topic: None,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_question() {
        assert!(question("B").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_correct_key() {
        let err = question("E").validate().unwrap_err();
        assert!(err.contains("not one of the options"), "unexpected message: {err}");
    }

    #[test]
    fn test_validate_rejects_wrong_option_count() {
        let mut q = question("A");
        q.options.remove("D");
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_validate_questions_rejects_empty_set() {
        assert!(validate_questions(&[]).is_err());
    }

    #[test]
    fn test_validate_questions_reports_offending_index() {
        let err = validate_questions(&[question("A"), question("Z")]).unwrap_err();
        assert!(err.starts_with("question 2:"), "unexpected message: {err}");
    }

    #[test]
    fn test_quiz_round_trips_questions() {
        let questions = vec![question("A"), question("C")];
        let quiz = Quiz::new(
            "user-1".to_string(),
            None,
            "Arithmetic".to_string(),
            "facile".to_string(),
            &questions,
        )
        .unwrap();

        assert_eq!(quiz.get_questions().unwrap(), questions);
        assert_eq!(quiz.get_best_score(), None);
        assert!(!quiz.is_completed());
    }

    #[test]
    fn test_question_defaults_on_sparse_json() {
        // The gateway is allowed to omit explanation/difficulty/topic.
        let json = r#"{
            "question": "Quel est le symbole de l'oxygène ?",
            "options": {"A": "O", "B": "Ox", "C": "O2", "D": "Om"},
            "correct_answer": "A"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.difficulty, "moyen");
        assert_eq!(q.explanation, "");
        assert_eq!(q.topic, None);
        assert!(q.validate().is_ok());
    }
}
