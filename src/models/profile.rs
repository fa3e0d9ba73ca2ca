use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use super::JsonValue;

/// Onboarding profile, one per user.
///
/// The list fields (strengths, weaknesses, goals) are free-form strings
/// chosen by the student and stored as JSON arrays.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::student_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StudentProfile {
    id: String,
    user_id: String,

    /// School year, e.g. "Terminale"
    study_year: String,

    /// Chosen track or major
    major: String,

    strengths: JsonValue,
    weaknesses: JsonValue,
    goals: JsonValue,

    /// Preferred quiz difficulty
    difficulty_preference: String,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl StudentProfile {
    pub fn new(
        user_id: String,
        study_year: String,
        major: String,
        strengths: &[String],
        weaknesses: &[String],
        goals: &[String],
        difficulty_preference: String,
    ) -> serde_json::Result<Self> {
        let now = Utc::now().naive_utc();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            study_year,
            major,
            strengths: JsonValue::encode(&strengths)?,
            weaknesses: JsonValue::encode(&weaknesses)?,
            goals: JsonValue::encode(&goals)?,
            difficulty_preference,
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

    pub fn get_study_year(&self) -> String {
        self.study_year.clone()
    }

    pub fn get_major(&self) -> String {
        self.major.clone()
    }

    pub fn get_strengths(&self) -> serde_json::Result<Vec<String>> {
        self.strengths.decode()
    }

    pub fn get_weaknesses(&self) -> serde_json::Result<Vec<String>> {
        self.weaknesses.decode()
    }

    pub fn get_goals(&self) -> serde_json::Result<Vec<String>> {
        self.goals.decode()
    }

    pub fn get_difficulty_preference(&self) -> String {
        self.difficulty_preference.clone()
    }
}
