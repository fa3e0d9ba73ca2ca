use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JsonValue;

/// A single front/back flashcard inside a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_difficulty() -> String {
    "moyen".to_string()
}

impl Flashcard {
    /// Both sides must carry text; the generation gateway occasionally
    /// emits blank cards and those are rejected before storage.
    pub fn validate(&self) -> Result<(), String> {
        if self.front.trim().is_empty() {
            return Err("flashcard front is empty".to_string());
        }
        if self.back.trim().is_empty() {
            return Err("flashcard back is empty".to_string());
        }
        Ok(())
    }
}

/// Validates a whole generated card set.
pub fn validate_flashcards(cards: &[Flashcard]) -> Result<(), String> {
    if cards.is_empty() {
        return Err("flashcard list is empty".to_string());
    }
    for (index, card) in cards.iter().enumerate() {
        card.validate()
            .map_err(|e| format!("card {}: {}", index + 1, e))?;
    }
    Ok(())
}

/// An ordered set of flashcards owned by one user.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = crate::schema::flashcard_sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FlashcardSet {
    id: String,
    user_id: String,
    course_id: Option<String>,
    title: String,

    /// Serialized `Vec<Flashcard>`
    cards: JsonValue,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl FlashcardSet {
    pub fn new(
        user_id: String,
        course_id: Option<String>,
        title: String,
        cards: &[Flashcard],
    ) -> serde_json::Result<Self> {
        let now = Utc::now().naive_utc();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            course_id,
            title,
            cards: JsonValue::encode(&cards)?,
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

    pub fn get_cards(&self) -> serde_json::Result<Vec<Flashcard>> {
        self.cards.decode()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }
}
