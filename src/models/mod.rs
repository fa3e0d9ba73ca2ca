/// Data models module
///
/// This module defines the core data structures used throughout the
/// application: database models mapping to tables, plus the validated
/// value types (questions, flashcards) that live inside serialized
/// columns.

// Re-export all model types
mod json_value;
pub use json_value::JsonValue;

mod user;
pub use user::User;

mod profile;
pub use profile::StudentProfile;

mod course;
pub use course::Course;

mod highlight;
pub use highlight::CourseHighlight;

mod quiz;
pub use quiz::{validate_questions, Question, Quiz};

mod attempt;
pub use attempt::QuizAttempt;

mod flashcard;
pub use flashcard::{validate_flashcards, Flashcard, FlashcardSet};

mod summary;
pub use summary::Summary;

mod access_code;
pub use access_code::{AccessCode, CodeRedemption};
