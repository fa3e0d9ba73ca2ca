/// Repository module
///
/// This module provides the data access layer for the application.
/// Every query on content entities is scoped to the owning user; an
/// ownership mismatch looks identical to a missing row. Multi-step
/// writes (attempt recording, highlight replacement, cascade deletes,
/// code redemption) run inside a single transaction.

mod access_code_repo;
mod attempt_repo;
mod course_repo;
mod flashcard_repo;
mod highlight_repo;
mod profile_repo;
mod quiz_repo;
mod summary_repo;
mod user_repo;

// Re-export all repository functions
pub use access_code_repo::*;
pub use attempt_repo::*;
pub use course_repo::*;
pub use flashcard_repo::*;
pub use highlight_repo::*;
pub use profile_repo::*;
pub use quiz_repo::*;
pub use summary_repo::*;
pub use user_repo::*;
