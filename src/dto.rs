use serde::{Deserialize, Serialize};

/// The uniform response envelope.
///
/// Every endpoint, success or failure, answers with
/// `{success, message, data?}`; failures never populate `data`.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A successful response with no payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Data transfer object for registering an account
#[derive(Deserialize, Debug)]
pub struct RegisterDto {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Data transfer object for logging in
#[derive(Deserialize, Debug)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

/// Data transfer object for changing the account password
#[derive(Deserialize, Debug)]
pub struct ChangePasswordDto {
    pub current_password: String,
    pub new_password: String,
}

/// Data transfer object for redeeming an AI activation code
#[derive(Deserialize, Debug)]
pub struct RedeemCodeDto {
    pub code: String,
}

/// Data transfer object for creating or updating the onboarding profile
#[derive(Deserialize, Debug)]
pub struct ProfileDto {
    pub study_year: String,
    pub major: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty_preference: String,
}

fn default_difficulty() -> String {
    "moyen".to_string()
}

/// Data transfer object for replacing editable content (course or summary)
#[derive(Deserialize, Debug)]
pub struct UpdateContentDto {
    pub content: String,
}

/// Data transfer object for a free-form question about some content
#[derive(Deserialize, Debug)]
pub struct AskDto {
    pub question: String,
}

/// One highlight in a bulk save; the set replaces all stored rows.
#[derive(Deserialize, Debug)]
pub struct HighlightDto {
    pub text: String,
    #[serde(default = "default_highlight_color")]
    pub color: String,
    pub start_offset: i32,
    pub end_offset: i32,
    #[serde(default)]
    pub page: Option<i32>,
}

fn default_highlight_color() -> String {
    "#FFEB3B".to_string()
}

/// Data transfer object for the bulk highlight save
#[derive(Deserialize, Debug)]
pub struct SaveHighlightsDto {
    pub highlights: Vec<HighlightDto>,
}

/// Options for quiz generation from a stored course
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct GenerateQuizDto {
    pub num_questions: usize,
    pub difficulty: Option<String>,
}

impl Default for GenerateQuizDto {
    fn default() -> Self {
        Self {
            num_questions: 10,
            difficulty: None,
        }
    }
}

/// Options for quiz generation from pasted text
#[derive(Deserialize, Debug)]
pub struct GenerateQuizFromTextDto {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
    #[serde(default)]
    pub difficulty: Option<String>,
}

fn default_num_questions() -> usize {
    10
}

/// Data transfer object for importing an existing quiz from raw text
#[derive(Deserialize, Debug)]
pub struct ImportQuizDto {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Data transfer object for submitting quiz answers
///
/// Answers are positional; a null (or missing trailing) entry means the
/// question was left unanswered and counts as incorrect.
#[derive(Deserialize, Debug)]
pub struct SubmitAttemptDto {
    pub answers: Vec<Option<String>>,
    #[serde(default)]
    pub time_spent_seconds: Option<i32>,
}

/// Options for flashcard generation from a stored course
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct GenerateFlashcardsDto {
    pub num_cards: usize,
    pub difficulty: Option<String>,
}

impl Default for GenerateFlashcardsDto {
    fn default() -> Self {
        Self {
            num_cards: 15,
            difficulty: None,
        }
    }
}

/// Options for flashcard generation from pasted text
#[derive(Deserialize, Debug)]
pub struct GenerateFlashcardsFromTextDto {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_num_cards")]
    pub num_cards: usize,
    #[serde(default)]
    pub difficulty: Option<String>,
}

fn default_num_cards() -> usize {
    15
}

/// Data transfer object for creating a summary from a course or raw text
#[derive(Deserialize, Debug)]
pub struct CreateSummaryDto {
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Query parameters shared by the list endpoints
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PaginationQuery {
    /// Translates the 1-based page query into a limit/offset pair,
    /// clamping the page size to 100.
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = i64::from(self.per_page.unwrap_or(50).clamp(1, 100));
        let page = i64::from(self.page.unwrap_or(1).max(1));
        (per_page, (page - 1) * per_page)
    }
}
