/// LLM gateway module
///
/// Everything "intelligent" in the product (quiz generation, flashcard
/// generation, OCR, reformatting, summarization, free-form Q&A) is
/// delegated to an external model behind the [`LlmProvider`] trait.
/// Handlers receive the provider through `AppState`, so tests swap in
/// [`mock::MockLlm`] instead of the real API client.

pub mod mock;
mod openai;
mod prompts;

pub use openai::{OpenAiClient, DEFAULT_MODEL};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Flashcard, Question};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("no API key is configured for the model provider")]
    MissingApiKey,

    #[error("request to the model API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned a malformed payload: {0}")]
    MalformedResponse(String),
}

/// Options for quiz generation.
#[derive(Debug, Clone)]
pub struct QuizOptions {
    pub num_questions: usize,
    pub difficulty: Option<String>,
}

/// Options for flashcard generation.
#[derive(Debug, Clone)]
pub struct FlashcardOptions {
    pub num_cards: usize,
    pub difficulty: Option<String>,
}

/// The capability boundary to the external model.
///
/// Each call is one request/response round trip: no retry, no backoff,
/// no partial results. A failure maps to a 500 at the HTTP boundary.
/// Structured outputs (questions, flashcards) are validated before they
/// are returned, so callers never see a half-formed payload.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generates a QCM question set from course content.
    async fn generate_quiz(&self, content: &str, options: &QuizOptions)
        -> Result<Vec<Question>, LlmError>;

    /// Generates front/back flashcards from course content.
    async fn generate_flashcards(
        &self,
        content: &str,
        options: &FlashcardOptions,
    ) -> Result<Vec<Flashcard>, LlmError>;

    /// Structures an existing, human-written quiz text into questions.
    async fn parse_quiz(&self, raw: &str) -> Result<Vec<Question>, LlmError>;

    /// Rewrites course content into a cleaner study version.
    async fn reformat(&self, content: &str) -> Result<String, LlmError>;

    /// Produces a prose summary of course content.
    async fn summarize(&self, content: &str) -> Result<String, LlmError>;

    /// Answers a free-form question about the given content.
    async fn ask(&self, content: &str, question: &str) -> Result<String, LlmError>;

    /// Extracts text from a photographed or scanned page. Unstructured:
    /// the reply is plain text, not JSON.
    async fn extract_image_text(&self, image: &[u8], mime: &str) -> Result<String, LlmError>;
}
