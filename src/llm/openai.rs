use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::prompts;
use super::{FlashcardOptions, LlmError, LlmProvider, QuizOptions};
use crate::models::{validate_flashcards, validate_questions, Flashcard, Question};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// The OpenAI-backed implementation of [`LlmProvider`].
///
/// Holds a plain HTTP client and the configured key; the key is only
/// checked when a call is made, so the server starts fine without one
/// and AI endpoints fail fast with a missing-key error instead.
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionsPayload {
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct FlashcardsPayload {
    flashcards: Vec<Flashcard>,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    fn key(&self) -> Result<&str, LlmError> {
        self.api_key.as_deref().ok_or(LlmError::MissingApiKey)
    }

    /// One chat-completion round trip. `user_content` is either a plain
    /// string or, for vision, an array of content parts.
    #[instrument(skip(self, system, user_content), fields(model = %self.model, json_mode))]
    async fn chat(
        &self,
        system: &str,
        user_content: serde_json::Value,
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let key = self.key()?;

        let mut request = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user_content},
            ],
        });
        if json_mode {
            request["response_format"] = json!({"type": "json_object"});
        }

        debug!("Calling model API");

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Model API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("empty completion".to_string()))
    }

    /// Parses and validates a structured question payload.
    fn questions_from(content: &str) -> Result<Vec<Question>, LlmError> {
        let payload: QuestionsPayload = serde_json::from_str(content)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        validate_questions(&payload.questions).map_err(LlmError::MalformedResponse)?;
        Ok(payload.questions)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn generate_quiz(
        &self,
        content: &str,
        options: &QuizOptions,
    ) -> Result<Vec<Question>, LlmError> {
        let system = prompts::quiz_system(options.num_questions, options.difficulty.as_deref());
        let reply = self.chat(&system, json!(content), true).await?;
        Self::questions_from(&reply)
    }

    async fn generate_flashcards(
        &self,
        content: &str,
        options: &FlashcardOptions,
    ) -> Result<Vec<Flashcard>, LlmError> {
        let system = prompts::flashcard_system(options.num_cards, options.difficulty.as_deref());
        let reply = self.chat(&system, json!(content), true).await?;

        let payload: FlashcardsPayload = serde_json::from_str(&reply)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        validate_flashcards(&payload.flashcards).map_err(LlmError::MalformedResponse)?;
        Ok(payload.flashcards)
    }

    async fn parse_quiz(&self, raw: &str) -> Result<Vec<Question>, LlmError> {
        let reply = self.chat(prompts::IMPORT_QUIZ_SYSTEM, json!(raw), true).await?;
        Self::questions_from(&reply)
    }

    async fn reformat(&self, content: &str) -> Result<String, LlmError> {
        self.chat(prompts::REFORMAT_SYSTEM, json!(content), false).await
    }

    async fn summarize(&self, content: &str) -> Result<String, LlmError> {
        self.chat(prompts::SUMMARY_SYSTEM, json!(content), false).await
    }

    async fn ask(&self, content: &str, question: &str) -> Result<String, LlmError> {
        let user = format!("Course content:\n{content}\n\nQuestion: {question}");
        self.chat(prompts::ASK_SYSTEM, json!(user), false).await
    }

    async fn extract_image_text(&self, image: &[u8], mime: &str) -> Result<String, LlmError> {
        let data_url = format!("data:{mime};base64,{}", BASE64.encode(image));
        let user_content = json!([
            {"type": "text", "text": prompts::OCR_INSTRUCTIONS},
            {"type": "image_url", "image_url": {"url": data_url}},
        ]);
        self.chat(prompts::OCR_INSTRUCTIONS, user_content, false).await
    }
}
