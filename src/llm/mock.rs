use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FlashcardOptions, LlmError, LlmProvider, QuizOptions};
use crate::models::{Flashcard, Question};

/// Test double for the model gateway.
///
/// Returns canned payloads, records every call, and can be switched
/// into a failing mode to exercise the 500 path. Lives outside
/// `#[cfg(test)]` so the integration suites can use it too.
#[allow(dead_code)]
pub struct MockLlm {
    questions: Mutex<Vec<Question>>,
    flashcards: Mutex<Vec<Flashcard>>,
    text_reply: Mutex<String>,
    fail: Mutex<bool>,
    /// Call log: method name plus a short argument summary
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self {
            questions: Mutex::new(sample_questions()),
            flashcards: Mutex::new(default_flashcards()),
            text_reply: Mutex::new("mock reply".to_string()),
            fail: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

/// Two well-formed questions, enough for a submittable quiz. Also used
/// directly by repository tests that need a valid question set.
pub fn sample_questions() -> Vec<Question> {
    let options = BTreeMap::from([
        ("A".to_string(), "Option A".to_string()),
        ("B".to_string(), "Option B".to_string()),
        ("C".to_string(), "Option C".to_string()),
        ("D".to_string(), "Option D".to_string()),
    ]);
    vec![
        Question {
            question: "Première question ?".to_string(),
            options: options.clone(),
            correct_answer: "A".to_string(),
            explanation: "Parce que A.".to_string(),
            difficulty: "moyen".to_string(),
            topic: Some("général".to_string()),
        },
        Question {
            question: "Deuxième question ?".to_string(),
            options,
            correct_answer: "C".to_string(),
            explanation: "Parce que C.".to_string(),
            difficulty: "moyen".to_string(),
            topic: None,
        },
    ]
}

fn default_flashcards() -> Vec<Flashcard> {
    vec![
        Flashcard {
            front: "Recto 1".to_string(),
            back: "Verso 1".to_string(),
            category: Some("général".to_string()),
            difficulty: "moyen".to_string(),
        },
        Flashcard {
            front: "Recto 2".to_string(),
            back: "Verso 2".to_string(),
            category: None,
            difficulty: "moyen".to_string(),
        },
    ]
}

#[allow(dead_code)]
impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the canned question set.
    pub fn set_questions(&self, questions: Vec<Question>) {
        *self.questions.lock().unwrap() = questions;
    }

    /// Replaces the canned text reply (reformat/summarize/ask/OCR).
    pub fn set_text_reply(&self, reply: &str) {
        *self.text_reply.lock().unwrap() = reply.to_string();
    }

    /// Makes every subsequent call fail like an API outage.
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) -> Result<(), LlmError> {
        self.calls.lock().unwrap().push(call);
        if *self.fail.lock().unwrap() {
            return Err(LlmError::Api {
                status: 500,
                message: "mock outage".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn generate_quiz(
        &self,
        content: &str,
        options: &QuizOptions,
    ) -> Result<Vec<Question>, LlmError> {
        self.record(format!(
            "generate_quiz n={} content_len={}",
            options.num_questions,
            content.len()
        ))?;
        Ok(self.questions.lock().unwrap().clone())
    }

    async fn generate_flashcards(
        &self,
        content: &str,
        options: &FlashcardOptions,
    ) -> Result<Vec<Flashcard>, LlmError> {
        self.record(format!(
            "generate_flashcards n={} content_len={}",
            options.num_cards,
            content.len()
        ))?;
        Ok(self.flashcards.lock().unwrap().clone())
    }

    async fn parse_quiz(&self, raw: &str) -> Result<Vec<Question>, LlmError> {
        self.record(format!("parse_quiz content_len={}", raw.len()))?;
        Ok(self.questions.lock().unwrap().clone())
    }

    async fn reformat(&self, content: &str) -> Result<String, LlmError> {
        self.record(format!("reformat content_len={}", content.len()))?;
        Ok(self.text_reply.lock().unwrap().clone())
    }

    async fn summarize(&self, content: &str) -> Result<String, LlmError> {
        self.record(format!("summarize content_len={}", content.len()))?;
        Ok(self.text_reply.lock().unwrap().clone())
    }

    async fn ask(&self, content: &str, question: &str) -> Result<String, LlmError> {
        self.record(format!(
            "ask content_len={} question={question}",
            content.len()
        ))?;
        Ok(self.text_reply.lock().unwrap().clone())
    }

    async fn extract_image_text(&self, image: &[u8], mime: &str) -> Result<String, LlmError> {
        self.record(format!("extract_image_text mime={mime} bytes={}", image.len()))?;
        Ok(self.text_reply.lock().unwrap().clone())
    }
}
