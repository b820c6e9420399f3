use std::time::Duration;

use ktet_core::model::{Question, QuestionDraft};
use serde::Deserialize;

use super::client::{ChatClient, ChatMessage, strip_code_fences};
use crate::error::AiError;

/// Pseudo-category holding the syllabus document; it has no quiz questions.
pub const SYLLABUS_TOPIC: &str = "KTET Syllabus";

const GENERATION_TIMEOUT: Duration = Duration::from_secs(9);

const SYSTEM_PROMPT: &str =
    "You only reply with raw, valid JSON. Never add prose or markdown around it.";

/// Generates fresh multiple-choice questions for a topic.
#[derive(Clone)]
pub struct QuestionGenerator {
    client: ChatClient,
}

impl QuestionGenerator {
    #[must_use]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Request `count` questions on `topic` within `subject`.
    ///
    /// The request is abandoned after nine seconds and never retried.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidTopic` for the syllabus pseudo-topic,
    /// `AiError::Timeout` when the model is too slow, and
    /// `AiError::InvalidFormat` when the reply is not a valid question list.
    pub async fn generate(
        &self,
        topic: &str,
        count: usize,
        subject: &str,
    ) -> Result<Vec<Question>, AiError> {
        let topic = topic.trim();
        if topic.is_empty() || topic == SYLLABUS_TOPIC {
            return Err(AiError::InvalidTopic(topic.to_owned()));
        }

        tracing::info!("generating {count} questions for {topic:?}");
        let raw = self
            .client
            .complete(
                vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(generation_prompt(topic, count, subject)),
                ],
                None,
                Some(GENERATION_TIMEOUT),
            )
            .await?;

        let questions = parse_generated(&raw).inspect_err(|err| {
            tracing::warn!("could not parse generated questions: {err}");
        })?;
        tracing::info!("generated {} questions for {topic:?}", questions.len());
        Ok(questions)
    }
}

fn generation_prompt(topic: &str, count: usize, subject: &str) -> String {
    format!(
        r#"Write exactly {count} multiple-choice questions for the Kerala Teacher Eligibility Test (KTET).

Topic: <topic>{topic}</topic>. Do not drift to any other topic.
Subject context: <subject>{subject}</subject>.

Respond with one JSON object of the form {{ "questions": [ ... ] }}.
Every question must have exactly these keys:
"id" (unique number), "question" (string), "options" (array of exactly 4 strings),
"correctIndex" (number 0 to 3) and "explanation" (string explaining the answer)."#
    )
}

#[derive(Debug, Deserialize)]
struct GeneratedPayload {
    questions: Vec<QuestionDraft>,
}

/// Parse a model reply into validated questions.
///
/// # Errors
///
/// Returns `AiError::InvalidFormat` if the JSON is malformed, the list is
/// empty, or any question fails validation.
pub fn parse_generated(raw: &str) -> Result<Vec<Question>, AiError> {
    let payload: GeneratedPayload = serde_json::from_str(strip_code_fences(raw))
        .map_err(|err| AiError::InvalidFormat(err.to_string()))?;
    if payload.questions.is_empty() {
        return Err(AiError::InvalidFormat("no questions in reply".into()));
    }

    payload
        .questions
        .into_iter()
        .map(|draft| {
            let id = draft.id.clone();
            draft
                .validate()
                .map_err(|err| AiError::InvalidFormat(format!("question {id}: {err}")))
        })
        .collect()
}
