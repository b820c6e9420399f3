use std::collections::HashSet;

use ktet_core::model::Question;

use super::client::{ChatClient, ChatMessage, strip_code_fences};
use crate::error::AiError;

/// Shown in place of an explanation whenever the AI tutor is unavailable.
pub const FALLBACK_EXPLANATION: &str = "The Guru is meditating and cannot answer right now.";

const EXPLANATION_TEMPERATURE: f32 = 0.3;

/// A wrong answer the learner wants explained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationRequest {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
}

impl ExplanationRequest {
    /// Build a request for `selected` on `question`.
    ///
    /// Returns `None` when the selection is out of range or already correct.
    #[must_use]
    pub fn for_answer(question: &Question, selected: usize) -> Option<Self> {
        if question.is_correct(selected) {
            return None;
        }
        Some(Self {
            question: question.prompt().to_owned(),
            user_answer: question.option(selected)?.to_owned(),
            correct_answer: question.correct_option().to_owned(),
        })
    }

    fn prompt(&self) -> String {
        format!(
            r#"You are a patient teacher helping a candidate prepare for the Kerala Teacher Eligibility Test.

Question: "{question}"
Student's answer (marked wrong): "{user}"
Answer key says: "{correct}"

First check whether the answer key is right. If it is wrong, say so gently and teach the true answer.
Otherwise explain why the student's answer is wrong, starting from the basic concept behind the question.
Finish with a short memory trick.

Reply with a small HTML fragment using only <div>, <p>, <strong>, <em>, <ul>, <ol> and <li>."#,
            question = self.question,
            user = self.user_answer,
            correct = self.correct_answer,
        )
    }
}

/// On-demand explanations for wrong answers.
#[derive(Clone)]
pub struct ExplanationService {
    client: ChatClient,
}

impl ExplanationService {
    #[must_use]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.client.enabled()
    }

    /// Ask the model for an explanation and return it as sanitized HTML.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when the service is disabled, the request fails, or
    /// the reply is empty.
    pub async fn explain(&self, request: &ExplanationRequest) -> Result<String, AiError> {
        let raw = self
            .client
            .complete(
                vec![ChatMessage::user(request.prompt())],
                Some(EXPLANATION_TEMPERATURE),
                None,
            )
            .await?;
        let html = sanitize_explanation(strip_code_fences(&raw));
        if html.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(html)
    }

    /// Like `explain`, but any failure becomes `FALLBACK_EXPLANATION`.
    pub async fn explain_or_fallback(&self, request: &ExplanationRequest) -> String {
        match self.explain(request).await {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!("explanation request failed: {err}");
                FALLBACK_EXPLANATION.to_owned()
            }
        }
    }
}

/// Keep basic formatting and styling classes; drop scripts, handlers and links.
#[must_use]
pub fn sanitize_explanation(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "div", "span", "br", "em", "strong", "b", "i", "code", "ul", "ol", "li",
    ]
    .into_iter()
    .collect();
    let generic: HashSet<&str> = ["class"].into_iter().collect();

    ammonia::Builder::new()
        .tags(tags)
        .generic_attributes(generic)
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktet_core::model::{QuestionDraft, QuestionId};

    fn question() -> Question {
        QuestionDraft {
            id: QuestionId::from(7),
            question: "Who proposed the theory of multiple intelligences?".into(),
            options: vec![
                "Piaget".into(),
                "Gardner".into(),
                "Vygotsky".into(),
                "Bruner".into(),
            ],
            correct_index: 1,
            explanation: String::new(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn request_carries_both_answers() {
        let request = ExplanationRequest::for_answer(&question(), 0).unwrap();
        assert_eq!(request.user_answer, "Piaget");
        assert_eq!(request.correct_answer, "Gardner");
        assert!(request.prompt().contains("multiple intelligences"));
    }

    #[test]
    fn no_request_for_correct_or_invalid_answers() {
        assert!(ExplanationRequest::for_answer(&question(), 1).is_none());
        assert!(ExplanationRequest::for_answer(&question(), 9).is_none());
    }

    #[test]
    fn sanitizer_drops_scripts_and_handlers() {
        let html = r#"<div class="tip" onclick="steal()"><p>Keep <strong>this</strong></p><script>alert(1)</script><a href="https://x">link</a></div>"#;
        let clean = sanitize_explanation(html);
        assert!(clean.contains(r#"<div class="tip">"#));
        assert!(clean.contains("<strong>this</strong>"));
        assert!(!clean.contains("script"));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("href"));
    }

    #[tokio::test]
    async fn disabled_service_falls_back() {
        let service = ExplanationService::new(ChatClient::new(None));
        let request = ExplanationRequest::for_answer(&question(), 2).unwrap();
        assert_eq!(
            service.explain_or_fallback(&request).await,
            FALLBACK_EXPLANATION
        );
    }
}
