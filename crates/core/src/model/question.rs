use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyPrompt,

    #[error("expected {OPTION_COUNT} options, found {found}")]
    WrongOptionCount { found: usize },

    #[error("correct index {index} is out of range")]
    CorrectIndexOutOfRange { index: usize },
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Question exactly as it appears in a bank document or a generated batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, the option count is
    /// not four, or the correct index does not point at an option.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.question.trim();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let found = self.options.len();
        let options: [String; OPTION_COUNT] = self
            .options
            .try_into()
            .map_err(|_| QuestionError::WrongOptionCount { found })?;

        if self.correct_index >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
            });
        }

        Ok(Question {
            id: self.id,
            prompt: prompt.to_owned(),
            options,
            correct_index: self.correct_index,
            explanation: self.explanation.trim().to_owned(),
        })
    }
}

/// A multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    explanation: String,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// Returns the option text at `index`, if any.
    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::from(1),
            question: "  2 + 2 = ?  ".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "22".into()],
            correct_index: 1,
            explanation: "Basic addition.".into(),
        }
    }

    #[test]
    fn valid_draft_trims_prompt() {
        let question = draft().validate().unwrap();
        assert_eq!(question.prompt(), "2 + 2 = ?");
        assert_eq!(question.correct_option(), "4");
        assert!(question.is_correct(1));
        assert!(!question.is_correct(0));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let mut d = draft();
        d.question = "   ".into();
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyPrompt);
    }

    #[test]
    fn three_options_are_rejected() {
        let mut d = draft();
        d.options.pop();
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::WrongOptionCount { found: 3 }
        );
    }

    #[test]
    fn correct_index_must_point_at_an_option() {
        let mut d = draft();
        d.correct_index = 4;
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::CorrectIndexOutOfRange { index: 4 }
        );
    }

    #[test]
    fn parses_bank_shape() {
        let json = r#"{
            "id": 12,
            "question": "Who proposed the theory of multiple intelligences?",
            "options": ["Piaget", "Gardner", "Bruner", "Vygotsky"],
            "correctIndex": 1,
            "explanation": "Howard Gardner, 1983."
        }"#;
        let question: Question = serde_json::from_str::<QuestionDraft>(json)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(question.id().as_str(), "12");
        assert_eq!(question.option(3), Some("Vygotsky"));
        assert_eq!(question.option(4), None);
    }

    #[test]
    fn explanation_is_optional() {
        let json = r#"{"id":"a","question":"Q","options":["1","2","3","4"],"correctIndex":0}"#;
        let question = serde_json::from_str::<QuestionDraft>(json)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(question.explanation(), "");
    }
}
