use serde::Deserialize;
use thiserror::Error;

use crate::model::question::{Question, QuestionDraft, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid question {id} in category {category}: {source}")]
    InvalidQuestion {
        category: String,
        id: String,
        #[source]
        source: QuestionError,
    },
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// A named group of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    questions: Vec<Question>,
}

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            name: name.into(),
            questions,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

#[derive(Deserialize)]
struct BankDocument {
    categories: Vec<CategoryDocument>,
}

#[derive(Deserialize)]
struct CategoryDocument {
    name: String,
    #[serde(default)]
    questions: Vec<QuestionDraft>,
}

/// Static question bank, grouped by category. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    categories: Vec<Category>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Parse a bank document shaped `{ "categories": [{ "name", "questions" }] }`.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Malformed` for invalid JSON and
    /// `BankError::InvalidQuestion` when any question fails validation.
    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let document: BankDocument = serde_json::from_str(json)?;
        let mut categories = Vec::with_capacity(document.categories.len());

        for category in document.categories {
            let mut questions = Vec::with_capacity(category.questions.len());
            for draft in category.questions {
                let id = draft.id.to_string();
                let question = draft
                    .validate()
                    .map_err(|source| BankError::InvalidQuestion {
                        category: category.name.clone(),
                        id,
                        source,
                    })?;
                questions.push(question);
            }
            categories.push(Category::new(category.name, questions));
        }

        Ok(Self { categories })
    }

    /// Look up a category by its exact name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Names of all categories, in document order.
    #[must_use]
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(Category::name).collect()
    }

    /// Total number of questions across every category.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.categories.iter().map(Category::len).sum()
    }
}
