use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::compute_result;

/// Category label under which full exam sessions are reported.
pub const EXAM_CATEGORY_LABEL: &str = "Exam Day Experience";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("category cannot be empty")]
    EmptyCategory,
}

/// How a session was assembled and timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    /// One category, size-capped, filtered by seen questions.
    Standard,
    /// Fixed multi-subject composition with exam timers.
    Exam,
}

/// Final result of a quiz session, derived once when the session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    score: u32,
    total: u32,
    category: String,
    percentage: u32,
    passed: bool,
    completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Build a result, deriving percentage and pass/fail from the score.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if `score > total` or the category is blank.
    pub fn new(
        score: u32,
        total: u32,
        category: impl Into<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        if score > total {
            return Err(QuizResultError::ScoreExceedsTotal { score, total });
        }
        let category = category.into();
        if category.trim().is_empty() {
            return Err(QuizResultError::EmptyCategory);
        }
        let grade = compute_result(score, total);
        Ok(Self {
            score,
            total,
            category,
            percentage: grade.percentage,
            passed: grade.passed,
            completed_at,
        })
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// The stored percentage is kept as written; pass/fail is derived from it.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if the stored values are inconsistent.
    pub fn from_persisted(
        score: u32,
        total: u32,
        category: impl Into<String>,
        percentage: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        let mut result = Self::new(score, total, category, completed_at)?;
        result.percentage = percentage.min(100);
        result.passed = result.percentage >= crate::scoring::PASS_MARK;
        Ok(result)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
