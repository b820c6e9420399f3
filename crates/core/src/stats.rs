use std::collections::{BTreeMap, HashSet};

use crate::model::QuizResult;
use crate::scoring::percentage;

/// Estimated study minutes credited per answered question.
pub const STUDY_MINUTES_PER_QUESTION: u32 = 5;

/// Aggregated performance for one category across a user's history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPerformance {
    pub total_score: u32,
    pub total_questions: u32,
    pub attempts: u32,
}

impl CategoryPerformance {
    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.total_score, self.total_questions)
    }
}

/// Dashboard numbers derived from a user's quiz history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_quizzes: usize,
    pub average_score: u32,
    pub topics_covered: usize,
    pub study_minutes: u32,
    pub by_category: BTreeMap<String, CategoryPerformance>,
}

impl DashboardStats {
    /// Fold a history list into dashboard stats.
    #[must_use]
    pub fn from_history(history: &[QuizResult]) -> Self {
        let mut total_score = 0_u32;
        let mut total_questions = 0_u32;
        let mut categories = HashSet::new();
        let mut by_category: BTreeMap<String, CategoryPerformance> = BTreeMap::new();

        for result in history {
            total_score = total_score.saturating_add(result.score());
            total_questions = total_questions.saturating_add(result.total());
            categories.insert(result.category());

            let perf = by_category.entry(result.category().to_owned()).or_default();
            perf.total_score = perf.total_score.saturating_add(result.score());
            perf.total_questions = perf.total_questions.saturating_add(result.total());
            perf.attempts = perf.attempts.saturating_add(1);
        }

        Self {
            total_quizzes: history.len(),
            average_score: percentage(total_score, total_questions),
            topics_covered: categories.len(),
            study_minutes: total_questions.saturating_mul(STUDY_MINUTES_PER_QUESTION),
            by_category,
        }
    }

    /// Study time rendered as `"{h}h {m}m"`, or `"{m}m"` under an hour.
    #[must_use]
    pub fn study_time(&self) -> String {
        let hours = self.study_minutes / 60;
        let minutes = self.study_minutes % 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }
}
