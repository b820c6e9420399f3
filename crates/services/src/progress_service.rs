use std::sync::Arc;

use ktet_core::model::UserId;
use ktet_core::stats::DashboardStats;
use storage::repository::{QuizHistoryRepository, QuizHistoryRow, SeenQuestionsRepository};

use crate::error::ProgressError;

/// Upper bound on history rows folded into the dashboard.
pub const DASHBOARD_HISTORY_LIMIT: u32 = 10_000;

/// A category the user has practiced, with how many of its questions were seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenCategory {
    pub category: String,
    pub seen_count: usize,
}

/// Read side of a user's progress: dashboard, history and seen-question resets.
#[derive(Clone)]
pub struct ProgressService {
    history: Arc<dyn QuizHistoryRepository>,
    seen: Arc<dyn SeenQuestionsRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        history: Arc<dyn QuizHistoryRepository>,
        seen: Arc<dyn SeenQuestionsRepository>,
    ) -> Self {
        Self { history, seen }
    }

    /// Aggregate the user's whole history into dashboard numbers.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the history cannot be read.
    pub async fn dashboard(&self, user: &UserId) -> Result<DashboardStats, ProgressError> {
        let rows = self
            .history
            .list_results(user, DASHBOARD_HISTORY_LIMIT)
            .await?;
        let results: Vec<_> = rows.into_iter().map(|row| row.result).collect();
        Ok(DashboardStats::from_history(&results))
    }

    /// Most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the history cannot be read.
    pub async fn history(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<QuizHistoryRow>, ProgressError> {
        Ok(self.history.list_results(user, limit).await?)
    }

    /// Forget which questions of `category` the user has seen.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the reset cannot be stored.
    pub async fn reset_category(&self, user: &UserId, category: &str) -> Result<u64, ProgressError> {
        let removed = self.seen.reset_category(user, category).await?;
        tracing::info!("reset {removed} seen questions in {category} for {user}");
        Ok(removed)
    }

    /// Categories with at least one seen question, in name order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the seen sets cannot be read.
    pub async fn resettable_categories(
        &self,
        user: &UserId,
    ) -> Result<Vec<SeenCategory>, ProgressError> {
        let seen = self.seen.load_seen(user).await?;
        Ok(seen
            .categories_with_progress()
            .into_iter()
            .map(|category| SeenCategory {
                category: category.to_owned(),
                seen_count: seen.count_for(category),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktet_core::model::{QuestionId, QuizResult};
    use ktet_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn user() -> UserId {
        UserId::new("learner-1")
    }

    async fn seeded() -> (ProgressService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        for (score, total, category) in [(3, 5, "Mathematics"), (12, 15, "Science"), (9, 15, "Mathematics")] {
            let result = QuizResult::new(score, total, category, fixed_now()).unwrap();
            repo.append_result(&user(), &result).await.unwrap();
        }
        let ids: Vec<QuestionId> = (0..4).map(QuestionId::from).collect();
        repo.mark_seen(&user(), "Science", &ids, fixed_now()).await.unwrap();

        let service = ProgressService::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        (service, repo)
    }

    #[tokio::test]
    async fn dashboard_aggregates_history() {
        let (service, _) = seeded().await;
        let stats = service.dashboard(&user()).await.unwrap();

        assert_eq!(stats.total_quizzes, 3);
        assert_eq!(stats.topics_covered, 2);
        // 24 of 35
        assert_eq!(stats.average_score, 69);
        assert_eq!(stats.study_time(), "2h 55m");
        assert_eq!(stats.by_category["Mathematics"].attempts, 2);
    }

    #[tokio::test]
    async fn unknown_user_has_empty_dashboard() {
        let (service, _) = seeded().await;
        let stats = service.dashboard(&UserId::new("nobody")).await.unwrap();
        assert_eq!(stats, DashboardStats::default());
    }

    #[tokio::test]
    async fn reset_clears_only_that_category() {
        let (service, repo) = seeded().await;
        repo.mark_seen(&user(), "English", &[QuestionId::from(1)], fixed_now())
            .await
            .unwrap();

        let categories = service.resettable_categories(&user()).await.unwrap();
        assert_eq!(
            categories,
            vec![
                SeenCategory { category: "English".into(), seen_count: 1 },
                SeenCategory { category: "Science".into(), seen_count: 4 },
            ]
        );

        assert_eq!(service.reset_category(&user(), "Science").await.unwrap(), 4);
        let categories = service.resettable_categories(&user()).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category, "English");
    }
}
