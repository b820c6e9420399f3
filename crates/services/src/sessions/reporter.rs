use std::sync::Arc;

use ktet_core::Clock;
use ktet_core::model::{QuizMode, QuizResult, UserId};
use storage::repository::{QuizHistoryRepository, SeenQuestionsRepository};
use tokio::task::JoinHandle;

use super::service::SessionOutcome;
use crate::error::PersistenceError;

/// What the background persistence task managed to store.
#[derive(Debug, Default)]
pub struct PersistenceReport {
    pub saved_result_id: Option<i64>,
    pub seen_updated: bool,
    pub errors: Vec<PersistenceError>,
}

impl PersistenceReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Handle to a spawned persistence task.
///
/// Dropping it does not cancel the task; callers that do not care about the
/// outcome can simply let it go.
#[derive(Debug)]
pub struct PersistenceHandle {
    inner: JoinHandle<PersistenceReport>,
}

impl PersistenceHandle {
    /// Wait for the task and collect its report.
    pub async fn wait(self) -> PersistenceReport {
        match self.inner.await {
            Ok(report) => report,
            Err(err) => PersistenceReport {
                errors: vec![PersistenceError::Task(err.to_string())],
                ..PersistenceReport::default()
            },
        }
    }
}

/// Persists a finished session's result and seen questions in the background.
#[derive(Clone)]
pub struct ResultReporter {
    clock: Clock,
    history: Arc<dyn QuizHistoryRepository>,
    seen: Arc<dyn SeenQuestionsRepository>,
}

impl ResultReporter {
    #[must_use]
    pub fn new(
        clock: Clock,
        history: Arc<dyn QuizHistoryRepository>,
        seen: Arc<dyn SeenQuestionsRepository>,
    ) -> Self {
        Self {
            clock,
            history,
            seen,
        }
    }

    /// Spawn persistence for `outcome` on the current tokio runtime.
    ///
    /// Returns `None` for anonymous users; nothing is stored for them. The
    /// result append and the seen-set update are attempted independently, and
    /// failures are logged rather than surfaced to the session.
    #[must_use]
    pub fn report(&self, outcome: SessionOutcome, user: Option<UserId>) -> Option<PersistenceHandle> {
        let Some(user) = user else {
            tracing::debug!("anonymous session finished; skipping persistence");
            return None;
        };

        let reporter = self.clone();
        let inner = tokio::spawn(async move { reporter.persist(&user, outcome).await });
        Some(PersistenceHandle { inner })
    }

    async fn persist(&self, user: &UserId, outcome: SessionOutcome) -> PersistenceReport {
        let mut report = PersistenceReport::default();

        match QuizResult::new(
            outcome.score,
            outcome.total,
            &outcome.category,
            self.clock.now(),
        ) {
            Ok(result) => match self.history.append_result(user, &result).await {
                Ok(id) => report.saved_result_id = Some(id),
                Err(err) => {
                    tracing::warn!("failed to save quiz result for {user}: {err}");
                    report.errors.push(PersistenceError::SaveResult(err));
                }
            },
            Err(err) => {
                tracing::warn!("refusing to save invalid quiz result: {err}");
                report.errors.push(PersistenceError::InvalidResult(err));
            }
        }

        // exam questions never count as practiced
        if outcome.mode == QuizMode::Standard {
            match self
                .seen
                .mark_seen(
                    user,
                    &outcome.category,
                    &outcome.question_ids,
                    self.clock.now(),
                )
                .await
            {
                Ok(()) => report.seen_updated = true,
                Err(err) => {
                    tracing::warn!(
                        "failed to update seen questions for {user} in {}: {err}",
                        outcome.category
                    );
                    report.errors.push(PersistenceError::UpdateSeen(err));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use ktet_core::model::{QuestionId, SeenQuestions};
    use ktet_core::scoring::compute_result;
    use ktet_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    use crate::sessions::FinishReason;

    struct FailingHistory;

    #[async_trait]
    impl QuizHistoryRepository for FailingHistory {
        async fn append_result(&self, _: &UserId, _: &QuizResult) -> Result<i64, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn list_results(
            &self,
            _: &UserId,
            _: u32,
        ) -> Result<Vec<storage::repository::QuizHistoryRow>, StorageError> {
            Ok(Vec::new())
        }
    }

    struct FailingSeen;

    #[async_trait]
    impl SeenQuestionsRepository for FailingSeen {
        async fn get_seen(&self, _: &UserId, _: &str) -> Result<Vec<QuestionId>, StorageError> {
            Ok(Vec::new())
        }

        async fn mark_seen(
            &self,
            _: &UserId,
            _: &str,
            _: &[QuestionId],
            _: DateTime<Utc>,
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn reset_category(&self, _: &UserId, _: &str) -> Result<u64, StorageError> {
            Ok(0)
        }

        async fn load_seen(&self, _: &UserId) -> Result<SeenQuestions, StorageError> {
            Ok(SeenQuestions::new())
        }
    }

    fn outcome(mode: QuizMode, score: u32, total: u32) -> SessionOutcome {
        SessionOutcome {
            mode,
            category: "Science".into(),
            score,
            total,
            grade: compute_result(score, total),
            question_ids: (0..u64::from(total)).map(QuestionId::from).collect(),
            reason: FinishReason::Completed,
        }
    }

    fn user() -> UserId {
        "learner-1".parse().unwrap()
    }

    #[tokio::test]
    async fn standard_outcome_saves_result_and_seen() {
        let repo = Arc::new(InMemoryRepository::new());
        let reporter = ResultReporter::new(Clock::fixed(fixed_now()), repo.clone(), repo.clone());

        let report = reporter
            .report(outcome(QuizMode::Standard, 3, 5), Some(user()))
            .unwrap()
            .wait()
            .await;

        assert!(report.is_clean());
        assert_eq!(report.saved_result_id, Some(1));
        assert!(report.seen_updated);

        let rows = repo.list_results(&user(), 10).await.unwrap();
        assert_eq!(rows[0].result.percentage(), 60);
        assert_eq!(rows[0].result.completed_at(), fixed_now());
        assert_eq!(repo.get_seen(&user(), "Science").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn exam_outcome_skips_seen_update() {
        let repo = Arc::new(InMemoryRepository::new());
        let reporter = ResultReporter::new(Clock::fixed(fixed_now()), repo.clone(), repo.clone());

        let report = reporter
            .report(outcome(QuizMode::Exam, 100, 150), Some(user()))
            .unwrap()
            .wait()
            .await;

        assert!(report.saved_result_id.is_some());
        assert!(!report.seen_updated);
        assert!(repo.load_seen(&user()).await.unwrap().categories_with_progress().is_empty());
    }

    #[tokio::test]
    async fn anonymous_sessions_are_not_persisted() {
        let repo = Arc::new(InMemoryRepository::new());
        let reporter = ResultReporter::new(Clock::default(), repo.clone(), repo);
        assert!(reporter.report(outcome(QuizMode::Standard, 1, 1), None).is_none());
    }

    #[tokio::test]
    async fn failed_history_write_still_updates_seen() {
        let repo = Arc::new(InMemoryRepository::new());
        let reporter = ResultReporter::new(Clock::default(), Arc::new(FailingHistory), repo.clone());

        let report = reporter
            .report(outcome(QuizMode::Standard, 2, 4), Some(user()))
            .unwrap()
            .wait()
            .await;

        assert_eq!(report.saved_result_id, None);
        assert!(report.seen_updated);
        assert!(matches!(report.errors[..], [PersistenceError::SaveResult(_)]));
    }

    #[tokio::test]
    async fn failed_seen_write_keeps_saved_result() {
        let repo = Arc::new(InMemoryRepository::new());
        let reporter = ResultReporter::new(Clock::default(), repo.clone(), Arc::new(FailingSeen));

        let report = reporter
            .report(outcome(QuizMode::Standard, 2, 4), Some(user()))
            .unwrap()
            .wait()
            .await;

        assert_eq!(report.saved_result_id, Some(1));
        assert!(!report.seen_updated);
        assert!(matches!(report.errors[..], [PersistenceError::UpdateSeen(_)]));
    }
}
