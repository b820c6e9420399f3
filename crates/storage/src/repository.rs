use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ktet_core::model::{QuestionId, QuizResult, SeenQuestions, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted quiz result together with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizHistoryRow {
    pub id: i64,
    pub result: QuizResult,
}

/// Repository contract for a user's quiz history.
#[async_trait]
pub trait QuizHistoryRepository: Send + Sync {
    /// Append a finished quiz result for `user`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, user: &UserId, result: &QuizResult) -> Result<i64, StorageError>;

    /// List the most recent results for `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_results(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<QuizHistoryRow>, StorageError>;
}

/// Repository contract for the per-user seen-question sets.
#[async_trait]
pub trait SeenQuestionsRepository: Send + Sync {
    /// Ids `user` has completed in `category`. Unknown users and categories are empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn get_seen(&self, user: &UserId, category: &str)
    -> Result<Vec<QuestionId>, StorageError>;

    /// Union `ids` into the user's seen set for `category`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the update cannot be stored.
    async fn mark_seen(
        &self,
        user: &UserId,
        category: &str,
        ids: &[QuestionId],
        seen_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Clear the seen set for one category, returning how many ids were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn reset_category(&self, user: &UserId, category: &str) -> Result<u64, StorageError>;

    /// Load every category's seen set for `user`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn load_seen(&self, user: &UserId) -> Result<SeenQuestions, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    history: Arc<Mutex<Vec<(i64, UserId, QuizResult)>>>,
    seen: Arc<Mutex<HashMap<UserId, SeenQuestions>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuizHistoryRepository for InMemoryRepository {
    async fn append_result(&self, user: &UserId, result: &QuizResult) -> Result<i64, StorageError> {
        let mut guard = self.history.lock().map_err(poisoned)?;
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("history id overflow".into()))?
            + 1;
        guard.push((id, user.clone(), result.clone()));
        Ok(id)
    }

    async fn list_results(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<QuizHistoryRow>, StorageError> {
        let guard = self.history.lock().map_err(poisoned)?;
        let mut rows: Vec<QuizHistoryRow> = guard
            .iter()
            .filter(|(_, owner, _)| owner == user)
            .map(|(id, _, result)| QuizHistoryRow {
                id: *id,
                result: result.clone(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

#[async_trait]
impl SeenQuestionsRepository for InMemoryRepository {
    async fn get_seen(
        &self,
        user: &UserId,
        category: &str,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let guard = self.seen.lock().map_err(poisoned)?;
        let mut ids: Vec<QuestionId> = guard
            .get(user)
            .map(|seen| seen.ids_for(category).into_iter().collect())
            .unwrap_or_default();
        ids.sort();
        Ok(ids)
    }

    async fn mark_seen(
        &self,
        user: &UserId,
        category: &str,
        ids: &[QuestionId],
        _seen_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.seen.lock().map_err(poisoned)?;
        guard
            .entry(user.clone())
            .or_default()
            .mark_seen(category, ids.iter().cloned());
        Ok(())
    }

    async fn reset_category(&self, user: &UserId, category: &str) -> Result<u64, StorageError> {
        let mut guard = self.seen.lock().map_err(poisoned)?;
        let removed = guard
            .get_mut(user)
            .map_or(0, |seen| seen.reset_category(category));
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn load_seen(&self, user: &UserId) -> Result<SeenQuestions, StorageError> {
        let guard = self.seen.lock().map_err(poisoned)?;
        Ok(guard.get(user).cloned().unwrap_or_default())
    }
}

/// Aggregates the history and seen-question repositories behind trait objects
/// for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn QuizHistoryRepository>,
    pub seen: Arc<dyn SeenQuestionsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let history: Arc<dyn QuizHistoryRepository> = Arc::new(repo.clone());
        let seen: Arc<dyn SeenQuestionsRepository> = Arc::new(repo);
        Self { history, seen }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ktet_core::time::fixed_now;

    fn user(id: &str) -> UserId {
        UserId::new(id)
    }

    fn ids(raw: &[u64]) -> Vec<QuestionId> {
        raw.iter().copied().map(QuestionId::from).collect()
    }

    #[tokio::test]
    async fn history_lists_newest_first_per_user() {
        let repo = InMemoryRepository::new();
        let alice = user("alice");
        let bob = user("bob");

        let older = QuizResult::new(5, 15, "Science", fixed_now()).unwrap();
        let newer =
            QuizResult::new(10, 15, "English", fixed_now() + Duration::minutes(5)).unwrap();
        repo.append_result(&alice, &older).await.unwrap();
        repo.append_result(&bob, &older).await.unwrap();
        repo.append_result(&alice, &newer).await.unwrap();

        let rows = repo.list_results(&alice, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].result.category(), "English");
        assert_eq!(rows[1].result.category(), "Science");

        let limited = repo.list_results(&alice, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn seen_sets_grow_and_reset() {
        let repo = InMemoryRepository::new();
        let alice = user("alice");

        repo.mark_seen(&alice, "Mathematics", &ids(&[1, 2]), fixed_now())
            .await
            .unwrap();
        repo.mark_seen(&alice, "Mathematics", &ids(&[2, 3]), fixed_now())
            .await
            .unwrap();
        assert_eq!(
            repo.get_seen(&alice, "Mathematics").await.unwrap(),
            ids(&[1, 2, 3])
        );
        assert!(repo.get_seen(&user("bob"), "Mathematics").await.unwrap().is_empty());

        assert_eq!(repo.reset_category(&alice, "Mathematics").await.unwrap(), 3);
        assert!(repo.get_seen(&alice, "Mathematics").await.unwrap().is_empty());
    }
}
