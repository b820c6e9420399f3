use async_trait::async_trait;
use ktet_core::model::{QuizResult, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_history_row};
use crate::repository::{QuizHistoryRepository, QuizHistoryRow, StorageError};

#[async_trait]
impl QuizHistoryRepository for SqliteRepository {
    async fn append_result(&self, user: &UserId, result: &QuizResult) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_history (
                    user_id, category, score, total_questions, percentage, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user.as_str())
        .bind(result.category())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total()))
        .bind(i64::from(result.percentage()))
        .bind(result.completed_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_results(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<QuizHistoryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, category, score, total_questions, percentage, completed_at
                FROM quiz_history
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_history_row).collect()
    }
}
