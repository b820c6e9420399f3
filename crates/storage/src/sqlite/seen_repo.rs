use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ktet_core::model::{QuestionId, SeenQuestions, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_question_id, ser};
use crate::repository::{SeenQuestionsRepository, StorageError};

#[async_trait]
impl SeenQuestionsRepository for SqliteRepository {
    async fn get_seen(
        &self,
        user: &UserId,
        category: &str,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id
                FROM seen_questions
                WHERE user_id = ?1 AND category = ?2
                ORDER BY question_id
            ",
        )
        .bind(user.as_str())
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_id).collect()
    }

    async fn mark_seen(
        &self,
        user: &UserId,
        category: &str,
        ids: &[QuestionId],
        seen_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(conn)?;
        for id in ids {
            sqlx::query(
                r"
                    INSERT INTO seen_questions (user_id, category, question_id, seen_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(user_id, category, question_id) DO NOTHING
                ",
            )
            .bind(user.as_str())
            .bind(category)
            .bind(id.as_str())
            .bind(seen_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn reset_category(&self, user: &UserId, category: &str) -> Result<u64, StorageError> {
        let res = sqlx::query(
            r"
                DELETE FROM seen_questions
                WHERE user_id = ?1 AND category = ?2
            ",
        )
        .bind(user.as_str())
        .bind(category)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected())
    }

    async fn load_seen(&self, user: &UserId) -> Result<SeenQuestions, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT category, question_id
                FROM seen_questions
                WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut seen = SeenQuestions::new();
        for row in &rows {
            let category: String = row.try_get("category").map_err(ser)?;
            let id = map_question_id(row)?;
            seen.mark_seen(&category, [id]);
        }
        Ok(seen)
    }
}
