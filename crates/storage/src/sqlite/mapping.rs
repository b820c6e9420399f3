use ktet_core::model::{QuestionId, QuizResult};
use sqlx::Row;

use crate::repository::{QuizHistoryRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_history_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizHistoryRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let percentage = u32_from_i64(
        "percentage",
        row.try_get::<i64, _>("percentage").map_err(ser)?,
    )?;
    let category: String = row.try_get("category").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    let result = QuizResult::from_persisted(score, total, category, percentage, completed_at)
        .map_err(ser)?;
    Ok(QuizHistoryRow { id, result })
}

pub(crate) fn map_question_id(row: &sqlx::sqlite::SqliteRow) -> Result<QuestionId, StorageError> {
    let raw: String = row.try_get("question_id").map_err(ser)?;
    Ok(QuestionId::new(raw))
}
