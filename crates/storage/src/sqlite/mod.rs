use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{QuizHistoryRepository, SeenQuestionsRepository, Storage};

mod history_repo;
mod mapping;
mod migrate;
mod seen_repo;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Pool size for file-backed databases.
const FILE_POOL_SIZE: u32 = 5;

/// A private in-memory database lives and dies with its connection, so the
/// pool must hold exactly one and never recycle it.
fn is_private_memory(database_url: &str) -> bool {
    let url = database_url.trim();
    url == "sqlite::memory:"
        || url == "sqlite://:memory:"
        || (url.contains(":memory:") && !url.contains("cache=shared"))
        || (url.contains("mode=memory") && !url.contains("cache=shared"))
}

impl SqliteRepository {
    /// Open a pool for `database_url` with WAL journaling and a busy timeout.
    ///
    /// Private in-memory URLs such as `sqlite::memory:` get a single pinned
    /// connection so every query sees the same database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// the connection pragmas fail during setup.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let mut options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
        options = if is_private_memory(database_url) {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(FILE_POOL_SIZE)
        };

        let pool = options
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        tracing::debug!("opened sqlite pool for {database_url}");
        Ok(Self { pool })
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let history: Arc<dyn QuizHistoryRepository> = Arc::new(repo.clone());
        let seen: Arc<dyn SeenQuestionsRepository> = Arc::new(repo);
        Ok(Self { history, seen })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_memory_urls_are_detected() {
        assert!(is_private_memory("sqlite::memory:"));
        assert!(is_private_memory("sqlite://:memory:"));
        assert!(is_private_memory("sqlite:file:scratch?mode=memory"));
        assert!(!is_private_memory("sqlite:file:scratch?mode=memory&cache=shared"));
        assert!(!is_private_memory("sqlite:///tmp/ktet.sqlite3"));
    }

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }
}
