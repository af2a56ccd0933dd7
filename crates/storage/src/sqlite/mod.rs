use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{LessonRepository, ProfileRepository, Storage};

mod lesson_repo;
mod mapping;
mod migrate;
mod profile_repo;

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

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// enforcing foreign key constraints fails during setup.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
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
        let lesson_repo: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let profile_repo: Arc<dyn ProfileRepository> = Arc::new(repo);
        Ok(Self {
            lessons: lesson_repo,
            profiles: profile_repo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Lesson, LessonId, Question};

    #[tokio::test]
    async fn sqlite_storage_migrates_once_and_keeps_data() {
        let url = "sqlite:file:storage_reopen?mode=memory&cache=shared";
        let first = Storage::sqlite(url).await.unwrap();
        let question = Question::new(
            "Is a budget a plan?",
            vec!["yes".to_string(), "no".to_string()],
            0,
        )
        .unwrap();
        let lesson = Lesson::new(LessonId::new(1), "Budgeting", "", 10, vec![question]).unwrap();
        first.lessons.upsert_lesson(&lesson).await.unwrap();

        // Re-running migrations on a live schema must leave rows in place.
        let second = Storage::sqlite(url).await.unwrap();
        let stored = second.lessons.get_lesson(LessonId::new(1)).await.unwrap();
        assert_eq!(stored, Some(lesson));
        drop(first);
    }
}
