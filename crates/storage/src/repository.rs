use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{Lesson, LessonId, Profile, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for lesson content.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Persist or replace a lesson together with its questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Fetch a lesson by ID.
    ///
    /// Returns `Ok(None)` when no lesson has that ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or holds invalid lesson data.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// List lessons ordered by ID, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn list_lessons(&self, limit: u32) -> Result<Vec<Lesson>, StorageError>;
}

/// Repository contract for user profiles and their point balances.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Persist or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    /// Fetch a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, StorageError>;

    /// Atomically add `amount` points to a profile, returning the new balance.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile does not exist.
    async fn add_points(
        &self,
        user_id: UserId,
        amount: u32,
        at: DateTime<Utc>,
    ) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lessons: Arc<Mutex<HashMap<LessonId, Lesson>>>,
    profiles: Arc<Mutex<HashMap<UserId, Profile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lessons: Arc::new(Mutex::new(HashMap::new())),
            profiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(lesson.id(), lesson.clone());
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_lessons(&self, limit: u32) -> Result<Vec<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut lessons: Vec<Lesson> = guard.values().cloned().collect();
        lessons.sort_by_key(Lesson::id);
        lessons.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(lessons)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(profile.user_id(), profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, StorageError> {
        let guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&user_id).cloned())
    }

    async fn add_points(
        &self,
        user_id: UserId,
        amount: u32,
        at: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let current = guard.get(&user_id).ok_or(StorageError::NotFound)?;
        let points = current.points().saturating_add(u64::from(amount));
        let updated = Profile::new(user_id, current.display_name(), points, at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.insert(user_id, updated);
        Ok(points)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lessons: Arc<dyn LessonRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo);
        Self { lessons, profiles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Question;
    use quiz_core::time::fixed_now;

    fn build_lesson(id: u64) -> Lesson {
        let question = Question::new(
            "What is a budget?",
            vec!["A spending plan".to_string(), "A bank".to_string()],
            0,
        )
        .unwrap();
        Lesson::new(LessonId::new(id), format!("Lesson {id}"), "", 10, vec![question]).unwrap()
    }

    #[tokio::test]
    async fn lessons_round_trip_and_list_in_id_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_lesson(&build_lesson(2)).await.unwrap();
        repo.upsert_lesson(&build_lesson(1)).await.unwrap();

        let fetched = repo.get_lesson(LessonId::new(2)).await.unwrap().unwrap();
        assert_eq!(fetched, build_lesson(2));
        assert!(repo.get_lesson(LessonId::new(9)).await.unwrap().is_none());

        let listed = repo.list_lessons(10).await.unwrap();
        let ids: Vec<u64> = listed.iter().map(|l| l.id().value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(repo.list_lessons(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_points_accumulates_and_requires_profile() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(7);

        let err = repo.add_points(user, 5, fixed_now()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));

        let profile = Profile::new(user, "Ada", 10, fixed_now()).unwrap();
        repo.upsert_profile(&profile).await.unwrap();

        assert_eq!(repo.add_points(user, 5, fixed_now()).await.unwrap(), 15);
        assert_eq!(repo.add_points(user, 20, fixed_now()).await.unwrap(), 35);
        let stored = repo.get_profile(user).await.unwrap().unwrap();
        assert_eq!(stored.points(), 35);
        assert_eq!(stored.display_name(), "Ada");
    }

    #[tokio::test]
    async fn in_memory_storage_shares_one_backend() {
        let storage = Storage::in_memory();
        let user = UserId::new(2);
        storage
            .profiles
            .upsert_profile(&Profile::new(user, "Bo", 0, fixed_now()).unwrap())
            .await
            .unwrap();
        storage.lessons.upsert_lesson(&build_lesson(5)).await.unwrap();

        assert_eq!(storage.profiles.add_points(user, 10, fixed_now()).await.unwrap(), 10);
        let lessons = storage.lessons.list_lessons(10).await.unwrap();
        assert_eq!(lessons, vec![build_lesson(5)]);

        let copy = storage.clone();
        assert_eq!(
            copy.profiles.get_profile(user).await.unwrap().unwrap().points(),
            10
        );
    }
}
