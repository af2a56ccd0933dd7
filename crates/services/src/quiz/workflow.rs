use std::sync::Arc;

use quiz_core::model::{LessonId, QuizSettings};
use storage::repository::LessonRepository;

use super::engine::QuizEngine;
use super::reward::RewardCommitter;
use crate::error::QuizServiceError;
use crate::notify::Notifier;
use crate::profile::ProfileStore;

/// Result of looking up a lesson to quiz on.
#[derive(Debug)]
pub enum LessonLoad {
    Ready(QuizEngine),
    NotFound,
}

/// Loads lessons and hands out engines wired to the reward path.
#[derive(Clone)]
pub struct QuizService {
    settings: QuizSettings,
    lessons: Arc<dyn LessonRepository>,
    rewards: RewardCommitter,
}

impl QuizService {
    #[must_use]
    pub fn new(
        settings: QuizSettings,
        lessons: Arc<dyn LessonRepository>,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            lessons,
            rewards: RewardCommitter::new(profiles, notifier),
        }
    }

    #[must_use]
    pub fn settings(&self) -> QuizSettings {
        self.settings
    }

    /// Load a lesson and create an engine waiting on its start screen.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the lesson cannot be read.
    pub async fn load(&self, lesson_id: LessonId) -> Result<LessonLoad, QuizServiceError> {
        let lesson = match self.lessons.get_lesson(lesson_id).await {
            Ok(Some(lesson)) => lesson,
            Ok(None) => {
                tracing::info!(%lesson_id, "lesson not found");
                return Ok(LessonLoad::NotFound);
            }
            Err(err) => {
                tracing::warn!(%lesson_id, error = %err, "lesson load failed");
                return Err(err.into());
            }
        };

        tracing::debug!(%lesson_id, questions = lesson.len(), "lesson loaded");
        Ok(LessonLoad::Ready(QuizEngine::new(
            Arc::new(lesson),
            self.settings,
            self.rewards.clone(),
        )))
    }
}
