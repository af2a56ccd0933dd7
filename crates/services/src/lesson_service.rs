use std::sync::Arc;

use quiz_core::model::{Lesson, LessonDraft, LessonId};
use storage::repository::LessonRepository;

use crate::error::LessonServiceError;

/// Lesson catalogue operations: lookup, listing and JSON import.
#[derive(Clone)]
pub struct LessonService {
    lessons: Arc<dyn LessonRepository>,
}

impl LessonService {
    #[must_use]
    pub fn new(lessons: Arc<dyn LessonRepository>) -> Self {
        Self { lessons }
    }

    /// Fetch a lesson by ID.
    ///
    /// Returns `Ok(None)` when the lesson does not exist.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, LessonServiceError> {
        Ok(self.lessons.get_lesson(id).await?)
    }

    /// List lessons ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn list_lessons(&self, limit: u32) -> Result<Vec<Lesson>, LessonServiceError> {
        Ok(self.lessons.list_lessons(limit).await?)
    }

    /// Parse a lesson from JSON (`{"id", "name", "description", "points", "questions": [{"statement", "choices", "answerIndex"}]}`),
    /// validate it and store it, replacing any lesson with the same ID.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Parse` for malformed JSON,
    /// `LessonServiceError::Lesson` for invalid lesson data,
    /// and `LessonServiceError::Storage` if persistence fails.
    pub async fn import_json(&self, json: &str) -> Result<LessonId, LessonServiceError> {
        let draft: LessonDraft = serde_json::from_str(json)?;
        let lesson = draft.validate()?;
        self.lessons.upsert_lesson(&lesson).await?;
        tracing::info!(lesson_id = %lesson.id(), questions = lesson.len(), "imported lesson");
        Ok(lesson.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    const LESSON_JSON: &str = r#"{
        "id": 4,
        "name": "Credit Scores",
        "description": "What moves your score",
        "points": 20,
        "questions": [
            { "statement": "Paying on time...", "choices": ["helps", "hurts"], "answerIndex": 0 },
            { "statement": "Maxing out cards...", "choices": ["helps", "hurts"], "answerIndex": 1 }
        ]
    }"#;

    #[tokio::test]
    async fn import_json_stores_validated_lesson() {
        let service = LessonService::new(Arc::new(InMemoryRepository::new()));

        let id = service.import_json(LESSON_JSON).await.unwrap();
        assert_eq!(id, LessonId::new(4));

        let lesson = service.get_lesson(id).await.unwrap().unwrap();
        assert_eq!(lesson.name(), "Credit Scores");
        assert_eq!(lesson.points(), 20);
        assert_eq!(lesson.questions()[1].answer_index(), 1);
        assert_eq!(service.list_lessons(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn import_json_rejects_bad_answer_index() {
        let service = LessonService::new(Arc::new(InMemoryRepository::new()));
        let json = LESSON_JSON.replace(r#""answerIndex": 1"#, r#""answerIndex": 7"#);

        let err = service.import_json(&json).await.unwrap_err();
        assert!(matches!(err, LessonServiceError::Lesson(_)));
        assert!(service.get_lesson(LessonId::new(4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn import_json_rejects_malformed_input() {
        let service = LessonService::new(Arc::new(InMemoryRepository::new()));
        let err = service.import_json("{ not json").await.unwrap_err();
        assert!(matches!(err, LessonServiceError::Parse(_)));
    }
}
