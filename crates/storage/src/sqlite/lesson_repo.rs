use quiz_core::model::{Lesson, LessonId, Question};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::SqliteRepository;
use super::mapping::{
    encode_choices, lesson_id_from_i64, lesson_id_to_i64, map_question_row, ser,
};
use crate::repository::{LessonRepository, StorageError};

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let id = lesson_id_to_i64(lesson.id())?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO lessons (id, name, description, points)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                points = excluded.points
            ",
        )
        .bind(id)
        .bind(lesson.name())
        .bind(lesson.description())
        .bind(i64::from(lesson.points()))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Question order is part of the lesson, so the whole list is replaced.
        sqlx::query("DELETE FROM lesson_questions WHERE lesson_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, question) in lesson.questions().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO lesson_questions (lesson_id, position, statement, choices, answer_index)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(id)
            .bind(
                i64::try_from(position)
                    .map_err(|_| StorageError::Serialization("position overflow".into()))?,
            )
            .bind(question.statement())
            .bind(encode_choices(question.choices())?)
            .bind(
                i64::try_from(question.answer_index())
                    .map_err(|_| StorageError::Serialization("answer_index overflow".into()))?,
            )
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, description, points
            FROM lessons WHERE id = ?1
            ",
        )
        .bind(lesson_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => lesson_from_row(&self.pool, &row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_lessons(&self, limit: u32) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, points
            FROM lessons
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            lessons.push(lesson_from_row(&self.pool, &row).await?);
        }
        Ok(lessons)
    }
}

async fn load_questions(pool: &SqlitePool, lesson_id: i64) -> Result<Vec<Question>, StorageError> {
    let rows = sqlx::query(
        r"
        SELECT statement, choices, answer_index
        FROM lesson_questions
        WHERE lesson_id = ?1
        ORDER BY position ASC
        ",
    )
    .bind(lesson_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    rows.iter().map(map_question_row).collect()
}

async fn lesson_from_row(pool: &SqlitePool, row: &SqliteRow) -> Result<Lesson, StorageError> {
    let raw_id: i64 = row.try_get("id").map_err(ser)?;
    let questions = load_questions(pool, raw_id).await?;
    let points = u32::try_from(row.try_get::<i64, _>("points").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("points overflow".into()))?;

    Lesson::new(
        lesson_id_from_i64(raw_id)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        points,
        questions,
    )
    .map_err(ser)
}
