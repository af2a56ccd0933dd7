use quiz_core::model::{LessonId, Profile, Question, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn lesson_id_to_i64(id: LessonId) -> Result<i64, StorageError> {
    u64_to_i64("lesson_id", id.value())
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn user_id_to_i64(id: UserId) -> Result<i64, StorageError> {
    u64_to_i64("user_id", id.value())
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn encode_choices(choices: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(choices).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let choices: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("choices").map_err(ser)?).map_err(ser)?;
    let answer_index = usize::try_from(row.try_get::<i64, _>("answer_index").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("answer_index sign overflow".into()))?;

    Question::new(
        row.try_get::<String, _>("statement").map_err(ser)?,
        choices,
        answer_index,
    )
    .map_err(ser)
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<Profile, StorageError> {
    Profile::new(
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        row.try_get::<String, _>("display_name").map_err(ser)?,
        i64_to_u64("points", row.try_get("points").map_err(ser)?)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}
