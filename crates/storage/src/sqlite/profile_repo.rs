use chrono::{DateTime, Utc};
use quiz_core::model::{Profile, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{map_profile_row, ser, u64_to_i64, user_id_to_i64};
use crate::repository::{ProfileRepository, StorageError};

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, display_name, points, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                display_name = excluded.display_name,
                points = excluded.points,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id_to_i64(profile.user_id())?)
        .bind(profile.display_name())
        .bind(u64_to_i64("points", profile.points())?)
        .bind(profile.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, display_name, points, updated_at
            FROM profiles WHERE user_id = ?1
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_profile_row).transpose()
    }

    async fn add_points(
        &self,
        user_id: UserId,
        amount: u32,
        at: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let row = sqlx::query(
            r"
            UPDATE profiles
            SET points = points + ?2,
                updated_at = ?3
            WHERE user_id = ?1
            RETURNING points
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(i64::from(amount))
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        let points: i64 = row.try_get("points").map_err(ser)?;
        u64::try_from(points).map_err(|_| StorageError::Serialization("points sign overflow".into()))
    }
}
