use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracker_core::model::{NewProgress, Progress, ProgressId};

use super::SqliteRepository;
use crate::mapping::{db_err, i64_to_u32, progress_id_from_i64, ser};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn add_progress(&self, entry: &NewProgress) -> Result<ProgressId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query(
            r"
            INSERT INTO progress (exercise, date, quantity)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(entry.exercise.as_str())
        .bind(entry.date)
        .bind(i64::from(entry.quantity))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        progress_id_from_i64(res.last_insert_rowid())
    }

    async fn get_progress(&self, exercise: &str) -> Result<Vec<Progress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, exercise, date, quantity
            FROM progress
            WHERE exercise = ?1
            ORDER BY id ASC
            ",
        )
        .bind(exercise)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(progress_from_row).collect()
    }
}

fn progress_from_row(row: &SqliteRow) -> Result<Progress, StorageError> {
    Progress::from_persisted(
        progress_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("exercise").map_err(ser)?,
        row.try_get("date").map_err(ser)?,
        i64_to_u32("quantity", row.try_get::<i64, _>("quantity").map_err(ser)?)?,
    )
    .map_err(ser)
}
