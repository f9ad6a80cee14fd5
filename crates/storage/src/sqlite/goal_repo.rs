use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracker_core::model::{Goal, GoalId, NewGoal};

use super::SqliteRepository;
use crate::mapping::{db_err, goal_id_from_i64, i64_to_u32, ser};
use crate::repository::{GoalRepository, StorageError};

const GOAL_COLUMNS: &str = "id, exercise, target, start_date, duration_days, completed";

#[async_trait]
impl GoalRepository for SqliteRepository {
    async fn add_goal(&self, goal: &NewGoal) -> Result<GoalId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query(
            r"
            INSERT INTO goals (exercise, target, start_date, duration_days, completed)
            VALUES (?1, ?2, ?3, ?4, 0)
            ",
        )
        .bind(goal.exercise.as_str())
        .bind(i64::from(goal.target))
        .bind(goal.start_date)
        .bind(i64::from(goal.duration_days))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        goal_id_from_i64(res.last_insert_rowid())
    }

    async fn get_goal(&self, exercise: &str) -> Result<Option<Goal>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE exercise = ?1 ORDER BY completed ASC, id ASC LIMIT 1"
        ))
        .bind(exercise)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(goal_from_row).transpose()
    }

    async fn get_active_goals(&self) -> Result<Vec<Goal>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE completed = 0 ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(goal_from_row).collect()
    }

    async fn mark_goal_complete(&self, exercise: &str) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query(
            r"
            UPDATE goals SET completed = 1
            WHERE id = (
                SELECT id FROM goals
                WHERE exercise = ?1 AND completed = 0
                ORDER BY id ASC
                LIMIT 1
            )
            ",
        )
        .bind(exercise)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

fn goal_from_row(row: &SqliteRow) -> Result<Goal, StorageError> {
    Goal::from_persisted(
        goal_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("exercise").map_err(ser)?,
        i64_to_u32("target", row.try_get::<i64, _>("target").map_err(ser)?)?,
        row.try_get("start_date").map_err(ser)?,
        i64_to_u32(
            "duration_days",
            row.try_get::<i64, _>("duration_days").map_err(ser)?,
        )?,
        row.try_get::<bool, _>("completed").map_err(ser)?,
    )
    .map_err(ser)
}
