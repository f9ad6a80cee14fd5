use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use tracker_core::model::{Goal, GoalId, NewGoal, NewProgress, Progress, ProgressId};

use super::PostgresRepository;
use crate::mapping::{db_err, goal_id_from_i64, i64_to_u32, progress_id_from_i64, ser};
use crate::repository::{GoalRepository, ProgressRepository, StorageError};

#[async_trait]
impl GoalRepository for PostgresRepository {
    async fn add_goal(&self, goal: &NewGoal) -> Result<GoalId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO goals (exercise, target, start_date, duration_days, completed)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id
            ",
        )
        .bind(goal.exercise.as_str())
        .bind(i64::from(goal.target))
        .bind(goal.start_date)
        .bind(i64::from(goal.duration_days))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        goal_id_from_i64(id)
    }

    async fn get_goal(&self, exercise: &str) -> Result<Option<Goal>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, exercise, target, start_date, duration_days, completed
            FROM goals
            WHERE exercise = $1
            ORDER BY completed ASC, id ASC
            LIMIT 1
            ",
        )
        .bind(exercise)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(goal_from_row).transpose()
    }

    async fn get_active_goals(&self) -> Result<Vec<Goal>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, exercise, target, start_date, duration_days, completed
            FROM goals
            WHERE NOT completed
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(goal_from_row).collect()
    }

    async fn mark_goal_complete(&self, exercise: &str) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query(
            r"
            UPDATE goals SET completed = TRUE
            WHERE id = (
                SELECT id FROM goals
                WHERE exercise = $1 AND NOT completed
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

#[async_trait]
impl ProgressRepository for PostgresRepository {
    async fn add_progress(&self, entry: &NewProgress) -> Result<ProgressId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO progress (exercise, date, quantity)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(entry.exercise.as_str())
        .bind(entry.date)
        .bind(i64::from(entry.quantity))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        progress_id_from_i64(id)
    }

    async fn get_progress(&self, exercise: &str) -> Result<Vec<Progress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, exercise, date, quantity
            FROM progress
            WHERE exercise = $1
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

fn goal_from_row(row: &PgRow) -> Result<Goal, StorageError> {
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

fn progress_from_row(row: &PgRow) -> Result<Progress, StorageError> {
    Progress::from_persisted(
        progress_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("exercise").map_err(ser)?,
        row.try_get("date").map_err(ser)?,
        i64_to_u32("quantity", row.try_get::<i64, _>("quantity").map_err(ser)?)?,
    )
    .map_err(ser)
}
