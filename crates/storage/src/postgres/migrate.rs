use sqlx::PgPool;
use tracing::info;

use super::PostgresInitError;

/// Same schema versions as the SQLite backend, in PostgreSQL dialect.
pub async fn run_migrations(pool: &PgPool) -> Result<(), PostgresInitError> {
    async fn is_applied(pool: &PgPool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = $1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version BIGINT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS goals (
                    id BIGSERIAL PRIMARY KEY,
                    exercise TEXT NOT NULL,
                    target BIGINT NOT NULL CHECK (target > 0),
                    start_date DATE NOT NULL,
                    duration_days BIGINT NOT NULL CHECK (duration_days > 0),
                    completed BOOLEAN NOT NULL DEFAULT FALSE
                )
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress (
                    id BIGSERIAL PRIMARY KEY,
                    exercise TEXT NOT NULL,
                    date DATE NOT NULL,
                    quantity BIGINT NOT NULL CHECK (quantity >= 0)
                )
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_goals_exercise ON goals (exercise)")
            .execute(&mut *tx)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_progress_exercise ON progress (exercise, id)")
            .execute(&mut *tx)
            .await?;

        record_version(&mut tx, 1).await?;
        tx.commit().await?;
        info!(version = 1, "applied postgres migration");
    }

    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_goals_active_exercise
                    ON goals (exercise) WHERE NOT completed
            ",
        )
        .execute(&mut *tx)
        .await?;

        record_version(&mut tx, 2).await?;
        tx.commit().await?;
        info!(version = 2, "applied postgres migration");
    }

    Ok(())
}

async fn record_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    version: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
            INSERT INTO schema_migrations (version)
            VALUES ($1)
            ON CONFLICT (version) DO NOTHING
        ",
    )
    .bind(version)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
