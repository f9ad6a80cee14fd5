use chrono::NaiveDate;
use storage::config::{BackendKind, DatabaseUrl};
use storage::repository::{GoalRepository, ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;
use tracker_core::calculate_progress;
use tracker_core::model::{NewGoal, NewProgress};

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

async fn fresh_repo(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!(
        "sqlite:file:{name}?mode=memory&cache=shared"
    ))
    .await
    .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_goal_lifecycle() {
    let repo = fresh_repo("memdb_goal_lifecycle").await;

    let goal = NewGoal::new("Push-ups", 100, jan(1), 30).unwrap();
    let id = repo.add_goal(&goal).await.unwrap();

    let active = repo.get_active_goals().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id(), id);
    assert_eq!(active[0].start_date(), jan(1));
    assert_eq!(active[0].duration_days(), 30);
    assert!(!active[0].is_completed());

    repo.add_progress(&NewProgress::new("Push-ups", jan(2), 40).unwrap())
        .await
        .unwrap();
    repo.add_progress(&NewProgress::new("Push-ups", jan(2), 70).unwrap())
        .await
        .unwrap();

    let entries = repo.get_progress("Push-ups").await.unwrap();
    let total: u64 = entries.iter().map(|p| u64::from(p.quantity())).sum();
    assert_eq!(total, 110);
    assert!((calculate_progress(total, 100) - 100.0).abs() < f64::EPSILON);

    assert!(repo.mark_goal_complete("Push-ups").await.unwrap());
    assert!(repo.get_active_goals().await.unwrap().is_empty());

    let stored = repo.get_goal("Push-ups").await.unwrap().expect("goal");
    assert!(stored.is_completed());
}

#[tokio::test]
async fn sqlite_missing_records_are_empty() {
    let repo = fresh_repo("memdb_missing").await;

    assert!(repo.get_goal("Burpees").await.unwrap().is_none());
    assert!(repo.get_progress("Burpees").await.unwrap().is_empty());
    assert!(!repo.mark_goal_complete("Burpees").await.unwrap());
}

#[tokio::test]
async fn sqlite_rejects_second_active_goal_and_keeps_first() {
    let repo = fresh_repo("memdb_conflict").await;

    let first = repo
        .add_goal(&NewGoal::new("Squats", 50, jan(1), 7).unwrap())
        .await
        .unwrap();
    let err = repo
        .add_goal(&NewGoal::new("Squats", 500, jan(5), 60).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let active = repo.get_active_goals().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id(), first);
    assert_eq!(active[0].target(), 50);

    repo.mark_goal_complete("Squats").await.unwrap();
    let second = repo
        .add_goal(&NewGoal::new("Squats", 500, jan(8), 60).unwrap())
        .await
        .unwrap();
    let current = repo.get_goal("Squats").await.unwrap().unwrap();
    assert_eq!(current.id(), second);
    assert!(current.is_active());
}

#[tokio::test]
async fn sqlite_progress_without_goal_is_stored() {
    let repo = fresh_repo("memdb_orphan_progress").await;

    repo.add_progress(&NewProgress::new("Plank", jan(3), 0).unwrap())
        .await
        .unwrap();
    let entries = repo.get_progress("Plank").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].quantity(), 0);
    assert_eq!(entries[0].date(), jan(3));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = fresh_repo("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn storage_connect_picks_sqlite_backend() {
    let url = DatabaseUrl::parse("sqlite:file:memdb_connect?mode=memory&cache=shared").unwrap();
    let storage = Storage::connect(&url).await.expect("connect");
    assert_eq!(storage.backend(), BackendKind::Sqlite);

    storage
        .goals
        .add_goal(&NewGoal::new("Lunges", 20, jan(1), 10).unwrap())
        .await
        .unwrap();
    storage.goals.save_data().await.unwrap();
    assert_eq!(storage.goals.get_active_goals().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_reports_connection_failure_on_closed_pool() {
    let repo = fresh_repo("memdb_closed_pool").await;
    repo.pool().close().await;

    let err = repo
        .add_goal(&NewGoal::new("Dips", 10, jan(1), 5).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Connection(_)));
}
