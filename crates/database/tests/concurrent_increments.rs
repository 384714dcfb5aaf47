//! Concurrent counter updates against a file-backed database.

use database::{generation_count, Database};

async fn file_db(dir: &tempfile::TempDir) -> Database {
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("plans.db").display());
    let db = Database::connect_with_pool_size(&url, 8).await.unwrap();
    db.migrate().await.unwrap();
    db
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_raise_count_by_n() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;

    let n = 25;
    let mut tasks = Vec::new();
    for i in 0..n {
        let db = db.clone();
        tasks.push(tokio::spawn(async move {
            generation_count::increment(db.pool(), "user-1", "MEAL", &format!("attempt-{}", i)).await
        }));
    }

    let mut returned = Vec::new();
    for task in tasks {
        returned.push(task.await.unwrap().unwrap());
    }

    assert_eq!(generation_count::get(db.pool(), "user-1", "MEAL").await.unwrap(), n);

    // Every increment saw a distinct value.
    returned.sort_unstable();
    assert_eq!(returned, (1..=n).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_retries_of_one_attempt_count_once() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let db = db.clone();
        tasks.push(tokio::spawn(async move {
            generation_count::increment(db.pool(), "user-1", "WORKOUT", "same-attempt").await
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 1);
    }

    assert_eq!(generation_count::get(db.pool(), "user-1", "WORKOUT").await.unwrap(), 1);
}

#[tokio::test]
async fn test_counts_survive_reconnect() {
    let dir = tempfile::tempdir().unwrap();

    let db = file_db(&dir).await;
    generation_count::increment(db.pool(), "user-1", "REHAB", "a-1").await.unwrap();
    db.close().await;

    let db = file_db(&dir).await;
    assert_eq!(generation_count::get(db.pool(), "user-1", "REHAB").await.unwrap(), 1);
}
