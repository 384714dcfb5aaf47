//! Per-user, per-category generation counters.

use sqlx::SqlitePool;

use crate::models::GenerationCount;
use crate::Result;

/// Count one successful generation for `attempt_id` and return the new count.
///
/// The attempt id is recorded in the same transaction, so repeating a call
/// for an attempt that was already counted returns the current count
/// without incrementing it.
pub async fn increment(
    pool: &SqlitePool,
    user_id: &str,
    category: &str,
    attempt_id: &str,
) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let recorded = sqlx::query(
        r#"
        INSERT INTO generation_attempts (attempt_id, user_id, category)
        VALUES (?, ?, ?)
        ON CONFLICT(attempt_id) DO NOTHING
        "#,
    )
    .bind(attempt_id)
    .bind(user_id)
    .bind(category)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let count = if recorded == 0 {
        tracing::debug!("Attempt {} already counted, not incrementing", attempt_id);

        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT count
            FROM generation_counts
            WHERE user_id = ? AND category = ?
            "#,
        )
        .bind(user_id)
        .bind(category)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(0)
    } else {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO generation_counts (user_id, category, count)
            VALUES (?, ?, 1)
            ON CONFLICT(user_id, category) DO UPDATE SET
                count = count + 1,
                updated_at = datetime('now')
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(category)
        .fetch_one(&mut *tx)
        .await?
    };

    tx.commit().await?;

    Ok(count)
}

/// Current count for (user, category); 0 when nothing was generated yet.
pub async fn get(pool: &SqlitePool, user_id: &str, category: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT count
        FROM generation_counts
        WHERE user_id = ? AND category = ?
        "#,
    )
    .bind(user_id)
    .bind(category)
    .fetch_optional(pool)
    .await?;

    Ok(count.unwrap_or(0))
}

/// Get the counter row for (user, category), if one exists.
pub async fn find(
    pool: &SqlitePool,
    user_id: &str,
    category: &str,
) -> Result<Option<GenerationCount>> {
    let record = sqlx::query_as::<_, GenerationCount>(
        r#"
        SELECT user_id, category, count, updated_at
        FROM generation_counts
        WHERE user_id = ? AND category = ?
        "#,
    )
    .bind(user_id)
    .bind(category)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// All counter rows for a user.
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<GenerationCount>> {
    let records = sqlx::query_as::<_, GenerationCount>(
        r#"
        SELECT user_id, category, count, updated_at
        FROM generation_counts
        WHERE user_id = ?
        ORDER BY category
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}
