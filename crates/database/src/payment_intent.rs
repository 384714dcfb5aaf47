//! Payment intent ledger.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewPaymentIntent, PaymentIntentRecord};

/// Status string of an intent whose payment was confirmed.
pub const STATUS_CONFIRMED: &str = "CONFIRMED";

/// Status string of an intent still waiting for payment.
pub const STATUS_PENDING: &str = "PENDING";

/// Record a newly created payment intent.
pub async fn insert(pool: &SqlitePool, intent: &NewPaymentIntent<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payment_intents (
            id, external_id, provider, user_id, category, description,
            amount_cents, status, checkout_reference, attempt_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(intent.id)
    .bind(intent.external_id)
    .bind(intent.provider)
    .bind(intent.user_id)
    .bind(intent.category)
    .bind(intent.description)
    .bind(intent.amount_cents)
    .bind(intent.status)
    .bind(intent.checkout_reference)
    .bind(intent.attempt_id)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "PaymentIntent",
                    id: format!("{}:{}", intent.provider, intent.external_id),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a payment intent by local id.
pub async fn get(pool: &SqlitePool, id: &str) -> Result<PaymentIntentRecord> {
    sqlx::query_as::<_, PaymentIntentRecord>(
        r#"
        SELECT id, external_id, provider, user_id, category, description, amount_cents,
               status, checkout_reference, attempt_id, consumed_by, created_at, updated_at
        FROM payment_intents
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "PaymentIntent",
        id: id.to_string(),
    })
}

/// Store the last known status of an intent.
pub async fn update_status(pool: &SqlitePool, id: &str, status: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE payment_intents
        SET status = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "PaymentIntent",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Oldest confirmed intent for (user, category) that no attempt has used yet.
pub async fn find_unconsumed_confirmed(
    pool: &SqlitePool,
    user_id: &str,
    category: &str,
) -> Result<Option<PaymentIntentRecord>> {
    let record = sqlx::query_as::<_, PaymentIntentRecord>(
        r#"
        SELECT id, external_id, provider, user_id, category, description, amount_cents,
               status, checkout_reference, attempt_id, consumed_by, created_at, updated_at
        FROM payment_intents
        WHERE user_id = ? AND category = ? AND status = ? AND consumed_by IS NULL
        ORDER BY created_at, rowid
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(category)
    .bind(STATUS_CONFIRMED)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Unconsumed intents for (user, category) last seen pending, oldest first.
pub async fn list_unconsumed_pending(
    pool: &SqlitePool,
    user_id: &str,
    category: &str,
) -> Result<Vec<PaymentIntentRecord>> {
    let records = sqlx::query_as::<_, PaymentIntentRecord>(
        r#"
        SELECT id, external_id, provider, user_id, category, description, amount_cents,
               status, checkout_reference, attempt_id, consumed_by, created_at, updated_at
        FROM payment_intents
        WHERE user_id = ? AND category = ? AND status = ? AND consumed_by IS NULL
        ORDER BY created_at, rowid
        "#,
    )
    .bind(user_id)
    .bind(category)
    .bind(STATUS_PENDING)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Mark an intent as used by `attempt_id`.
///
/// Marking it again for the same attempt is a no-op. Fails with
/// [`DatabaseError::AlreadyConsumed`] if another attempt used it first.
pub async fn mark_consumed(pool: &SqlitePool, id: &str, attempt_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE payment_intents
        SET consumed_by = ?, updated_at = datetime('now')
        WHERE id = ? AND consumed_by IS NULL
        "#,
    )
    .bind(attempt_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let existing = get(pool, id).await?;
    match existing.consumed_by {
        Some(ref by) if by == attempt_id => Ok(()),
        Some(by) => Err(DatabaseError::AlreadyConsumed {
            id: id.to_string(),
            attempt_id: by,
        }),
        None => Err(DatabaseError::NotFound {
            entity: "PaymentIntent",
            id: id.to_string(),
        }),
    }
}

/// All intents for a user, newest first.
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<PaymentIntentRecord>> {
    let records = sqlx::query_as::<_, PaymentIntentRecord>(
        r#"
        SELECT id, external_id, provider, user_id, category, description, amount_cents,
               status, checkout_reference, attempt_id, consumed_by, created_at, updated_at
        FROM payment_intents
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}
