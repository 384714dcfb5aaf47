//! Per-user generation counts.

use std::time::Duration;

use database::{generation_count, Database, DatabaseError};
use plan_core::PlanCategory;
use tracing::{debug, warn};
use uuid::Uuid;

const BUSY_RETRIES: u32 = 3;
const BUSY_BACKOFF: Duration = Duration::from_millis(50);

/// Counts successful generations per (user, category).
#[derive(Debug, Clone)]
pub struct GenerationCounter {
    db: Database,
}

impl GenerationCounter {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Count the plan generated by `attempt_id` and return the new total.
    ///
    /// Counting the same attempt twice returns the current total unchanged.
    /// A locked database is retried a few times before giving up.
    pub async fn increment(
        &self,
        user_id: &str,
        category: PlanCategory,
        attempt_id: Uuid,
    ) -> Result<i64, DatabaseError> {
        let attempt = attempt_id.to_string();
        let mut tries = 0;

        loop {
            match generation_count::increment(self.db.pool(), user_id, category.as_str(), &attempt)
                .await
            {
                Ok(count) => {
                    debug!("{} count for {} is now {}", category, user_id, count);
                    return Ok(count);
                }
                Err(e) if e.is_busy() && tries < BUSY_RETRIES => {
                    tries += 1;
                    warn!(
                        "Database busy counting attempt {} (try {}/{})",
                        attempt_id, tries, BUSY_RETRIES
                    );
                    tokio::time::sleep(BUSY_BACKOFF * tries).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Current count, 0 when nothing was generated yet.
    pub async fn get(&self, user_id: &str, category: PlanCategory) -> Result<i64, DatabaseError> {
        generation_count::get(self.db.pool(), user_id, category.as_str()).await
    }

    /// Counts for every category, in [`PlanCategory::ALL`] order.
    pub async fn counts(&self, user_id: &str) -> Result<Vec<(PlanCategory, i64)>, DatabaseError> {
        let rows = generation_count::list_for_user(self.db.pool(), user_id).await?;

        Ok(PlanCategory::ALL
            .iter()
            .map(|category| {
                let count = rows
                    .iter()
                    .find(|row| row.category == category.as_str())
                    .map(|row| row.count)
                    .unwrap_or(0);
                (*category, count)
            })
            .collect())
    }
}
