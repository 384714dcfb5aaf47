//! Per-user read endpoints.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use database::PaymentIntentRecord;
use orchestrator::PlanCategory;
use serde::Serialize;

use crate::error::Result;
use crate::routes::authorize;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: PlanCategory,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserCounts {
    pub user_id: String,
    pub counts: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
pub struct UserPayments {
    pub user_id: String,
    pub payments: Vec<PaymentIntentRecord>,
}

/// Generation counts for every category.
pub async fn counts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<UserCounts>> {
    authorize(&state, &headers)?;

    let counts = state
        .coordinator
        .counter()
        .counts(&user_id)
        .await?
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

    Ok(Json(UserCounts { user_id, counts }))
}

/// Payment intents of a user, newest first.
pub async fn payments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<UserPayments>> {
    authorize(&state, &headers)?;

    let payments = state.coordinator.ledger().list_for_user(&user_id).await?;
    Ok(Json(UserPayments { user_id, payments }))
}
