//! Plan generation endpoints.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::{GenerationOptions, GenerationRequest, PlanCategory, PlanEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::routes::authorize;
use crate::state::AppState;

/// Body of `POST /v1/plans`.
#[derive(Debug, Deserialize)]
pub struct CreatePlan {
    pub user_id: String,
    pub category: PlanCategory,
    #[serde(default)]
    pub preferences: Value,
    #[serde(default)]
    pub use_fallback: bool,
    #[serde(default)]
    pub retry: bool,
    /// Answer with a server-sent event stream instead of a single JSON body.
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct Cancelled {
    pub attempt_id: Uuid,
    pub cancelled: bool,
}

/// Start a plan generation attempt.
///
/// Without `stream` the response is sent when the attempt ends. Closing the
/// connection early cancels the attempt either way.
pub async fn create_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreatePlan>,
) -> Result<Response> {
    authorize(&state, &headers)?;

    let session = state.session(&body.user_id);
    let request = GenerationRequest::new(body.user_id, body.category, body.preferences);
    let options = GenerationOptions {
        use_fallback: body.use_fallback,
        retry: body.retry,
    };

    let mut handle = state.coordinator.start(session, request, options);
    let attempt_id = handle.attempt_id();
    let tracked = state.track(attempt_id, handle.cancellation_token());
    info!("Plan attempt {} accepted (stream: {})", attempt_id, body.stream);

    if !body.stream {
        let outcome = handle.outcome().await?;
        drop(tracked);
        return Ok(Json(outcome).into_response());
    }

    let events = handle
        .take_events()
        .ok_or_else(|| ApiError::Internal("event stream already taken".to_string()))?;

    // The stream owns a cancel-on-drop guard, so a client that goes away
    // cancels the attempt.
    let cancel_on_disconnect = handle.cancellation_token().drop_guard();
    tokio::spawn(async move {
        let result = handle.outcome().await;
        debug!("Streamed attempt {} ended: ok={}", attempt_id, result.is_ok());
        drop(tracked);
    });

    let stream = UnboundedReceiverStream::new(events).map(move |event: PlanEvent| {
        let _ = &cancel_on_disconnect;
        Ok::<_, Infallible>(sse_event(&event))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()).into_response())
}

fn sse_event(event: &PlanEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event.name()).data(data)
}

/// Cancel a running attempt.
pub async fn cancel_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(attempt_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Cancelled>)> {
    authorize(&state, &headers)?;

    if !state.cancel(attempt_id) {
        return Err(ApiError::AttemptNotFound(attempt_id));
    }

    info!("Plan attempt {} cancelled by request", attempt_id);
    Ok((
        StatusCode::ACCEPTED,
        Json(Cancelled {
            attempt_id,
            cancelled: true,
        }),
    ))
}
