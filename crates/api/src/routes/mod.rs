//! Route handlers.

pub mod plans;
pub mod users;

use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/plans", post(plans::create_plan))
        .route("/v1/plans/:attempt_id", delete(plans::cancel_plan))
        .route("/v1/users/:user_id/counts", get(users::counts))
        .route("/v1/users/:user_id/payments", get(users::payments))
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Check the bearer token when one is configured.
pub(crate) fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(());
    };

    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value));

    match token {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use database::Database;
    use mock_providers::{ScriptedCompletion, ScriptedGateway};
    use orchestrator::{CoordinatorConfig, PlanGenerationCoordinator, PricingConfig};
    use plan_brain::AiGenerationClient;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PLAN: &str = r#"{"sessions": [{"day": "monday", "exercises": ["squat"]}]}"#;

    async fn app(api_token: Option<&str>) -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let coordinator = PlanGenerationCoordinator::new(
            Arc::new(ScriptedGateway::never_confirms()),
            AiGenerationClient::new(Arc::new(ScriptedCompletion::replying("primary", PLAN))),
            db,
            CoordinatorConfig::default().with_pricing(PricingConfig::free()),
        );

        router().with_state(AppState::new(coordinator, api_token.map(str::to_string)))
    }

    fn post_plan(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/plans")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None).await.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_token_is_required_when_configured() {
        let app = app(Some("secret")).await;

        let response = app
            .clone()
            .oneshot(get("/v1/users/user-1/counts"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["type"], "auth_error");

        let request = Request::builder()
            .uri("/v1/users/user-1/counts")
            .header("authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Health stays open.
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_plan_then_read_counts() {
        let app = app(None).await;

        let response = app
            .clone()
            .oneshot(post_plan(json!({
                "user_id": "user-1",
                "category": "WORKOUT",
                "preferences": {"level": "beginner"}
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["generation_count"], 1);
        assert_eq!(body["plan"]["category"], "WORKOUT");
        assert!(body["plan"]["content"]["sessions"].is_array());

        // Same user, same session, no retry flag.
        let response = app
            .clone()
            .oneshot(post_plan(json!({"user_id": "user-1", "category": "WORKOUT"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"]["code"], "ALREADY_ATTEMPTED");

        let response = app
            .clone()
            .oneshot(post_plan(json!({
                "user_id": "user-1",
                "category": "WORKOUT",
                "retry": true
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["generation_count"], 2);

        let response = app.oneshot(get("/v1/users/user-1/counts")).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(
            body["counts"],
            json!([
                {"category": "MEAL", "count": 0},
                {"category": "WORKOUT", "count": 2},
                {"category": "REHAB", "count": 0},
            ])
        );
    }

    #[tokio::test]
    async fn test_invalid_request_is_bad_request() {
        let response = app(None)
            .await
            .oneshot(post_plan(json!({
                "user_id": "user-1",
                "category": "MEAL",
                "preferences": "vegan"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION");
    }

    #[tokio::test]
    async fn test_streamed_plan_ends_with_completion() {
        let response = app(None)
            .await
            .oneshot(post_plan(json!({
                "user_id": "user-2",
                "category": "MEAL",
                "stream": true
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("event: state"));
        assert!(text.contains("event: phase"));
        assert!(text.contains("event: completed"));
        assert!(text.find("GUARD_CHECK").unwrap() < text.find("event: completed").unwrap());
    }

    #[tokio::test]
    async fn test_cancel_unknown_attempt() {
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/v1/plans/{}", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let response = app(None).await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payments_listing() {
        let response = app(None)
            .await
            .oneshot(get("/v1/users/user-1/payments"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["user_id"], "user-1");
        assert_eq!(body["payments"], json!([]));
    }
}
