use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};

use super::todos::AppState;
use crate::application::todo_service::TodoService;
use crate::http::types::JsonBody;

pub const HEALTH_URL: &str = "/health";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new().route(HEALTH_URL, get(health::<S>)).with_state(state)
}

/// 200 when the store answers PING within the round-trip timeout, 503 otherwise.
async fn health<S: TodoService>(State(state): State<AppState<S>>) -> JsonBody<HealthBody> {
    match state.service.health().await {
        Ok(()) => JsonBody(StatusCode::OK, HealthBody { status: "healthy".into(), error: None }),
        Err(e) => JsonBody(StatusCode::SERVICE_UNAVAILABLE, HealthBody { status: "unhealthy".into(), error: Some(e.to_string()) }),
    }
}
