pub use super::routes::{health, todos};

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::application::todo_service::TodoService;

pub fn app<S: TodoService + Clone + Send + Sync + 'static>(state: todos::AppState<S>) -> Router {
    Router::new()
        .merge(health::router(state.clone()))
        .merge(todos::router(state))
        .layer(TraceLayer::new_for_http())
}
