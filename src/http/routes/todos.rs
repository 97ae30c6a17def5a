use axum::body::Bytes;
use axum::extract::{OriginalUri, Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::{routing::get, Router};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::application::todo_service::TodoService;
use crate::domain::{codec, todo::ItemId};
use crate::http::types::{ApiError, JsonBody};

pub const TODO_URL: &str = "/todo";
pub const TODO_ID_URL: &str = "/todo/:id";

#[derive(Clone)]
pub struct AppState<S: TodoService> {
    pub service: S,
    /// Overrides the scheme and authority item urls are built from.
    pub public_url: Option<String>,
}

impl<S: TodoService> AppState<S> {
    pub fn new(service: S) -> Self { Self { service, public_url: None } }

    /// Absolute address of the collection the request came in on.
    fn collection_url(&self, headers: &HeaderMap, path: &str) -> String {
        let origin = match &self.public_url {
            Some(url) => url.clone(),
            None => {
                let host = headers.get(header::HOST).and_then(|h| h.to_str().ok()).unwrap_or("localhost");
                format!("http://{host}")
            }
        };
        format!("{origin}{}", path.trim_end_matches('/'))
    }
}

fn cors<const N: usize>(methods: [Method; N]) -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(methods).allow_headers([header::CONTENT_TYPE])
}

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    let collection = Router::new()
        .route(TODO_URL, get(list_todos::<S>).post(create_todo::<S>).delete(clear_todos::<S>))
        .layer(cors([Method::GET, Method::DELETE, Method::POST, Method::PATCH, Method::OPTIONS]));
    let item = Router::new()
        .route(TODO_ID_URL, get(get_todo::<S>).delete(delete_todo::<S>).patch(update_todo::<S>).put(update_todo::<S>))
        .layer(cors([Method::GET, Method::DELETE, Method::PATCH, Method::PUT, Method::OPTIONS]));
    collection.merge(item).with_state(state)
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, OriginalUri(uri): OriginalUri, headers: HeaderMap, body: Bytes) -> Result<JsonBody<Value>, ApiError> {
    let input = codec::decode(&body)?;
    let base_url = state.collection_url(&headers, uri.path());
    let todo = state.service.create(input, &base_url).await?;
    Ok(JsonBody(StatusCode::CREATED, codec::encode(&todo)))
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<JsonBody<Value>, ApiError> {
    let todos = state.service.list().await?;
    Ok(JsonBody(StatusCode::OK, codec::encode_all(&todos)))
}

async fn clear_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<StatusCode, ApiError> {
    state.service.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<JsonBody<Value>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state.service.get(id).await?;
    Ok(JsonBody(StatusCode::OK, codec::encode(&todo)))
}

async fn update_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>, body: Bytes) -> Result<JsonBody<Value>, ApiError> {
    let id = parse_id(&id)?;
    let patch = codec::decode_patch(&body)?;
    let todo = state.service.update(id, patch).await?;
    Ok(JsonBody(StatusCode::OK, codec::encode(&todo)))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Anything that is not a positive integer can never have been minted.
fn parse_id(s: &str) -> Result<ItemId, ApiError> { s.parse().map_err(|_| ApiError::NotFound(format!("todo {s} not found"))) }
