use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::codec::CodecError;
use crate::domain::repository::TodoError;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// JSON body sent with an explicit `charset=utf-8` content type.
pub struct JsonBody<T>(pub StatusCode, pub T);

impl<T: Serialize> IntoResponse for JsonBody<T> {
    fn into_response(self) -> Response {
        let mut res = (self.0, axum::Json(self.1)).into_response();
        res.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        res
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody { pub error: String }

#[derive(Debug)]
pub enum ApiError {
    MalformedInput(String),
    NotFound(String),
    Store(String),
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound(_) => ApiError::NotFound(err.to_string()),
            TodoError::StoreUnavailable { .. } | TodoError::Store { .. } => ApiError::Store(err.to_string()),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self { ApiError::MalformedInput(err.to_string()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::MalformedInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        JsonBody(status, ErrorBody { error }).into_response()
    }
}
