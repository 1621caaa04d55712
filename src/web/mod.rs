//! HTTP surface for the fruit resource.
//!
//! `GET /reactivefruits` streams fruit names as server-sent events,
//! `POST /reactivefruits` creates a fruit and answers `201` with its
//! location as a plain-text body.

pub mod handlers;

use crate::core::DbError;
use crate::fruit::FruitResource;
use axum::Json;
use axum::Router;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub fruits: FruitResource,
}

impl AppState {
    pub fn new(fruits: FruitResource) -> Self {
        Self { fruits }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::healthcheck))
        .route(
            "/reactivefruits",
            get(handlers::stream_fruits).post(handlers::create_fruit),
        )
        .route("/fruits/:id", get(handlers::get_fruit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("{0}")]
    NotFound(String),
}

impl WebError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            WebError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            WebError::Database(err) => match err {
                DbError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "input_error"),
                DbError::ConstraintViolation(_) => (StatusCode::CONFLICT, "conflict"),
                DbError::ParseError(_) => (StatusCode::BAD_REQUEST, "parse_error"),
                DbError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "missing_parameter"),
                DbError::TypeMismatch(_) => (StatusCode::BAD_REQUEST, "type_mismatch"),
                DbError::Mapping(_) => (StatusCode::INTERNAL_SERVER_ERROR, "mapping_error"),
                DbError::SessionUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "session_unavailable")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;
