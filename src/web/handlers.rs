use super::{AppState, Result, WebError};
use crate::core::{DbError, NodeId};
use crate::fruit::{Fruit, NewFruit};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, Sse};
use futures::{Stream, TryStreamExt};
use serde_json::{Value, json};
use tracing::error;

pub async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /reactivefruits`: one SSE event per fruit name
///
/// An error terminates the response body; the session behind the stream is
/// released before that happens.
pub async fn stream_fruits(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, DbError>>> {
    let events = state
        .fruits
        .stream_names()
        .map_ok(|name| Event::default().data(name))
        .inspect_err(|err| error!(error = %err, "fruit stream terminated"));

    Sse::new(events)
}

/// `POST /reactivefruits`: `201` with the new fruit's location as body
pub async fn create_fruit(
    State(state): State<AppState>,
    Json(payload): Json<NewFruit>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], String)> {
    let location = state.fruits.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location.clone())],
        location,
    ))
}

/// `GET /fruits/:id`
pub async fn get_fruit(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<Json<Fruit>> {
    state
        .fruits
        .find(id)
        .await?
        .map(Json)
        .ok_or_else(|| WebError::not_found(format!("fruit {} not found", id)))
}
