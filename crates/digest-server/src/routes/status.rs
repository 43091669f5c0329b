//! Liveness and topic management.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use digest_core::config::save_topics;
use digest_core::{Topic, TopicEntry, TopicRegistry};
use serde::Deserialize;
use tracing::{error, info};

use super::digest::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/topics", get(get_topics).post(replace_topics))
        .route("/topics/{id}", get(get_topic))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /topics: every configured topic, enabled or not.
async fn get_topics(State(state): State<Arc<AppState>>) -> Json<Vec<Topic>> {
    Json(state.registry.read().all().to_vec())
}

/// GET /topics/{id}
async fn get_topic(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.registry.read().get(&id) {
        Some(topic) => Json(topic.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("unknown topic '{}'", id)),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplaceTopicsRequest {
    pub topics: Vec<TopicEntry>,
}

/// POST /topics: replace the topic list and write it to `config.json`.
async fn replace_topics(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReplaceTopicsRequest>,
) -> Response {
    let topics: Vec<Topic> = req.topics.into_iter().map(TopicEntry::into_topic).collect();
    let registry = match TopicRegistry::new(topics) {
        Ok(registry) => registry,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    // Lock held across the save: disk and memory see the same order of replacements.
    let mut current = state.registry.write();
    if let Err(e) = save_topics(&state.config.data_dir, registry.all()) {
        error!("Failed to save topics: {}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }
    let count = registry.len();
    *current = registry;
    info!("Topics replaced ({} configured)", count);

    Json(serde_json::json!({ "ok": true, "topics": count })).into_response()
}
