//! On-demand classification: POST /digest.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use digest_core::config::clamp_threshold;
use digest_core::{Paper, TopicEntry, TopicRegistry};
use digest_match::{filter_papers, FilterOptions, MatchMethod, MatchResult, SemanticStatus};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::state::AppState;

/// Authors shown before truncating with "et al.".
const MAX_AUTHORS: usize = 3;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/digest", post(run_digest))
}

/// Every field falls back to server-side configuration when omitted.
#[derive(Debug, Default, Deserialize)]
pub struct DigestRequest {
    pub topics: Option<Vec<TopicEntry>>,
    /// Papers to classify; defaults to the newest stored snapshot.
    pub papers: Option<Vec<Paper>>,
    pub embedding_threshold: Option<f32>,
    #[serde(default)]
    pub seen_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DigestPaper {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub url: String,
    pub published: DateTime<Utc>,
    pub topics: Vec<String>,
    pub match_method: MatchMethod,
    pub semantic_scores: BTreeMap<String, f32>,
}

impl From<MatchResult> for DigestPaper {
    fn from(result: MatchResult) -> Self {
        let url = result.paper.pdf_url();
        let paper = result.paper;
        Self {
            id: paper.id,
            title: paper.title,
            abstract_text: paper.abstract_text,
            authors: short_authors(paper.authors),
            url,
            published: paper.published,
            topics: result.matched_topics,
            match_method: result.match_method,
            semantic_scores: result.semantic_scores,
        }
    }
}

/// First authors, plus "et al." when some were cut.
fn short_authors(mut authors: Vec<String>) -> Vec<String> {
    if authors.len() > MAX_AUTHORS {
        authors.truncate(MAX_AUTHORS);
        authors.push("et al.".to_string());
    }
    authors
}

#[derive(Debug, Serialize)]
pub struct DigestStats {
    pub fetched: usize,
    pub matched: usize,
    pub semantic: SemanticStatus,
}

#[derive(Debug, Serialize)]
pub struct DigestResponse {
    pub papers: Vec<DigestPaper>,
    pub unmatched: Vec<DigestPaper>,
    pub stats: DigestStats,
}

impl DigestResponse {
    fn empty() -> Self {
        Self {
            papers: Vec::new(),
            unmatched: Vec::new(),
            stats: DigestStats {
                fetched: 0,
                matched: 0,
                semantic: SemanticStatus::Skipped,
            },
        }
    }
}

pub(crate) fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// POST /digest
async fn run_digest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DigestRequest>,
) -> Response {
    let topics = match req.topics {
        Some(entries) => {
            match TopicRegistry::new(entries.into_iter().map(TopicEntry::into_topic).collect()) {
                Ok(registry) => registry.enabled(),
                Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
            }
        }
        None => state.registry.read().enabled(),
    };
    if topics.is_empty() {
        return Json(DigestResponse::empty()).into_response();
    }

    let papers = match req.papers {
        Some(papers) => papers,
        None => match state.snapshots.latest() {
            Ok(Some((date, papers))) => {
                info!("Classifying stored snapshot {}", date);
                papers
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                error!("Failed to load latest snapshot: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        },
    };

    let options = FilterOptions {
        threshold: req
            .embedding_threshold
            .map(clamp_threshold)
            .unwrap_or(state.config.settings.embedding_threshold),
        seen_ids: req.seen_ids.into_iter().collect::<HashSet<_>>(),
    };
    let fetched = papers.len();

    // Embedding inference is CPU-bound.
    let worker = state.clone();
    let outcome = match tokio::task::spawn_blocking(move || {
        filter_papers(&papers, &topics, worker.embedder.as_ref(), &options)
    })
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Digest worker failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let response = DigestResponse {
        stats: DigestStats {
            fetched,
            matched: outcome.matched.len(),
            semantic: outcome.semantic,
        },
        papers: outcome.matched.into_iter().map(DigestPaper::from).collect(),
        unmatched: outcome.unmatched.into_iter().map(DigestPaper::from).collect(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{NaiveDate, TimeZone};
    use digest_core::DigestConfig;
    use digest_infer::NoopEmbedder;
    use tower::ServiceExt;

    use crate::routes::build_router;

    fn setup() -> (Router, Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DigestConfig::load(dir.path()).unwrap();
        let state = Arc::new(AppState::new(config, Arc::new(NoopEmbedder::new(384))).unwrap());
        (build_router(state.clone()), state, dir)
    }

    fn paper_json(id: &str, title: &str, day: u32, authors: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "abstract": "",
            "authors": authors,
            "published": format!("2026-02-{:02}T00:00:00Z", day),
        })
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(router, request).await
    }

    async fn post_digest(router: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        post_json(router, "/digest", body).await
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    #[test]
    fn test_short_authors() {
        let four: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(short_authors(four), vec!["A", "B", "C", "et al."]);
        let three: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(short_authors(three.clone()), three);
    }

    #[tokio::test]
    async fn test_digest_with_inline_papers() {
        let (router, _state, _dir) = setup();
        let body = serde_json::json!({
            "topics": [{"name": "Symbolic AI", "terms": ["symbolic"]}],
            "papers": [
                paper_json("p1", "Symbolic planning", 1, &["A", "B", "C", "D"]),
                paper_json("p2", "Vision transformers", 2, &["E"]),
                paper_json("p3", "Neurosymbolic agents", 3, &[]),
            ],
        });

        let (status, json) = post_digest(router, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stats"]["fetched"], 3);
        assert_eq!(json["stats"]["matched"], 1);
        assert_eq!(json["stats"]["semantic"], "unavailable");

        let paper = &json["papers"][0];
        assert_eq!(paper["id"], "p1");
        assert_eq!(paper["match_method"], "keyword");
        assert_eq!(paper["topics"], serde_json::json!(["Symbolic AI"]));
        assert_eq!(paper["url"], "https://arxiv.org/pdf/p1");
        assert_eq!(paper["authors"], serde_json::json!(["A", "B", "C", "et al."]));
        assert_eq!(json["unmatched"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_digest_seen_ids_excluded() {
        let (router, _state, _dir) = setup();
        let body = serde_json::json!({
            "topics": [{"name": "Symbolic AI", "terms": ["symbolic"]}],
            "papers": [paper_json("p1", "Symbolic planning", 1, &[])],
            "seen_ids": ["p1"],
        });

        let (status, json) = post_digest(router, body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["papers"].as_array().unwrap().is_empty());
        assert!(json["unmatched"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_digest_no_enabled_topics() {
        let (router, _state, _dir) = setup();
        let body = serde_json::json!({
            "topics": [{"name": "Off", "terms": ["symbolic"], "enabled": false}],
            "papers": [paper_json("p1", "Symbolic planning", 1, &[])],
        });

        let (status, json) = post_digest(router, body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["papers"].as_array().unwrap().is_empty());
        assert_eq!(json["stats"]["fetched"], 0);
    }

    #[tokio::test]
    async fn test_digest_rejects_duplicate_topic_ids() {
        let (router, _state, _dir) = setup();
        let body = serde_json::json!({
            "topics": [
                {"id": "x", "name": "One", "terms": ["a"]},
                {"id": "x", "name": "Two", "terms": ["b"]},
            ],
            "papers": [],
        });

        let (status, json) = post_digest(router, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("duplicate"));
    }

    #[tokio::test]
    async fn test_digest_defaults_to_latest_snapshot() {
        let (router, state, _dir) = setup();
        let paper = Paper {
            id: "2602.00001".to_string(),
            title: "Theorem proving with language models".to_string(),
            abstract_text: String::new(),
            authors: vec![],
            url: Paper::abs_url("2602.00001"),
            published: Utc.with_ymd_and_hms(2026, 2, 27, 0, 0, 0).unwrap(),
            categories: vec![],
        };
        let date = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        state.snapshots.save(date, &[paper]).unwrap();

        let (status, json) = post_digest(router, serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stats"]["fetched"], 1);
        assert_eq!(json["papers"][0]["topics"], serde_json::json!(["Symbolic AI"]));
    }

    #[tokio::test]
    async fn test_health_and_topics() {
        let (router, _state, _dir) = setup();

        let (status, json) = get_json(router.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");

        let (_, json) = get_json(router.clone(), "/topics").await;
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[2]["id"], "symbolic");

        let (status, json) = get_json(router.clone(), "/topics/symbolic").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Symbolic AI");

        let (status, json) = get_json(router, "/topics/quantum").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("quantum"));
    }

    #[tokio::test]
    async fn test_replaced_topics_drive_later_requests() {
        let (router, state, dir) = setup();
        let body = serde_json::json!({
            "topics": [
                {"name": "Causal Inference", "terms": ["causal"]},
                {"id": "old", "name": "Retired", "terms": ["symbolic"], "enabled": false},
            ],
        });

        let (status, json) = post_json(router.clone(), "/topics", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["topics"], 2);
        assert_eq!(state.registry.read().len(), 2);

        let (_, json) = get_json(router.clone(), "/topics").await;
        assert_eq!(json[0]["id"], "causal-inference");
        assert_eq!(json[1]["enabled"], false);

        let body = serde_json::json!({
            "papers": [
                paper_json("p1", "Causal discovery at scale", 1, &[]),
                paper_json("p2", "Symbolic planning", 2, &[]),
            ],
        });
        let (_, json) = post_digest(router, body).await;
        assert_eq!(json["stats"]["matched"], 1);
        assert_eq!(json["papers"][0]["topics"], serde_json::json!(["Causal Inference"]));

        // The saved list survives a restart.
        let reloaded = DigestConfig::load(dir.path()).unwrap();
        assert_eq!(reloaded.topics.len(), 2);
        assert_eq!(reloaded.topics[0].name, "Causal Inference");
        assert!(!reloaded.topics[1].enabled);
    }

    #[tokio::test]
    async fn test_invalid_topic_list_is_rejected_and_not_saved() {
        let (router, state, dir) = setup();
        let body = serde_json::json!({
            "topics": [
                {"id": "x", "name": "One", "terms": ["a"]},
                {"id": "x", "name": "Two", "terms": ["b"]},
            ],
        });

        let (status, json) = post_json(router, "/topics", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("duplicate"));
        assert_eq!(state.registry.read().len(), 3);
        assert!(!dir.path().join("config.json").exists());
    }
}
