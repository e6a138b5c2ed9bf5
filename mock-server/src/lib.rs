use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const LARGE_BODY_LEN: usize = 64 * 1024;

/// Envelope used by every JSON route: `status == 0` means success.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub status: i32,
    pub id: String,
    pub query: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hits {
    pub status: i32,
    pub hits: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Echo {
    pub status: i32,
    pub method: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct AppState {
    hits: Arc<AtomicU64>,
}

pub fn app() -> Router {
    Router::new()
        .route("/api/items/{id}", get(get_item))
        .route("/api/hits", get(count_hit))
        .route("/api/echo", get(echo).post(echo).put(echo).delete(echo))
        .route("/api/broken", get(broken))
        .route("/api/text", get(text))
        .route("/api/large", get(large))
        .with_state(AppState::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_item(Path(id): Path<String>, Query(query): Query<HashMap<String, String>>) -> Json<Item> {
    Json(Item { status: 0, id, query })
}

async fn count_hit(State(state): State<AppState>) -> Json<Hits> {
    let hits = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    Json(Hits { status: 0, hits })
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let header_str = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(Echo {
        status: 0,
        method: method.to_string(),
        content_type: header_str(header::CONTENT_TYPE),
        authorization: header_str(header::AUTHORIZATION),
        body,
    })
}

async fn broken() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"status": 0, "message": "boom"})),
    )
}

async fn text() -> &'static str {
    "hello from mock-server"
}

async fn large() -> String {
    "x".repeat(LARGE_BODY_LEN)
}
