use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, Hits, Item, LARGE_BODY_LEN};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- items ---

#[tokio::test]
async fn item_echoes_id_and_query() {
    let resp = app().oneshot(get("/api/items/3?q=a")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let item: Item = body_json(resp).await;
    assert_eq!(item.status, 0);
    assert_eq!(item.id, "3");
    assert_eq!(item.query.get("q").map(String::as_str), Some("a"));
}

#[tokio::test]
async fn item_without_query_has_empty_map() {
    let resp = app().oneshot(get("/api/items/abc")).await.unwrap();

    let item: Item = body_json(resp).await;
    assert_eq!(item.id, "abc");
    assert!(item.query.is_empty());
}

// --- hits ---

#[tokio::test]
async fn hits_count_up_per_router() {
    let app = app();
    let first: Hits = body_json(app.clone().oneshot(get("/api/hits")).await.unwrap()).await;
    let second: Hits = body_json(app.oneshot(get("/api/hits")).await.unwrap()).await;
    assert_eq!(first.hits, 1);
    assert_eq!(second.hits, 2);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_method_headers_and_body() {
    let req = Request::builder()
        .method("PUT")
        .uri("/api/echo")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(http::header::AUTHORIZATION, "Bearer t")
        .body("a=1&b=2".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
    assert_eq!(echo.authorization.as_deref(), Some("Bearer t"));
    assert_eq!(echo.body, "a=1&b=2");
}

#[tokio::test]
async fn echo_accepts_delete_without_body() {
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/echo")
        .body(String::new())
        .unwrap();
    let echo: Echo = body_json(app().oneshot(req).await.unwrap()).await;
    assert_eq!(echo.method, "DELETE");
    assert!(echo.content_type.is_none());
    assert!(echo.body.is_empty());
}

// --- failures and raw bodies ---

#[tokio::test]
async fn broken_returns_500_with_success_shaped_body() {
    let resp = app().oneshot(get("/api/broken")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["status"], 0);
}

#[tokio::test]
async fn text_is_plain() {
    let resp = app().oneshot(get("/api/text")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "hello from mock-server");
}

#[tokio::test]
async fn large_has_expected_length() {
    let resp = app().oneshot(get("/api/large")).await.unwrap();
    assert_eq!(body_bytes(resp).await.len(), LARGE_BODY_LEN);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app().oneshot(get("/api/missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
