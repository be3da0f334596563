use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, DOWNLOAD_CONTENT};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn post(uri: &str, content_type: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(body.to_string())
        .unwrap()
}

// --- get ---

#[tokio::test]
async fn get_text_returns_plain_text() {
    let resp = app().oneshot(get("/get/text")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "text/plain");
    assert_eq!(resp.headers()[http::header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(&body_bytes(resp).await[..], b"Hello");
}

#[tokio::test]
async fn get_json_echoes_query() {
    let resp = app()
        .oneshot(get("/get/json?name=axios&tags%5B%5D=a"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "success": true, "args": { "name": "axios", "tags[]": "a" } })
    );
}

#[tokio::test]
async fn redirect_points_at_text() {
    let resp = app().oneshot(get("/redirect")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "/get/text");
}

#[tokio::test]
async fn delayed_honors_ms_param() {
    let resp = app().oneshot(get("/delayed?ms=5")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"This is a delayed response after 5 milliseconds");
}

#[tokio::test]
async fn download_is_an_attachment() {
    let resp = app().oneshot(get("/download")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::CONTENT_DISPOSITION],
        "attachment; filename=\"example.txt\""
    );
    assert_eq!(&body_bytes(resp).await[..], DOWNLOAD_CONTENT.as_bytes());
}

#[tokio::test]
async fn error_route_returns_500_json() {
    let resp = app().oneshot(get("/error")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await,
        json!({ "code": 500, "message": "Internal Server Error" })
    );
}

// --- post ---

#[tokio::test]
async fn post_json_echoes_body_and_args() {
    let resp = app()
        .oneshot(post("/post/json?id=7", "application/json", r#"{"a":[1,2]}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "success": true, "args": { "id": "7" }, "data": { "a": [1, 2] } })
    );
}

#[tokio::test]
async fn post_json_rejects_malformed_body() {
    let resp = app()
        .oneshot(post("/post/json", "application/json", "{nope"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["success"], false);
}

#[tokio::test]
async fn post_form_decodes_urlencoded_body() {
    let resp = app()
        .oneshot(post(
            "/post/form",
            "application/x-www-form-urlencoded",
            "name=John+Doe&city=a%26b",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["data"],
        json!({ "name": "John Doe", "city": "a&b" })
    );
}

#[tokio::test]
async fn upload_reports_fields() {
    let body = "--XBOUNDARY\r\n\
        Content-Disposition: form-data; name=\"title\"\r\n\r\n\
        report\r\n\
        --XBOUNDARY\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
        Content-Type: text/plain\r\n\r\n\
        file body\r\n\
        --XBOUNDARY--\r\n";
    let resp = app()
        .oneshot(post("/upload", "multipart/form-data; boundary=XBOUNDARY", body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({
            "success": true,
            "args": {},
            "data": { "title": "report", "file": "file body" }
        })
    );
}

#[tokio::test]
async fn upload_without_multipart_reports_failure() {
    let resp = app()
        .oneshot(post("/upload", "text/plain", "hello"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "success": false }));
}

// --- routing ---

#[tokio::test]
async fn preflight_returns_cors_headers() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/post/json")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[http::header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, POST, PUT, DELETE"
    );
    assert_eq!(resp.headers()[http::header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn unknown_path_returns_404_text() {
    let resp = app().oneshot(get("/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[http::header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(&body_bytes(resp).await[..], b"404 Not Found");
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let resp = app().oneshot(post("/get/text", "text/plain", "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
