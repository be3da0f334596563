use std::{collections::BTreeMap, time::Duration};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Query, Request},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tracing::{debug, warn};

pub const DOWNLOAD_CONTENT: &str = "Hello, this is the content of the text file.";

const DEFAULT_DELAY_MS: u64 = 10_000;

pub type Args = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
pub struct DelayParams {
    pub ms: Option<u64>,
}

pub fn app() -> Router {
    Router::new()
        .route("/get/text", get(get_text))
        .route("/get/json", get(get_json))
        .route("/redirect", get(redirect))
        .route("/delayed", get(delayed))
        .route("/download", get(download))
        .route("/error", get(internal_error))
        .route("/post/json", post(post_json))
        .route("/post/form", post(post_form))
        .route("/upload", post(upload))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return (
            [
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, PUT, DELETE"),
                (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            ],
            "",
        )
            .into_response();
    }
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

fn text(body: impl Into<String>) -> Response {
    ([(header::CONTENT_TYPE, "text/plain")], body.into()).into_response()
}

async fn get_text() -> Response {
    text("Hello")
}

async fn get_json(Query(args): Query<Args>) -> Json<Value> {
    Json(json!({ "success": true, "args": args }))
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/get/text")])
}

async fn delayed(Query(params): Query<DelayParams>) -> Response {
    let ms = params.ms.unwrap_or(DEFAULT_DELAY_MS);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    text(format!("This is a delayed response after {ms} milliseconds"))
}

async fn download() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"example.txt\""),
        ],
        DOWNLOAD_CONTENT,
    )
        .into_response()
}

async fn internal_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "code": 500, "message": "Internal Server Error" })),
    )
}

async fn post_json(Query(args): Query<Args>, body: Bytes) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(data) => Json(json!({ "success": true, "args": args, "data": data })).into_response(),
        Err(err) => {
            warn!(error = %err, "rejecting malformed json body");
            bad_request(err.to_string())
        }
    }
}

async fn post_form(Query(args): Query<Args>, Form(data): Form<Args>) -> Json<Value> {
    Json(json!({ "success": true, "args": args, "data": data }))
}

async fn upload(
    Query(args): Query<Args>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(%rejection, "upload without multipart body");
            return Json(json!({ "success": false })).into_response();
        }
    };

    let mut data = Map::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return bad_request(err.body_text()),
        };
        let name = field.name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) => {
                data.insert(name, Value::String(field_text(&bytes)));
            }
            Err(err) => return bad_request(err.body_text()),
        }
    }
    Json(json!({ "success": true, "args": args, "data": data })).into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, text("404 Not Found")).into_response()
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

/// Upload field contents as text, or a size summary for binary data.
pub fn field_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => format!("(binary data: {} bytes)", bytes.len()),
    }
}
