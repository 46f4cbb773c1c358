use anyhow::Result;
use axum::extract::Request;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::middleware::{from_fn, Next};
use axum::response::{Html, Response};
use axum::routing::get_service;
use axum::{routing::get, Router};
use std::path::PathBuf;
use tower_http::services::{ServeDir, ServeFile};

const PLACEHOLDER_INDEX: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Firewatch</title>
  </head>
  <body style="font-family: system-ui; padding: 24px">
    <h1>Firewatch</h1>
    <p>No map bundle is installed. Start the server with <code>--static-root</code> to serve one.</p>
    <p>The API is available under <code>/api</code>; see <a href="/api/openapi.json">/api/openapi.json</a>.</p>
  </body>
</html>
"#;

fn cache_policy(path: &str, content_type: &str) -> &'static str {
    if path.starts_with("/assets/") {
        // Bundler output is content-hashed.
        "public, max-age=31536000, immutable"
    } else if content_type.starts_with("text/html") {
        "no-store"
    } else {
        "public, max-age=86400"
    }
}

async fn apply_cache_headers(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let mut response = next.run(req).await;

    if response.headers().contains_key(CACHE_CONTROL) {
        return response;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Ok(value) = HeaderValue::from_str(cache_policy(&path, content_type)) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }

    response
}

pub fn service(static_root: Option<PathBuf>) -> Result<Router> {
    let router = if let Some(root) = static_root {
        if !root.exists() {
            anyhow::bail!("static_root not found at {}", root.display());
        }
        let index = root.join("index.html");
        let dir = ServeDir::new(root)
            .append_index_html_on_directories(true)
            .not_found_service(ServeFile::new(index));
        Router::new()
            .fallback_service(get_service(dir))
            .layer(from_fn(apply_cache_headers))
    } else {
        async fn placeholder_handler() -> Html<&'static str> {
            Html(PLACEHOLDER_INDEX)
        }

        Router::new()
            .route("/", get(placeholder_handler))
            .fallback(get(placeholder_handler))
    };
    Ok(router)
}
