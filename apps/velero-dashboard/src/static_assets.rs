use anyhow::Result;
use axum::extract::Request;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use std::path::PathBuf;
use tower_http::services::ServeDir;

use crate::state::AppState;

const DEFAULT_STYLESHEET: &str = include_str!("../static/css/dashboard.css");

async fn apply_cache_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    if response.headers().contains_key(CACHE_CONTROL) {
        return response;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let cache_value = if content_type.starts_with("text/html") {
        "no-store"
    } else {
        "public, max-age=86400"
    };

    if let Ok(value) = HeaderValue::from_str(cache_value) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }

    response
}

async fn default_stylesheet() -> Response {
    (
        [(CONTENT_TYPE, "text/css; charset=utf-8")],
        DEFAULT_STYLESHEET,
    )
        .into_response()
}

/// Serves `/static/*` from `static_root`, or the built-in stylesheet when none is configured.
pub fn router(static_root: Option<PathBuf>) -> Result<Router<AppState>> {
    let router = if let Some(root) = static_root {
        if !root.exists() {
            anyhow::bail!("static_root not found at {}", root.display());
        }
        tracing::info!(root = %root.display(), "serving static assets");
        Router::new().nest_service("/static", ServeDir::new(root))
    } else {
        Router::new().route("/static/css/dashboard.css", get(default_stylesheet))
    };
    Ok(router.layer(from_fn(apply_cache_headers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn built_in_stylesheet_is_served_without_static_root() {
        let app = router(None)
            .unwrap()
            .with_state(crate::test_support::test_state_signed_in(
                crate::auth::Role::Viewer,
            ));
        let resp = app
            .oneshot(get_request("/static/css/dashboard.css"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=86400"
        );
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains(".flash-error"));
    }

    #[tokio::test]
    async fn files_come_from_static_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/dashboard.css"), "body { color: red; }").unwrap();
        std::fs::write(dir.path().join("about.html"), "<p>about</p>").unwrap();

        let app = router(Some(dir.path().to_path_buf()))
            .unwrap()
            .with_state(crate::test_support::test_state_signed_in(
                crate::auth::Role::Viewer,
            ));

        let resp = app
            .clone()
            .oneshot(get_request("/static/css/dashboard.css"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"body { color: red; }");

        let resp = app.oneshot(get_request("/static/about.html")).await.unwrap();
        assert_eq!(resp.headers().get(CACHE_CONTROL).unwrap(), "no-store");
    }

    #[test]
    fn missing_static_root_is_rejected() {
        let Err(err) = router(Some(PathBuf::from("/nonexistent/velero-static"))) else {
            panic!("expected a missing static_root to be rejected");
        };
        assert!(err.to_string().contains("static_root not found"));
    }
}
