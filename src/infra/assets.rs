//! Theme asset proxy: `/preview/assets/{path}` → `{renderer}/theme-assets/{path}`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use mime_guess::Mime;
use tracing::warn;

use crate::application::error::ErrorReport;

use super::renderer::HttpRenderBackend;

const SOURCE: &str = "infra::assets::proxy_theme_asset";
const DEFAULT_CACHE_CONTROL: &str = "public, max-age=3600";
const UNCACHED: &str = "no-store";

/// Forwards asset requests to the renderer that owns the theme files.
#[derive(Debug, Clone)]
pub struct AssetProxy {
    backend: Arc<HttpRenderBackend>,
}

impl AssetProxy {
    pub fn new(backend: Arc<HttpRenderBackend>) -> Self {
        Self { backend }
    }

    async fn fetch(&self, path: &str) -> Response {
        let upstream = match self.backend.fetch_asset(path).await {
            Ok(upstream) => upstream,
            Err(err) => {
                warn!(
                    target = "vitrine::infra::assets",
                    path,
                    error = %err,
                    "Theme asset fetch failed"
                );
                let mut response = StatusCode::BAD_GATEWAY.into_response();
                ErrorReport::from_error(SOURCE, StatusCode::BAD_GATEWAY, &err)
                    .attach(&mut response);
                return response;
            }
        };

        let status =
            StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = upstream
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Mime>().ok())
            .unwrap_or_else(|| mime_guess::from_path(path).first_or_octet_stream());
        let cache_control = upstream
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .filter(|_| status.is_success())
            .and_then(|value| value.to_str().ok())
            .and_then(|value| HeaderValue::from_str(value).ok());

        let bytes = match upstream.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                let mut response = StatusCode::BAD_GATEWAY.into_response();
                ErrorReport::from_error(SOURCE, StatusCode::BAD_GATEWAY, &err)
                    .attach(&mut response);
                return response;
            }
        };

        let mut response = build_response(status, bytes, content_type);
        if let Some(value) = cache_control {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
        if !status.is_success() {
            ErrorReport::from_message(SOURCE, status, "Upstream theme asset unavailable")
                .attach(&mut response);
        }
        response
    }
}

/// Axum handler for `GET {asset_proxy_prefix}{*path}`.
pub async fn proxy_theme_asset(
    State(proxy): State<Arc<AssetProxy>>,
    path: Option<Path<String>>,
) -> Response {
    let captured = path.map(|Path(value)| value);
    match resolve_asset_path(captured) {
        Some(path) => proxy.fetch(&path).await,
        None => rejected_response(StatusCode::NOT_FOUND),
    }
}

fn rejected_response(status: StatusCode) -> Response {
    let mut response = status.into_response();
    ErrorReport::from_message(SOURCE, status, "Theme asset request rejected")
        .attach(&mut response);
    response
}

/// Relative asset path, or `None` for directory requests and traversal attempts.
fn resolve_asset_path(path: Option<String>) -> Option<String> {
    let candidate = path.unwrap_or_default();
    let candidate = candidate.trim_start_matches('/');

    if candidate.is_empty()
        || candidate.ends_with('/')
        || candidate.contains('\\')
        || candidate.split('/').any(|segment| segment == "..")
    {
        return None;
    }

    Some(candidate.to_string())
}

fn build_response(status: StatusCode, bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    let cache_control = if status.is_success() {
        DEFAULT_CACHE_CONTROL
    } else {
        UNCACHED
    };
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    response
}
