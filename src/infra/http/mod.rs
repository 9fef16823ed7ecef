mod middleware;
mod preview;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use preview::DOCUMENT_SOURCE_HEADER;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    application::{
        compositor::PassthroughCompositor,
        error::ErrorReport,
        preview::PreviewService,
        render::{PreviewFinisher, RenderBackend, RenderInvoker, RetryPolicy},
    },
    config::Settings,
};

use super::{
    assets::{AssetProxy, proxy_theme_asset},
    error::InfraError,
    renderer::HttpRenderBackend,
    templates::FsTemplateSource,
};
use middleware::{log_responses, set_request_context};

/// Shared handles for every route.
#[derive(Clone)]
pub struct HttpState {
    pub preview: Arc<PreviewService>,
    pub assets: Arc<AssetProxy>,
}

impl HttpState {
    /// Wire the filesystem template source and the HTTP renderer from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, InfraError> {
        let backend = Arc::new(HttpRenderBackend::new(
            settings.renderer.base_url.clone(),
            settings.renderer.timeout,
        )?);
        let preview = build_preview_service(settings, backend.clone());
        Ok(Self {
            preview: Arc::new(preview),
            assets: Arc::new(AssetProxy::new(backend)),
        })
    }
}

/// Preview service over `{themes.directory}` and the given render backend.
pub fn build_preview_service(
    settings: &Settings,
    backend: Arc<dyn RenderBackend>,
) -> PreviewService {
    let policy = RetryPolicy {
        max_attempts: settings.renderer.max_attempts.get(),
        backoff: settings.renderer.backoff,
        min_html_length: settings.renderer.min_html_length,
    };
    let finisher = PreviewFinisher::new(
        settings.preview.asset_prefix.clone(),
        settings.preview.asset_proxy_prefix.clone(),
    );

    PreviewService::new(
        Arc::new(FsTemplateSource::new(settings.themes.directory.clone())),
        Arc::new(PassthroughCompositor),
        RenderInvoker::new(backend, policy),
        finisher,
    )
    .with_default_page_type(settings.themes.default_page_type.clone())
}

impl FromRef<HttpState> for Arc<PreviewService> {
    fn from_ref(state: &HttpState) -> Self {
        state.preview.clone()
    }
}

impl FromRef<HttpState> for Arc<AssetProxy> {
    fn from_ref(state: &HttpState) -> Self {
        state.assets.clone()
    }
}

/// Build the public router. Asset requests are served under the finisher's
/// proxy prefix so rewritten documents resolve against this server.
pub fn build_router(state: HttpState) -> Router {
    let asset_route = format!("{}{{*path}}", state.preview.finisher().asset_proxy_prefix());

    Router::new()
        .route("/preview", post(preview::compose_preview))
        .route(&asset_route, get(proxy_theme_asset))
        .route("/_health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(
        "infra::http::not_found",
        StatusCode::NOT_FOUND,
        "No route matches the request",
    )
    .attach(&mut response);
    response
}
