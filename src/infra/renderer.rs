//! HTTP client for the external theme renderer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use url::Url;

use crate::application::render::{BackendReply, RenderBackend, RenderRequest, TransportError};

use super::error::InfraError;

const RENDER_PATH: &str = "render-theme";
const ASSET_PATH: &str = "theme-assets/";

/// `POST {base_url}/render-theme` with the serialized [`RenderRequest`].
#[derive(Debug, Clone)]
pub struct HttpRenderBackend {
    client: Client,
    base_url: Url,
}

impl HttpRenderBackend {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("vitrine/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http(format!("failed to build renderer client: {err}")))?;
        Ok(Self {
            client,
            base_url: directory_url(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn render_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(RENDER_PATH)
    }

    /// Upstream location of a theme asset; `path` is relative to the asset root.
    pub fn asset_url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(ASSET_PATH)?.join(path)
    }

    /// Fetch a theme asset from the renderer, returning the raw upstream response.
    pub async fn fetch_asset(&self, path: &str) -> Result<Response, InfraError> {
        let url = self
            .asset_url(path)
            .map_err(|err| InfraError::http(format!("invalid asset path `{path}`: {err}")))?;
        self.client
            .get(url)
            .send()
            .await
            .map_err(|err| InfraError::http(err.to_string()))
    }
}

#[async_trait]
impl RenderBackend for HttpRenderBackend {
    async fn render_theme(&self, request: &RenderRequest) -> Result<BackendReply, TransportError> {
        let url = self
            .render_url()
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        Ok(BackendReply::new(status, body))
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::Request(err.to_string())
    } else {
        TransportError::Interrupted(err.to_string())
    }
}

/// `Url::join` replaces the last segment unless the path ends with `/`.
fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
