use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    response::{Html, IntoResponse, Response},
};
use vitrine_protocol::PreviewRequestBody;

use crate::application::{
    error::HttpError,
    preview::{PreviewInput, PreviewService},
};

/// Tells the caller whether the document came from the renderer or the fallback.
pub const DOCUMENT_SOURCE_HEADER: &str = "x-vitrine-document-source";

const SOURCE: &str = "infra::http::preview::compose_preview";

pub(super) async fn compose_preview(
    State(service): State<Arc<PreviewService>>,
    body: Result<Json<PreviewRequestBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Malformed preview request",
                &rejection,
            )
            .into_response();
        }
    };

    let input = match PreviewInput::from_body(body) {
        Ok(input) => input,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid preview request",
                &err,
            )
            .into_response();
        }
    };

    match service.compose(input).await {
        Ok(document) => {
            let mut response = Html(document.html).into_response();
            let headers = response.headers_mut();
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            headers.insert(
                DOCUMENT_SOURCE_HEADER,
                HeaderValue::from_static(document.source.as_str()),
            );
            response
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}
