//! Remote theme rendering and the documents built around it.
//!
//! The renderer is a best-effort dependency: [`RenderInvoker`] retries
//! transient failures a bounded number of times and otherwise degrades, so
//! callers always end up with either a finished theme render
//! ([`PreviewFinisher`]) or the local [`build_fallback`] page.

mod classify;
mod fallback;
mod finisher;
mod invoker;
mod types;

pub use classify::{classify_error_body, classify_transport};
pub use fallback::{
    DEFAULT_PRICE, DEFAULT_STORE_NAME, DEFAULT_TITLE, FallbackInput, HOVER_DARKEN_OFFSET,
    build_fallback,
};
pub use finisher::{DEFAULT_ASSET_PREFIX, DEFAULT_ASSET_PROXY_PREFIX, PreviewFinisher};
pub use invoker::{
    METRIC_RENDER_ATTEMPT_TOTAL, METRIC_RENDER_FALLBACK_TOTAL, METRIC_RENDER_MS,
    METRIC_RENDER_RETRY_TOTAL, RenderInvoker, RenderOutcome, RetryPolicy,
};
pub use types::{
    BackendReply, FailureClass, GlobalContext, ProductContext, RenderBackend, RenderFailure,
    RenderRequest, RenderResponse, ShopContext, THEME_LAYOUT, TransportError,
};
