use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::application::compositor::{ComposedSection, DistributedImages};

pub const THEME_LAYOUT: &str = "theme";

/// Body of `POST {renderer}/render-theme`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub theme_path: String,
    pub layout: String,
    pub sections: Vec<ComposedSection>,
    pub context: GlobalContext,
}

impl RenderRequest {
    pub fn new(
        theme_path: impl Into<String>,
        sections: Vec<ComposedSection>,
        context: GlobalContext,
    ) -> Self {
        Self {
            theme_path: theme_path.into(),
            layout: THEME_LAYOUT.to_string(),
            sections,
            context,
        }
    }
}

/// Page-wide values the renderer exposes to every section.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct GlobalContext {
    pub shop: ShopContext,
    pub product: ProductContext,
    pub images: DistributedImages,
    /// Theme settings merged from `settings_data.json`.
    pub settings: Map<String, Value>,
    /// Custom properties produced by the theme variable synthesizer.
    pub theme_css: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ShopContext {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ProductContext {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub images: Vec<String>,
}

/// Parsed success body. Anything that fails to parse into this shape is an
/// invalid response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderResponse {
    pub success: bool,
    #[serde(default)]
    pub html: Option<String>,
}

/// Raw HTTP exchange with the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: String,
}

impl BackendReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not connect to renderer: {0}")]
    Connect(String),
    #[error("renderer request timed out")]
    Timeout,
    #[error("renderer connection interrupted: {0}")]
    Interrupted(String),
    #[error("renderer request could not be built: {0}")]
    Request(String),
}

/// Closed classification consulted by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
    Unknown,
}

impl FailureClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureClass::Transient)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::Transient => "transient",
            FailureClass::Permanent => "permanent",
            FailureClass::Unknown => "unknown",
        }
    }
}

/// Why a render call degraded to the fallback document.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderFailure {
    #[error("transport failure ({}): {error}", class.as_str())]
    Transport {
        class: FailureClass,
        error: TransportError,
    },
    #[error("renderer answered {status} ({})", class.as_str())]
    Status { status: u16, class: FailureClass },
    #[error("invalid renderer response: {reason}")]
    InvalidResponse { reason: String },
}

impl RenderFailure {
    pub fn class(&self) -> FailureClass {
        match self {
            RenderFailure::Transport { class, .. } | RenderFailure::Status { class, .. } => *class,
            RenderFailure::InvalidResponse { .. } => FailureClass::Permanent,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}

/// The external theme renderer. Implementations perform exactly one exchange
/// per call; retrying is the invoker's job.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn render_theme(&self, request: &RenderRequest) -> Result<BackendReply, TransportError>;
}
