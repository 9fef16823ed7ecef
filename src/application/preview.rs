//! Preview composition: template → resolved sections → render → document.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;
use url::Url;
use vitrine_protocol::PreviewRequestBody;

use crate::application::{
    compositor::{ContentCompositor, compose_sections},
    render::{
        FallbackInput, GlobalContext, PreviewFinisher, ProductContext, RenderInvoker,
        RenderOutcome, RenderRequest, ShopContext, build_fallback,
    },
    resolver::SectionResolver,
    sources::{TemplateLoadError, TemplateSource},
    theme_vars::ThemeVariableSynthesizer,
};
use crate::domain::{content::ContentStore, error::DomainError, template::InstanceId};

pub const DEFAULT_PAGE_TYPE: &str = "product";

/// Validated preview request.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewInput {
    pub theme: String,
    pub page_type: Option<String>,
    pub content: ContentStore,
    pub images: Vec<String>,
    pub base_url: Option<Url>,
}

impl PreviewInput {
    pub fn new(theme: impl Into<String>, content: ContentStore) -> Self {
        Self {
            theme: theme.into(),
            page_type: None,
            content,
            images: Vec::new(),
            base_url: None,
        }
    }

    pub fn from_body(body: PreviewRequestBody) -> Result<Self, DomainError> {
        let theme = body.theme.trim().to_string();
        if theme.is_empty() {
            return Err(DomainError::validation("theme must not be empty"));
        }

        let content = match body.content {
            Value::Null => ContentStore::default(),
            value @ Value::Object(_) => ContentStore::from_value(value),
            _ => return Err(DomainError::validation("content must be a JSON object")),
        };

        let base_url = body
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(parse_base_url)
            .transpose()?;

        let page_type = body
            .page_type
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            theme,
            page_type,
            content,
            images: body.images,
            base_url,
        })
    }
}

fn parse_base_url(value: &str) -> Result<Url, DomainError> {
    let url = Url::parse(value)
        .map_err(|err| DomainError::validation(format!("base_url `{value}` is invalid: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(DomainError::validation(format!(
            "base_url must use http or https, got `{scheme}`"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    Rendered,
    Fallback,
}

impl DocumentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentSource::Rendered => "rendered",
            DocumentSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewDocument {
    pub html: String,
    pub source: DocumentSource,
    pub attempts: u32,
    pub sections: Vec<InstanceId>,
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("unknown theme `{0}`")]
    UnknownTheme(String),
    #[error(transparent)]
    Template(#[from] TemplateLoadError),
}

#[derive(Clone)]
pub struct PreviewService {
    templates: Arc<dyn TemplateSource>,
    compositor: Arc<dyn ContentCompositor>,
    invoker: RenderInvoker,
    finisher: PreviewFinisher,
    resolver: SectionResolver,
    synthesizer: ThemeVariableSynthesizer,
    default_page_type: String,
}

impl PreviewService {
    pub fn new(
        templates: Arc<dyn TemplateSource>,
        compositor: Arc<dyn ContentCompositor>,
        invoker: RenderInvoker,
        finisher: PreviewFinisher,
    ) -> Self {
        Self {
            templates,
            compositor,
            invoker,
            finisher,
            resolver: SectionResolver::default(),
            synthesizer: ThemeVariableSynthesizer,
            default_page_type: DEFAULT_PAGE_TYPE.to_string(),
        }
    }

    pub fn with_default_page_type(mut self, page_type: impl Into<String>) -> Self {
        self.default_page_type = page_type.into();
        self
    }

    pub fn finisher(&self) -> &PreviewFinisher {
        &self.finisher
    }

    /// Compose one preview document. Renderer trouble never fails the call;
    /// only unusable input or an unknown theme does.
    pub async fn compose(&self, input: PreviewInput) -> Result<PreviewDocument, PreviewError> {
        let theme = input.theme.as_str();
        if !self.templates.theme_exists(theme).await? {
            return Err(PreviewError::UnknownTheme(theme.to_string()));
        }
        let page_type = input
            .page_type
            .as_deref()
            .unwrap_or(&self.default_page_type);

        let template = self.templates.load_template(theme, page_type).await?;
        let theme_settings = self.templates.load_theme_settings(theme).await?;

        let content = self.compositor.migrate(input.content);
        let resolved = self.resolver.resolve(
            &template,
            &content.hidden_sections(),
            &content.section_order(),
        );

        let images = self.compositor.distribute_images(&content, &input.images);
        let sections = compose_sections(
            &template,
            &resolved,
            &content,
            &images,
            self.compositor.as_ref(),
        );
        let theme_css = self.synthesizer.synthesize(&content, &theme_settings);

        let product_images = if input.images.is_empty() {
            content.images()
        } else {
            input.images.clone()
        };
        let context = GlobalContext {
            shop: ShopContext {
                name: content.store_name().map(str::to_string),
            },
            product: ProductContext {
                title: content.product_title().map(str::to_string),
                description: content.description().map(str::to_string),
                price: content.price(),
                images: product_images.clone(),
            },
            images,
            settings: theme_settings.values().clone(),
            theme_css: theme_css.clone(),
        };
        let request = RenderRequest::new(self.templates.theme_path(theme), sections, context);

        let (html, source, attempts) = match self.invoker.invoke(&request).await {
            RenderOutcome::Rendered { html, attempts } => (
                self.finisher.finish(&html, &theme_css, input.base_url.as_ref()),
                DocumentSource::Rendered,
                attempts,
            ),
            RenderOutcome::Fallback { attempts, .. } => (
                build_fallback(
                    &FallbackInput::from_content(&content, &product_images),
                    &content,
                ),
                DocumentSource::Fallback,
                attempts,
            ),
        };

        info!(
            target = "vitrine::preview",
            theme,
            page_type,
            sections = resolved.len(),
            source = source.as_str(),
            attempts,
            html_len = html.len(),
            "Preview composed"
        );

        Ok(PreviewDocument {
            html,
            source,
            attempts,
            sections: resolved,
        })
    }
}
