//! Local stand-in page served when the theme renderer cannot produce one.

use askama::Template;
use tracing::error;

use crate::{application::theme_vars::BrandPalette, domain::content::ContentStore};

pub const DEFAULT_TITLE: &str = "Your Product";
pub const DEFAULT_STORE_NAME: &str = "Your Store";
pub const DEFAULT_PRICE: &str = "49.00";
pub const HOVER_DARKEN_OFFSET: u8 = 30;

const MINIMAL_FALLBACK: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Preview</title></head><body><main><h1>Preview unavailable</h1></main></body></html>";

#[derive(Debug, Template)]
#[template(path = "preview/fallback.html")]
struct FallbackTemplate<'a> {
    title: &'a str,
    description: &'a str,
    price: &'a str,
    store_name: &'a str,
    images: &'a [String],
    primary: String,
    primary_hover: String,
    tertiary: String,
    font_family: String,
}

/// Inputs for [`build_fallback`]. Every field is optional; defaults fill gaps.
#[derive(Debug, Clone, Default)]
pub struct FallbackInput<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<String>,
    pub images: &'a [String],
    pub store_name: Option<&'a str>,
}

impl<'a> FallbackInput<'a> {
    pub fn from_content(content: &'a ContentStore, images: &'a [String]) -> Self {
        Self {
            title: content.product_title(),
            description: content.description(),
            price: content.price(),
            images,
            store_name: content.store_name(),
        }
    }
}

/// Build the fallback document. Never fails.
pub fn build_fallback(input: &FallbackInput<'_>, content: &ContentStore) -> String {
    let palette = BrandPalette::from_content(content);
    let price = display_price(input.price.as_deref().unwrap_or(DEFAULT_PRICE));

    let template = FallbackTemplate {
        title: input.title.unwrap_or(DEFAULT_TITLE),
        description: input.description.unwrap_or_default(),
        price: &price,
        store_name: input.store_name.unwrap_or(DEFAULT_STORE_NAME),
        images: input.images,
        primary: palette.primary.to_string(),
        primary_hover: palette.primary.darken_by(HOVER_DARKEN_OFFSET).to_string(),
        tertiary: palette.tertiary.to_string(),
        font_family: palette.font_family,
    };

    template.render().unwrap_or_else(|err| {
        error!(
            target = "vitrine::render::fallback",
            error = %err,
            "Fallback template failed to render"
        );
        MINIMAL_FALLBACK.to_string()
    })
}

fn display_price(price: &str) -> String {
    let price = price.trim();
    if price.starts_with(|c: char| c.is_ascii_digit()) {
        format!("${price}")
    } else {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(content: serde_json::Value, images: &[String]) -> String {
        let content = ContentStore::from_value(content);
        build_fallback(&FallbackInput::from_content(&content, images), &content)
    }

    #[test]
    fn empty_content_uses_literal_defaults() {
        let html = build(json!({}), &[]);
        assert!(html.contains(DEFAULT_TITLE));
        assert!(html.contains(DEFAULT_STORE_NAME));
        assert!(html.contains("$49.00"));
        assert!(html.contains("#6f6254"));
    }

    #[test]
    fn hover_color_darkens_each_channel_by_thirty() {
        let html = build(json!({"primary_color": "#6f6254"}), &[]);
        // (111, 98, 84) - 30 = (81, 68, 54)
        assert!(html.contains("#514436"));

        let html = build(json!({"primary_color": "#100a40"}), &[]);
        assert!(html.contains("#000022"));
    }

    #[test]
    fn content_values_are_rendered_and_escaped() {
        let images = vec!["https://cdn.example.com/a.jpg".to_string()];
        let html = build(
            json!({
                "product_title": "Mug <b>Deluxe</b>",
                "description": "Holds coffee",
                "price": 12.5,
                "store_name": "Kiln"
            }),
            &images,
        );
        assert!(
            html.contains("Mug &#60;b&#62;Deluxe&#60;/b&#62;") || html.contains("Mug &lt;b&gt;")
        );
        assert!(!html.contains("<b>Deluxe</b>"));
        assert!(html.contains("Holds coffee"));
        assert!(html.contains("$12.50"));
        assert!(html.contains("Kiln"));
        assert!(html.contains("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn non_numeric_price_is_kept_verbatim() {
        assert_eq!(display_price("€19"), "€19");
        assert_eq!(display_price(" 19.00 "), "$19.00");
    }
}
