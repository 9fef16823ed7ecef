use lol_html::{RewriteStrSettings, element, end_tag, html_content::ContentType, rewrite_str};
use tracing::warn;
use url::Url;

use crate::application::highlight;

pub const DEFAULT_ASSET_PREFIX: &str = "/theme-assets/";
pub const DEFAULT_ASSET_PROXY_PREFIX: &str = "/preview/assets/";

/// Script whose `defer` attribute is dropped so inline theme code can use it.
const UNDEFERRED_LIBRARY: &str = "jquery";

/// Post-processes renderer output into a document that works inside the
/// preview frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFinisher {
    asset_prefix: String,
    asset_proxy_prefix: String,
}

impl Default for PreviewFinisher {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_PREFIX, DEFAULT_ASSET_PROXY_PREFIX)
    }
}

impl PreviewFinisher {
    pub fn new(asset_prefix: impl Into<String>, asset_proxy_prefix: impl Into<String>) -> Self {
        Self {
            asset_prefix: asset_prefix.into(),
            asset_proxy_prefix: asset_proxy_prefix.into(),
        }
    }

    pub fn asset_proxy_prefix(&self) -> &str {
        &self.asset_proxy_prefix
    }

    /// Rewrite asset paths, undefer jQuery, then inject the theme variables,
    /// the optional `<base>` and the body scripts.
    pub fn finish(&self, html: &str, theme_css: &str, base_url: Option<&Url>) -> String {
        let proxied = self.rewrite_asset_paths(html);

        let style = format!("<style data-vitrine=\"theme-variables\">{theme_css}</style>");
        let base =
            base_url.map(|url| format!("<base href=\"{}\">", escape_attribute(url.as_str())));
        let scripts = highlight::body_scripts();

        let result = rewrite_str(
            &proxied,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("script[src]", |el| {
                        let is_library = el.get_attribute("src").is_some_and(|src| {
                            src.to_ascii_lowercase().contains(UNDEFERRED_LIBRARY)
                        });
                        if is_library {
                            el.remove_attribute("defer");
                        }
                        Ok(())
                    }),
                    element!("head", |el| {
                        if let Some(base) = &base {
                            el.prepend(base, ContentType::Html);
                        }
                        // Only an explicit `</head>` receives the style block.
                        let style = style.clone();
                        el.on_end_tag(end_tag!(move |end| {
                            end.before(&style, ContentType::Html);
                            Ok(())
                        }))
                    }),
                    element!("body", |el| {
                        el.prepend(scripts, ContentType::Html);
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::new()
            },
        );

        match result {
            Ok(finished) => finished,
            Err(err) => {
                warn!(
                    target = "vitrine::render::finisher",
                    error = %err,
                    "Injection pass failed; returning proxied html only"
                );
                proxied
            }
        }
    }

    fn rewrite_asset_paths(&self, html: &str) -> String {
        if self.asset_prefix.is_empty() || self.asset_prefix == self.asset_proxy_prefix {
            return html.to_string();
        }
        html.replace(&self.asset_prefix, &self.asset_proxy_prefix)
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><head><meta charset="utf-8"><link rel="stylesheet" href="/theme-assets/base.css"><script src="/theme-assets/jquery-3.7.1.min.js" defer></script><script src="/theme-assets/global.js" defer></script></head><body><div style="background:url(/theme-assets/hero.jpg)"></div></body></html>"#;

    fn finish(html: &str, base: Option<&str>) -> String {
        let base = base.map(|value| Url::parse(value).unwrap());
        PreviewFinisher::default().finish(html, ":root{--x:1}", base.as_ref())
    }

    #[test]
    fn asset_paths_are_proxied_everywhere() {
        let finished = finish(PAGE, None);
        assert!(!finished.contains("/theme-assets/"));
        assert!(finished.contains(r#"href="/preview/assets/base.css""#));
        assert!(finished.contains("url(/preview/assets/hero.jpg)"));
    }

    #[test]
    fn only_the_jquery_script_loses_defer() {
        let finished = finish(PAGE, None);
        assert!(finished.contains(r#"<script src="/preview/assets/jquery-3.7.1.min.js""#));
        assert!(!finished.contains(r#"jquery-3.7.1.min.js" defer"#));
        assert!(finished.contains(r#"<script src="/preview/assets/global.js" defer>"#));
    }

    #[test]
    fn style_block_lands_before_closing_head() {
        let finished = finish(PAGE, None);
        let block = r#"<style data-vitrine="theme-variables">:root{--x:1}</style>"#;
        assert_eq!(finished.matches(block).count(), 1);
        assert!(finished.contains(&format!("{block}</head>")));
    }

    #[test]
    fn unclosed_head_skips_style_injection() {
        let finished = finish(
            "<html><head><title>t</title><body><p>x</p></body></html>",
            None,
        );
        assert!(!finished.contains("theme-variables"));
        assert!(finished.contains("<p>x</p>"));
    }

    #[test]
    fn missing_head_skips_style_injection() {
        let finished = finish("<body><p>hi</p></body>", None);
        assert!(!finished.contains("theme-variables"));
        assert!(!finished.contains("<head"));
        assert!(finished.contains("data-vitrine=\"highlight\""));
    }

    #[test]
    fn base_tag_is_first_child_of_head_case_insensitively() {
        let finished = finish(
            "<HTML><HEAD><title>t</title></HEAD><BODY></BODY></HTML>",
            Some("https://preview.example.com/"),
        );
        assert!(finished.contains(r#"<HEAD><base href="https://preview.example.com/"><title>"#));
    }

    #[test]
    fn base_tag_is_omitted_without_base_url() {
        assert!(!finish(PAGE, None).contains("<base"));
    }

    #[test]
    fn body_scripts_are_first_children_in_order() {
        let finished = finish(PAGE, None);
        let body = finished.find("<body>").unwrap() + "<body>".len();
        assert!(finished[body..].starts_with("<script data-vitrine=\"script-ready\">"));
        let client = finished.find("<script data-vitrine=\"highlight\">").unwrap();
        let content = finished.find("<div style=").unwrap();
        assert!(body < client && client < content);
    }

    #[test]
    fn base_href_is_attribute_escaped() {
        assert_eq!(escape_attribute(r#"a"b&c"#), "a&quot;b&amp;c");
    }
}
