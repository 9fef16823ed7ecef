//! In-page highlight client injected into every rendered preview.
//!
//! The browser side lives in `static/preview/`. The per-type selector table is
//! kept here and serialized into the client when it is first assembled.

use std::collections::BTreeMap;

use include_dir::{Dir, include_dir};
use once_cell::sync::Lazy;
use tracing::error;

pub static PREVIEW_SCRIPTS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static/preview");

pub const HIGHLIGHT_SCRIPT: &str = "highlight.js";
pub const SCRIPT_READY_SCRIPT: &str = "script-ready.js";

const SELECTOR_TABLE_PLACEHOLDER: &str = "__VITRINE_SELECTOR_TABLE__";

/// CSS selectors tried, in order, for each logical section type.
pub const SELECTOR_TABLE: &[(&str, &[&str])] = &[
    (
        "announcement-bar",
        &[".announcement-bar", "[id*='announcement-bar']", ".utility-bar"],
    ),
    ("header", &["header.header", "sticky-header", ".section-header"]),
    (
        "hero",
        &[".banner", ".image-banner", "slideshow-component", ".slideshow", ".hero"],
    ),
    (
        "product-info",
        &["product-info", ".product__info-wrapper", ".product", "[id*='main-product']"],
    ),
    ("benefits", &[".pdp-benefits", ".benefits", "[id*='benefits']"]),
    (
        "what-makes-us-different",
        &[".pdp-benefits", ".benefits", "[id*='benefits']"],
    ),
    ("how-it-works", &[".how-it-works", ".pdp-steps", "[id*='how-it-works']"]),
    (
        "testimonials",
        &[".testimonials", ".pdp-testimonials", ".reviews"],
    ),
    ("marquee", &[".marquee", ".scrolling-text", "[id*='scrolling-text']"]),
    (
        "comparison",
        &[".comparison-table", ".pdp-comparison", "[id*='comparison']"],
    ),
    ("faq", &[".faq", ".collapsible-content", "[id*='collapsible']"]),
    ("guarantee", &[".guarantee", ".pdp-guarantee"]),
    (
        "featured-products",
        &[".featured-collection", "product-recommendations", ".related-products"],
    ),
    ("newsletter", &[".newsletter", ".email-signup", "[id*='newsletter']"]),
    ("footer", &["footer.footer", ".footer", "[id*='footer']"]),
];

/// Selector table as a JSON object safe to embed in a `<script>` element.
pub fn selector_table_json() -> String {
    let table: BTreeMap<&str, &[&str]> = SELECTOR_TABLE.iter().copied().collect();
    let json = serde_json::to_string(&table).unwrap_or_else(|err| {
        error!(
            target = "vitrine::highlight",
            error = %err,
            "Selector table could not be serialized"
        );
        "{}".to_string()
    });
    json.replace("</", "<\\/")
}

fn embedded_script(name: &str) -> &'static str {
    PREVIEW_SCRIPTS
        .get_file(name)
        .and_then(|file| file.contents_utf8())
        .unwrap_or_default()
}

static BODY_SCRIPTS: Lazy<String> = Lazy::new(|| {
    let ready = embedded_script(SCRIPT_READY_SCRIPT);
    let client = embedded_script(HIGHLIGHT_SCRIPT)
        .replace(SELECTOR_TABLE_PLACEHOLDER, &selector_table_json());
    format!(
        "<script data-vitrine=\"script-ready\">{ready}</script><script data-vitrine=\"highlight\">{client}</script>"
    )
});

/// The jQuery-ready polyfill followed by the highlight client, as markup
/// ready to prepend to `<body>`.
pub fn body_scripts() -> &'static str {
    BODY_SCRIPTS.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_scripts_are_embedded() {
        assert!(!embedded_script(HIGHLIGHT_SCRIPT).is_empty());
        assert!(embedded_script(SCRIPT_READY_SCRIPT).contains("5000"));
    }

    #[test]
    fn polyfill_precedes_client_and_placeholder_is_filled() {
        let scripts = body_scripts();
        let ready = scripts.find("data-vitrine=\"script-ready\"").unwrap();
        let client = scripts.find("data-vitrine=\"highlight\"").unwrap();
        assert!(ready < client);
        assert!(!scripts.contains(SELECTOR_TABLE_PLACEHOLDER));
        assert!(scripts.contains("\"faq\":[\".faq\""));
    }

    #[test]
    fn client_speaks_the_three_message_kinds() {
        let client = embedded_script(HIGHLIGHT_SCRIPT);
        for kind in ["scrollToSection", "highlightInput", "clearHighlight"] {
            assert!(client.contains(kind), "missing {kind}");
        }
        assert!(!client.contains("scrollIntoView("));
        assert!(client.contains("requestAnimationFrame"));
    }

    #[test]
    fn selector_table_covers_every_alias_name() {
        use crate::domain::aliases::TypeAliasTable;
        for name in TypeAliasTable.logical_names() {
            let selectors = SELECTOR_TABLE
                .iter()
                .find(|(entry, _)| *entry == name)
                .map(|(_, selectors)| *selectors);
            assert!(selectors.is_some_and(|s| !s.is_empty()), "no selectors for {name}");
        }
    }

    #[test]
    fn selector_json_cannot_close_script() {
        assert!(!selector_table_json().contains("</"));
    }
}
