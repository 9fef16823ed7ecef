//! Editor-facing section names and the template types they may stand for.

use super::matching::{SEGMENT_STRATEGIES, normalize, ranked_match};

/// Logical name → template type patterns. Patterns are normalised and are
/// matched by equality or segment prefix, never by substring.
const TYPE_ALIASES: &[(&str, &[&str])] = &[
    ("announcement-bar", &["announcement-bar", "announcement"]),
    ("header", &["header"]),
    ("hero", &["image-banner", "hero", "slideshow", "pdp-hero"]),
    (
        "product-info",
        &["main-product", "product-information", "pdp-main"],
    ),
    ("what-makes-us-different", &["pdp-benefits", "benefits"]),
    ("benefits", &["pdp-benefits", "benefits"]),
    ("how-it-works", &["how-it-works", "pdp-steps"]),
    (
        "testimonials",
        &["testimonials", "pdp-testimonials", "reviews"],
    ),
    ("marquee", &["marquee", "scrolling-text"]),
    (
        "comparison",
        &["comparison-table", "pdp-comparison", "comparison"],
    ),
    ("faq", &["faq", "collapsible-content", "pdp-faq"]),
    ("guarantee", &["guarantee", "pdp-guarantee"]),
    ("featured-products", &["featured-collection", "related-products"]),
    ("newsletter", &["newsletter", "email-signup"]),
    ("footer", &["footer"]),
];

/// Section types that always render ahead of everything else.
const HEADER_TYPES: &[&str] = &["announcement-bar", "announcement", "header"];

/// Static, read-only alias table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeAliasTable;

impl TypeAliasTable {
    #[cfg(test)]
    pub(crate) fn logical_names(&self) -> impl Iterator<Item = &'static str> {
        TYPE_ALIASES.iter().map(|(name, _)| *name)
    }

    /// Alias patterns registered for `logical_name`; empty when unknown.
    pub fn aliases(&self, logical_name: &str) -> &'static [&'static str] {
        let key = normalize(logical_name);
        TYPE_ALIASES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, types)| *types)
            .unwrap_or(&[])
    }

    /// Normalised match candidates for a logical name: its aliases followed by
    /// the name itself, since a logical name may coincide with a real type.
    pub fn candidates(&self, logical_name: &str) -> Vec<String> {
        let own = normalize(logical_name);
        let mut candidates: Vec<String> = self
            .aliases(logical_name)
            .iter()
            .map(|alias| normalize(alias))
            .collect();
        if !own.is_empty() && !candidates.contains(&own) {
            candidates.push(own);
        }
        candidates
    }

    /// Whether `section_type` belongs to the fixed header group.
    pub fn is_header_type(&self, section_type: &str) -> bool {
        let subject = normalize(section_type);
        HEADER_TYPES
            .iter()
            .any(|header| ranked_match(&subject, header, SEGMENT_STRATEGIES).is_some())
    }

    /// Whether `section_type` is a product information section.
    pub fn is_product_type(&self, section_type: &str) -> bool {
        let subject = normalize(section_type);
        self.aliases("product-info")
            .iter()
            .any(|pattern| ranked_match(&subject, pattern, SEGMENT_STRATEGIES).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_include_aliases_then_own_name() {
        let table = TypeAliasTable;
        assert_eq!(
            table.candidates("what-makes-us-different"),
            ["pdp-benefits", "benefits", "what-makes-us-different"]
        );
    }

    #[test]
    fn unknown_name_is_its_own_candidate() {
        let table = TypeAliasTable;
        assert!(table.aliases("rich_text").is_empty());
        assert_eq!(table.candidates("Rich_Text"), ["rich-text"]);
    }

    #[test]
    fn own_name_is_not_repeated() {
        assert_eq!(TypeAliasTable.candidates("header"), ["header"]);
    }

    #[test]
    fn header_detection_uses_segments() {
        let table = TypeAliasTable;
        assert!(table.is_header_type("announcement-bar"));
        assert!(table.is_header_type("header_aX9"));
        assert!(!table.is_header_type("pdp-header-image"));
    }

    #[test]
    fn product_detection_accepts_suffixed_types() {
        assert!(TypeAliasTable.is_product_type("main-product"));
        assert!(TypeAliasTable.is_product_type("pdp_main_k2"));
        assert!(!TypeAliasTable.is_product_type("featured-collection"));
    }
}
