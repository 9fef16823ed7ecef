//! The AI-authored content store and its defaulting accessors.
//!
//! Every read is total: absent or mistyped fields yield `None`, an empty list,
//! or the caller's default, never an error.

use serde_json::{Map, Value};

pub const HIDDEN_SECTIONS_KEY: &str = "hiddenSections";
pub const SECTION_ORDER_KEY: &str = "sectionOrder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentStore {
    fields: Map<String, Value>,
}

impl ContentStore {
    /// Wrap a JSON value. Anything other than an object becomes an empty store.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Trimmed, non-empty string field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// A list of strings. Object entries contribute their `src` or `url`.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        let Some(Value::Array(items)) = self.fields.get(key) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(value) => Some(value.trim()),
                Value::Object(map) => map
                    .get("src")
                    .or_else(|| map.get("url"))
                    .and_then(Value::as_str)
                    .map(str::trim),
                _ => None,
            })
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn hidden_sections(&self) -> Vec<String> {
        self.string_list(HIDDEN_SECTIONS_KEY)
    }

    pub fn section_order(&self) -> Vec<String> {
        self.string_list(SECTION_ORDER_KEY)
    }

    pub fn store_name(&self) -> Option<&str> {
        self.text("store_name")
    }

    pub fn product_title(&self) -> Option<&str> {
        self.text("product_title").or_else(|| self.text("title"))
    }

    pub fn description(&self) -> Option<&str> {
        self.text("product_description")
            .or_else(|| self.text("description"))
    }

    /// Price as display text. Numbers are formatted with two decimals.
    pub fn price(&self) -> Option<String> {
        match self.fields.get("price")? {
            Value::String(value) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(number) => number.as_f64().map(|value| format!("{value:.2}")),
            _ => None,
        }
    }

    pub fn images(&self) -> Vec<String> {
        self.string_list("images")
    }

    pub fn primary_color(&self) -> Option<&str> {
        self.text("primary_color")
    }

    pub fn tertiary_color(&self) -> Option<&str> {
        self.text("tertiary_color")
    }

    pub fn color_scheme(&self) -> ColorScheme {
        match self.text("color_scheme") {
            Some(value) if value.eq_ignore_ascii_case("dark") => ColorScheme::Dark,
            _ => ColorScheme::Light,
        }
    }

    /// Font family, preferring the explicit override field.
    pub fn font_family(&self) -> Option<&str> {
        self.text("font_family_override")
            .or_else(|| self.text("font_family"))
    }
}

impl From<Value> for ContentStore {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_input_is_empty() {
        let store = ContentStore::from_value(json!(["not", "an", "object"]));
        assert!(store.fields().is_empty());
        assert!(store.hidden_sections().is_empty());
        assert_eq!(store.color_scheme(), ColorScheme::Light);
    }

    #[test]
    fn string_list_accepts_objects_with_src_or_url() {
        let store = ContentStore::from_value(json!({
            "images": ["a.jpg", {"src": "b.jpg"}, {"url": "c.jpg"}, 7, " ", {"alt": "x"}]
        }));
        assert_eq!(store.images(), ["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn price_formats_numbers_and_keeps_strings() {
        let numeric = ContentStore::from_value(json!({"price": 19.5}));
        assert_eq!(numeric.price().as_deref(), Some("19.50"));
        let text = ContentStore::from_value(json!({"price": " $24 "}));
        assert_eq!(text.price().as_deref(), Some("$24"));
        let missing = ContentStore::from_value(json!({"price": null}));
        assert_eq!(missing.price(), None);
    }

    #[test]
    fn font_override_wins() {
        let store = ContentStore::from_value(json!({
            "font_family": "Lato",
            "font_family_override": "Playfair Display"
        }));
        assert_eq!(store.font_family(), Some("Playfair Display"));
        let plain = ContentStore::from_value(json!({"font_family": "Lato", "font_family_override": ""}));
        assert_eq!(plain.font_family(), Some("Lato"));
    }

    #[test]
    fn control_lists_use_editor_keys() {
        let store = ContentStore::from_value(json!({
            "hiddenSections": ["faq"],
            "sectionOrder": ["hero", "faq"]
        }));
        assert_eq!(store.hidden_sections(), ["faq"]);
        assert_eq!(store.section_order(), ["hero", "faq"]);
    }

    #[test]
    fn dark_scheme_is_case_insensitive() {
        let store = ContentStore::from_value(json!({"color_scheme": "DARK"}));
        assert_eq!(store.color_scheme(), ColorScheme::Dark);
    }
}
