//! Theme-wide settings (`config/settings_data.json`, `current` object).

use serde_json::{Map, Value};

use super::color::Rgb;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThemeSettings {
    values: Map<String, Value>,
}

impl ThemeSettings {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Accepts either the whole `settings_data.json` document (reads `current`)
    /// or the `current` object itself. A string-valued `current` names a preset
    /// under `presets`.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            return Self::default();
        };
        match root.remove("current") {
            Some(Value::Object(values)) => Self { values },
            Some(Value::String(preset)) => {
                let values = root
                    .get("presets")
                    .and_then(|presets| presets.get(&preset))
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                Self { values }
            }
            Some(_) => Self::default(),
            None => Self { values: root },
        }
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// A colour inside `color_schemes.<scheme>.settings.<key>`.
    pub fn scheme_color(&self, scheme: &str, key: &str) -> Option<Rgb> {
        self.values
            .get("color_schemes")?
            .get(scheme)?
            .get("settings")?
            .get(key)?
            .as_str()
            .and_then(Rgb::parse_hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_current_object() {
        let settings = ThemeSettings::from_value(json!({"current": {"page_width": 1400}}));
        assert_eq!(settings.number("page_width"), Some(1400.0));
    }

    #[test]
    fn resolves_named_preset() {
        let settings = ThemeSettings::from_value(json!({
            "current": "Default",
            "presets": {"Default": {"buttons_radius": "6"}}
        }));
        assert_eq!(settings.number("buttons_radius"), Some(6.0));
    }

    #[test]
    fn reads_scheme_colors() {
        let settings = ThemeSettings::from_value(json!({
            "current": {
                "color_schemes": {
                    "scheme-4": {"settings": {"background": "#36454F"}}
                }
            }
        }));
        assert_eq!(
            settings.scheme_color("scheme-4", "background"),
            Some(Rgb::new(0x36, 0x45, 0x4f))
        );
        assert_eq!(settings.scheme_color("scheme-1", "background"), None);
    }

    #[test]
    fn non_object_is_empty() {
        assert!(ThemeSettings::from_value(json!(3)).values().is_empty());
    }
}
