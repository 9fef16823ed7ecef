//! CSS custom-property sheet for a preview.
//!
//! The sheet is built from the AI-chosen brand colours and font, the theme's
//! own settings, and fixed fallbacks, in that order of precedence. The output
//! depends only on its inputs, so repeated calls are byte-identical.

use std::fmt::Write;

use crate::domain::{
    color::Rgb,
    content::{ColorScheme, ContentStore},
    theme_settings::ThemeSettings,
};

pub const DEFAULT_PRIMARY: Rgb = Rgb::new(0x6f, 0x62, 0x54);
pub const DEFAULT_TERTIARY: Rgb = Rgb::new(0xf3, 0xef, 0xe8);
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

pub const LIGHT_HIGHLIGHT_FACTOR: f64 = 0.85;
pub const DARK_HIGHLIGHT_FACTOR: f64 = 0.30;

const INK: Rgb = Rgb::new(0x12, 0x12, 0x12);

/// Brand inputs distilled from the content store.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandPalette {
    pub primary: Rgb,
    pub tertiary: Rgb,
    pub scheme: ColorScheme,
    pub font_family: String,
}

impl BrandPalette {
    pub fn from_content(content: &ContentStore) -> Self {
        let primary = content
            .primary_color()
            .and_then(Rgb::parse_hex)
            .unwrap_or(DEFAULT_PRIMARY);
        let tertiary = content
            .tertiary_color()
            .and_then(Rgb::parse_hex)
            .unwrap_or(DEFAULT_TERTIARY);
        let font_family = content
            .font_family()
            .map(sanitize_font_family)
            .filter(|family| !family.is_empty())
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string());

        Self {
            primary,
            tertiary,
            scheme: content.color_scheme(),
            font_family,
        }
    }

    /// Primary colour blended toward white; lighter for light schemes.
    pub fn inner_highlight(&self) -> Rgb {
        let factor = match self.scheme {
            ColorScheme::Light => LIGHT_HIGHLIGHT_FACTOR,
            ColorScheme::Dark => DARK_HIGHLIGHT_FACTOR,
        };
        self.primary.lighten(factor)
    }
}

/// Keep only characters that cannot terminate a declaration or the style block.
fn sanitize_font_family(family: &str) -> String {
    family
        .chars()
        .filter(|ch| ch.is_alphanumeric() || matches!(ch, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

struct SchemeColors {
    background: Rgb,
    foreground: Rgb,
    button: Rgb,
    button_label: Rgb,
    secondary_button_label: Rgb,
    shadow: Rgb,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeVariableSynthesizer;

impl ThemeVariableSynthesizer {
    pub fn synthesize(&self, content: &ContentStore, theme: &ThemeSettings) -> String {
        let palette = BrandPalette::from_content(content);
        let mut css = String::with_capacity(4096);

        write_root(&mut css, &palette, theme);
        for (index, scheme) in scheme_colors(&palette, theme).iter().enumerate() {
            write_scheme(&mut css, index + 1, scheme);
        }

        css
    }
}

fn scheme_colors(palette: &BrandPalette, theme: &ThemeSettings) -> [SchemeColors; 5] {
    let (base_background, base_foreground) = match palette.scheme {
        ColorScheme::Light => (palette.tertiary, INK),
        ColorScheme::Dark => (INK, Rgb::WHITE),
    };
    let neutral = |scheme: &str, key: &str, fallback: Rgb| {
        theme.scheme_color(scheme, key).unwrap_or(fallback)
    };

    [
        SchemeColors {
            background: base_background,
            foreground: base_foreground,
            button: palette.primary,
            button_label: Rgb::WHITE,
            secondary_button_label: palette.primary,
            shadow: neutral("scheme-1", "shadow", INK),
        },
        SchemeColors {
            background: palette.inner_highlight(),
            foreground: neutral("scheme-2", "text", INK),
            button: palette.primary,
            button_label: Rgb::WHITE,
            secondary_button_label: palette.primary,
            shadow: neutral("scheme-2", "shadow", INK),
        },
        SchemeColors {
            background: palette.primary,
            foreground: Rgb::WHITE,
            button: Rgb::WHITE,
            button_label: palette.primary,
            secondary_button_label: Rgb::WHITE,
            shadow: neutral("scheme-3", "shadow", INK),
        },
        SchemeColors {
            background: neutral("scheme-4", "background", INK),
            foreground: neutral("scheme-4", "text", Rgb::WHITE),
            button: palette.primary,
            button_label: Rgb::WHITE,
            secondary_button_label: Rgb::WHITE,
            shadow: neutral("scheme-4", "shadow", INK),
        },
        SchemeColors {
            background: neutral("scheme-5", "background", Rgb::WHITE),
            foreground: neutral("scheme-5", "text", INK),
            button: palette.primary,
            button_label: Rgb::WHITE,
            secondary_button_label: palette.primary,
            shadow: neutral("scheme-5", "shadow", INK),
        },
    ]
}

fn setting(theme: &ThemeSettings, key: &str, fallback: f64) -> f64 {
    theme.number(key).unwrap_or(fallback)
}

fn write_root(css: &mut String, palette: &BrandPalette, theme: &ThemeSettings) {
    let body_scale = setting(theme, "body_scale", 100.0) / 100.0;
    let heading_scale = setting(theme, "heading_scale", 100.0) / 100.0;
    let page_width = setting(theme, "page_width", 1200.0) / 10.0;
    let spacing_sections = setting(theme, "spacing_sections", 0.0);
    let grid_horizontal = setting(theme, "spacing_grid_horizontal", 8.0);
    let grid_vertical = setting(theme, "spacing_grid_vertical", 8.0);
    let buttons_radius = setting(theme, "buttons_radius", 0.0);
    let buttons_border = setting(theme, "buttons_border_thickness", 1.0);
    let buttons_shadow = setting(theme, "buttons_shadow_opacity", 0.0) / 100.0;
    let card_radius = setting(theme, "card_corner_radius", 0.0) / 10.0;
    let card_shadow = setting(theme, "card_shadow_opacity", 0.0) / 100.0;
    let media_radius = setting(theme, "media_radius", 0.0);
    let popup_radius = setting(theme, "popup_corner_radius", 0.0);
    let popup_shadow = setting(theme, "popup_shadow_opacity", 5.0) / 100.0;

    let _ = writeln!(css, ":root {{");
    let _ = writeln!(
        css,
        "  --font-body-family: \"{}\", sans-serif;",
        palette.font_family
    );
    let _ = writeln!(css, "  --font-body-style: normal;");
    let _ = writeln!(css, "  --font-body-weight: 400;");
    let _ = writeln!(css, "  --font-body-weight-bold: 700;");
    let _ = writeln!(
        css,
        "  --font-heading-family: \"{}\", sans-serif;",
        palette.font_family
    );
    let _ = writeln!(css, "  --font-heading-style: normal;");
    let _ = writeln!(css, "  --font-heading-weight: 600;");
    let _ = writeln!(css, "  --font-body-scale: {body_scale};");
    let _ = writeln!(css, "  --font-heading-scale: {heading_scale};");
    let _ = writeln!(css, "  --color-brand-primary: {};", palette.primary);
    let _ = writeln!(css, "  --color-brand-tertiary: {};", palette.tertiary);
    let _ = writeln!(
        css,
        "  --color-inner-highlight: {};",
        palette.inner_highlight()
    );
    let _ = writeln!(css, "  --page-width: {page_width}rem;");
    let _ = writeln!(css, "  --page-width-margin: 0rem;");
    let _ = writeln!(css, "  --spacing-sections-desktop: {spacing_sections}px;");
    let _ = writeln!(
        css,
        "  --spacing-sections-mobile: {}px;",
        (spacing_sections * 0.7).round()
    );
    let _ = writeln!(css, "  --grid-desktop-horizontal-spacing: {grid_horizontal}px;");
    let _ = writeln!(css, "  --grid-desktop-vertical-spacing: {grid_vertical}px;");
    let _ = writeln!(
        css,
        "  --grid-mobile-horizontal-spacing: {}px;",
        (grid_horizontal / 2.0).round()
    );
    let _ = writeln!(
        css,
        "  --grid-mobile-vertical-spacing: {}px;",
        (grid_vertical / 2.0).round()
    );
    let _ = writeln!(css, "  --buttons-radius: {buttons_radius}px;");
    let _ = writeln!(css, "  --buttons-border-width: {buttons_border}px;");
    let _ = writeln!(css, "  --buttons-shadow-opacity: {buttons_shadow};");
    let _ = writeln!(css, "  --card-corner-radius: {card_radius}rem;");
    let _ = writeln!(css, "  --card-shadow-opacity: {card_shadow};");
    let _ = writeln!(css, "  --media-radius: {media_radius}px;");
    let _ = writeln!(css, "  --popup-corner-radius: {popup_radius}px;");
    let _ = writeln!(css, "  --popup-shadow-opacity: {popup_shadow};");
    let _ = writeln!(css, "}}");
}

fn write_scheme(css: &mut String, index: usize, scheme: &SchemeColors) {
    if index == 1 {
        let _ = writeln!(css, ":root,");
    }
    let _ = writeln!(css, ".color-scheme-{index} {{");
    let _ = writeln!(
        css,
        "  --color-background: {};",
        scheme.background.channels()
    );
    let _ = writeln!(
        css,
        "  --color-foreground: {};",
        scheme.foreground.channels()
    );
    let _ = writeln!(css, "  --color-button: {};", scheme.button.channels());
    let _ = writeln!(
        css,
        "  --color-button-text: {};",
        scheme.button_label.channels()
    );
    let _ = writeln!(
        css,
        "  --color-secondary-button-text: {};",
        scheme.secondary_button_label.channels()
    );
    let _ = writeln!(css, "  --color-shadow: {};", scheme.shadow.channels());
    let _ = writeln!(css, "  --color-link: {};", scheme.foreground.channels());
    let _ = writeln!(css, "}}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: serde_json::Value) -> ContentStore {
        ContentStore::from_value(value)
    }

    #[test]
    fn synthesize_is_pure() {
        let store = content(json!({"primary_color": "#336699", "font_family": "Lato"}));
        let theme = ThemeSettings::from_value(json!({"current": {"page_width": 1400}}));
        let synthesizer = ThemeVariableSynthesizer;
        assert_eq!(
            synthesizer.synthesize(&store, &theme),
            synthesizer.synthesize(&store, &theme)
        );
    }

    #[test]
    fn empty_inputs_use_brand_defaults() {
        let css =
            ThemeVariableSynthesizer.synthesize(&ContentStore::default(), &ThemeSettings::empty());
        assert!(css.contains("--color-brand-primary: #6f6254;"));
        assert!(css.contains("--color-brand-tertiary: #f3efe8;"));
        assert!(css.contains("--font-body-family: \"Inter\", sans-serif;"));
        assert!(css.contains("--page-width: 120rem;"));
        assert!(css.contains("--font-body-scale: 1;"));
        for index in 1..=5 {
            assert!(css.contains(&format!(".color-scheme-{index} {{")));
        }
    }

    #[test]
    fn inner_highlight_follows_light_mix_formula() {
        let palette = BrandPalette::from_content(&content(json!({"primary_color": "#6f6254"})));
        assert_eq!(palette.inner_highlight(), Rgb::new(233, 231, 229));
    }

    #[test]
    fn inner_highlight_follows_dark_mix_formula() {
        let palette = BrandPalette::from_content(&content(json!({
            "primary_color": "#6f6254",
            "color_scheme": "dark"
        })));
        assert_eq!(palette.inner_highlight(), Rgb::new(154, 145, 135));
    }

    #[test]
    fn invalid_colors_fall_back() {
        let palette = BrandPalette::from_content(&content(json!({
            "primary_color": "blue-ish",
            "tertiary_color": 12
        })));
        assert_eq!(palette.primary, DEFAULT_PRIMARY);
        assert_eq!(palette.tertiary, DEFAULT_TERTIARY);
    }

    #[test]
    fn font_family_cannot_escape_the_declaration() {
        let palette = BrandPalette::from_content(&content(json!({
            "font_family_override": "Evil\"; } </style><script>"
        })));
        assert_eq!(palette.font_family, "Evil  stylescript");
    }

    #[test]
    fn theme_settings_feed_structural_variables() {
        let theme = ThemeSettings::from_value(json!({
            "current": {
                "buttons_radius": 12,
                "spacing_sections": 40,
                "color_schemes": {"scheme-4": {"settings": {"background": "#203040"}}}
            }
        }));
        let css = ThemeVariableSynthesizer.synthesize(&ContentStore::default(), &theme);
        assert!(css.contains("--buttons-radius: 12px;"));
        assert!(css.contains("--spacing-sections-desktop: 40px;"));
        assert!(css.contains("--spacing-sections-mobile: 28px;"));
        assert!(css.contains(".color-scheme-4 {\n  --color-background: 32,48,64;"));
    }
}
