//! Source traits describing where theme templates come from.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{template::TemplateDocument, theme_settings::ThemeSettings};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateLoadError {
    #[error("invalid theme name `{theme}`")]
    InvalidTheme { theme: String },
    #[error("invalid page type `{page_type}`")]
    InvalidPageType { page_type: String },
}

/// Reads theme templates and settings. Missing or unreadable documents load
/// as empty; only unusable names are errors.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn theme_exists(&self, theme: &str) -> Result<bool, TemplateLoadError>;

    async fn load_template(
        &self,
        theme: &str,
        page_type: &str,
    ) -> Result<TemplateDocument, TemplateLoadError>;

    async fn load_theme_settings(&self, theme: &str) -> Result<ThemeSettings, TemplateLoadError>;

    /// Path the renderer should load the theme from.
    fn theme_path(&self, theme: &str) -> String;
}

/// A single path segment: non-empty, no separators, no parent references.
pub fn is_safe_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && !value.contains("..")
        && !value.contains(['/', '\\', '\0'])
}

pub fn validate_theme(theme: &str) -> Result<&str, TemplateLoadError> {
    if is_safe_segment(theme) {
        Ok(theme)
    } else {
        Err(TemplateLoadError::InvalidTheme {
            theme: theme.to_string(),
        })
    }
}

pub fn validate_page_type(page_type: &str) -> Result<&str, TemplateLoadError> {
    if is_safe_segment(page_type) {
        Ok(page_type)
    } else {
        Err(TemplateLoadError::InvalidPageType {
            page_type: page_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal_and_separators() {
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", "x..y"] {
            assert!(!is_safe_segment(bad), "{bad:?} accepted");
        }
        assert!(is_safe_segment("dawn"));
        assert!(is_safe_segment("product.alternate"));
    }

    #[test]
    fn validation_reports_the_offending_name() {
        assert_eq!(
            validate_theme("../x"),
            Err(TemplateLoadError::InvalidTheme {
                theme: "../x".into()
            })
        );
        assert_eq!(validate_page_type("product"), Ok("product"));
    }
}
