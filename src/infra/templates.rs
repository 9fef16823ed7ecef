//! Filesystem-backed theme templates.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use crate::{
    application::sources::{TemplateLoadError, TemplateSource, validate_page_type, validate_theme},
    domain::{template::TemplateDocument, theme_settings::ThemeSettings},
};

const TEMPLATES_DIR: &str = "templates";
const SETTINGS_DATA_PATH: &str = "config/settings_data.json";

/// Reads `{root}/{theme}/templates/{page_type}.json` and
/// `{root}/{theme}/config/settings_data.json`.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn theme_dir(&self, theme: &str) -> PathBuf {
        self.root.join(theme)
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn theme_exists(&self, theme: &str) -> Result<bool, TemplateLoadError> {
        let theme = validate_theme(theme)?;
        match fs::metadata(self.theme_dir(theme)).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(_) => Ok(false),
        }
    }

    async fn load_template(
        &self,
        theme: &str,
        page_type: &str,
    ) -> Result<TemplateDocument, TemplateLoadError> {
        let theme = validate_theme(theme)?;
        let page_type = validate_page_type(page_type)?;
        let path = self
            .theme_dir(theme)
            .join(TEMPLATES_DIR)
            .join(format!("{page_type}.json"));

        let Some(value) = read_json(&path).await else {
            return Ok(TemplateDocument::empty());
        };

        match TemplateDocument::from_value(value) {
            Ok(template) => Ok(template),
            Err(err) => {
                warn!(
                    target = "vitrine::infra::templates",
                    path = %path.display(),
                    error = %err,
                    "Template does not match the expected shape; using an empty template"
                );
                Ok(TemplateDocument::empty())
            }
        }
    }

    async fn load_theme_settings(&self, theme: &str) -> Result<ThemeSettings, TemplateLoadError> {
        let theme = validate_theme(theme)?;
        let path = self.theme_dir(theme).join(SETTINGS_DATA_PATH);
        Ok(read_json(&path)
            .await
            .map(ThemeSettings::from_value)
            .unwrap_or_default())
    }

    fn theme_path(&self, theme: &str) -> String {
        self.theme_dir(theme).display().to_string()
    }
}

/// Missing files and unparseable JSON both read as `None`; only the latter warns.
async fn read_json(path: &Path) -> Option<Value> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(
                target = "vitrine::infra::templates",
                path = %path.display(),
                "Theme file not found"
            );
            return None;
        }
        Err(err) => {
            warn!(
                target = "vitrine::infra::templates",
                path = %path.display(),
                error = %err,
                "Failed to read theme file"
            );
            return None;
        }
    };

    match serde_json::from_str(strip_banner_comment(&raw)) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                target = "vitrine::infra::templates",
                path = %path.display(),
                error = %err,
                "Theme file is not valid JSON"
            );
            None
        }
    }
}

/// Theme tooling prefixes generated JSON with a `/* ... */` banner.
fn strip_banner_comment(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    if let Some(rest) = trimmed.strip_prefix("/*")
        && let Some(end) = rest.find("*/")
    {
        return &rest[end + 2..];
    }
    trimmed
}
