//! Wire types shared between the Vitrine preview server and the editing
//! surfaces that drive it.
//!
//! Two channels are described here:
//!
//! * [`PreviewRequestBody`] is the JSON body accepted by `POST /preview`.
//! * [`HighlightMessage`] is the `postMessage` payload a host page sends to an
//!   embedded preview document to scroll to or outline a section.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for composing a preview document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRequestBody {
    /// Theme directory name, e.g. `dawn`.
    pub theme: String,
    /// Template page type; the server default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    /// AI-authored content store. Must be a JSON object.
    #[serde(default)]
    pub content: Value,
    /// Image URLs available for distribution across sections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Base URL for documents loaded from a detached (non-HTTP) origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl PreviewRequestBody {
    pub fn new(theme: impl Into<String>, content: Value) -> Self {
        Self {
            theme: theme.into(),
            page_type: None,
            content,
            images: Vec::new(),
            base_url: None,
        }
    }

    pub fn with_page_type(mut self, page_type: impl Into<String>) -> Self {
        self.page_type = Some(page_type.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Messages understood by the in-page highlight client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HighlightMessage {
    /// Scroll the section into the vertical centre and, unless suppressed,
    /// outline it.
    #[serde(rename = "scrollToSection")]
    ScrollToSection {
        #[serde(rename = "sectionType")]
        section_type: String,
        #[serde(rename = "noHighlight", default)]
        no_highlight: bool,
    },
    /// Outline the section without scrolling.
    #[serde(rename = "highlightInput")]
    HighlightInput {
        #[serde(rename = "sectionType")]
        section_type: String,
    },
    /// Remove any active outline. A no-op when nothing is highlighted.
    #[serde(rename = "clearHighlight")]
    ClearHighlight,
}

impl HighlightMessage {
    pub fn scroll_to(section_type: impl Into<String>) -> Self {
        Self::ScrollToSection {
            section_type: section_type.into(),
            no_highlight: false,
        }
    }

    pub fn scroll_to_quietly(section_type: impl Into<String>) -> Self {
        Self::ScrollToSection {
            section_type: section_type.into(),
            no_highlight: true,
        }
    }

    pub fn highlight(section_type: impl Into<String>) -> Self {
        Self::HighlightInput {
            section_type: section_type.into(),
        }
    }

    /// Section type the message targets, if any.
    pub fn section_type(&self) -> Option<&str> {
        match self {
            Self::ScrollToSection { section_type, .. } | Self::HighlightInput { section_type } => {
                Some(section_type.as_str())
            }
            Self::ClearHighlight => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scroll_message_uses_camel_case_wire_names() {
        let value = serde_json::to_value(HighlightMessage::scroll_to_quietly("faq")).unwrap();
        assert_eq!(
            value,
            json!({"type": "scrollToSection", "sectionType": "faq", "noHighlight": true})
        );
    }

    #[test]
    fn scroll_message_defaults_no_highlight() {
        let message: HighlightMessage =
            serde_json::from_value(json!({"type": "scrollToSection", "sectionType": "hero"}))
                .unwrap();
        assert_eq!(message, HighlightMessage::scroll_to("hero"));
    }

    #[test]
    fn clear_message_carries_no_fields() {
        let value = serde_json::to_value(HighlightMessage::ClearHighlight).unwrap();
        assert_eq!(value, json!({"type": "clearHighlight"}));
        assert_eq!(HighlightMessage::ClearHighlight.section_type(), None);
    }

    #[test]
    fn preview_body_accepts_minimal_payload() {
        let body: PreviewRequestBody =
            serde_json::from_value(json!({"theme": "dawn", "content": {"title": "Mug"}})).unwrap();
        assert_eq!(body.theme, "dawn");
        assert!(body.page_type.is_none());
        assert!(body.images.is_empty());
        assert_eq!(body.content["title"], "Mug");
    }
}
