//! Domain layer types and invariants.

pub mod aliases;
pub mod color;
pub mod content;
pub mod error;
pub mod matching;
pub mod template;
pub mod theme_settings;
