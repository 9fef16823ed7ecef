//! Application services: section resolution, composition and rendering.

pub mod compositor;
pub mod error;
pub mod highlight;
pub mod preview;
pub mod render;
pub mod resolver;
pub mod sources;
pub mod theme_vars;
