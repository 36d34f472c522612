//! Tuning constants shared by the galaxy layout and render engine.

pub mod layout;
pub mod render_settings;
pub mod timeline;
