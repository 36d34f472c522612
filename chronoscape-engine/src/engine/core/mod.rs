//! Core application setup and state management.
//!
//! Handles the command line, window configuration, the loading to running
//! transition and plugin wiring for both native and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the app with the instanced star pipeline, history loading,
/// the galaxy runtime and the per-frame system chain.
pub mod app_setup;

/// Application state machine and its single transition.
pub mod app_state;

/// Command line options shared as a resource.
pub mod config;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
