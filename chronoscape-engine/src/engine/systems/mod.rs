//! Per-frame glue between Bevy input and the galaxy runtime.
//!
//! Forwards window size and clicks to the render host, maps keys onto the
//! timeline, reports picked commits and tracks frame rate.

/// FPS logging and the native status overlay.
pub mod fps_tracking;

/// Window size, pointer presses and timeline keys.
///
/// Space toggles playback, arrows scrub, Home and End jump to either end.
pub mod input;

/// Picked commit reporting and the selection resource.
pub mod selection;
