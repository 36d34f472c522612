//! Orbit camera for galaxy navigation.
//!
//! Drives the render host's camera around the origin with damped rotation,
//! clamped zoom and an idle auto-rotate.

/// Orbit state, its input handling, and the Bevy camera marker.
pub mod orbit_camera;
