//! Commit histories rendered as an explorable 3D galaxy.
//!
//! `history` repairs exporter JSON into a canonical commit list, `layout`
//! places every commit in space, and `engine` runs the render host, the
//! timeline and the Bevy application around them.

pub mod engine;
pub mod history;
pub mod layout;
