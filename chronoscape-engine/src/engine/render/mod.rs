//! Visual subsystems and the Bevy side of drawing them.
//!
//! Renderers subscribe to the render host and own their scene nodes. The
//! scene mirror and instanced pipeline turn those nodes into GPU work.

/// Two seeded twinkling star layers behind the galaxy.
pub mod background_stars;

/// Bloom post-processing installed through the render override slot.
pub mod bloom;

/// Per-branch glow, core and centerline through the visible commits.
pub mod branch_curves;

/// Centripetal Catmull-Rom spline with arc-length sampling.
pub mod catmull_rom;

/// One instanced star per commit, with twinkle and ray picking.
///
/// Rebuilds only when the commit set changes; scrubbing moves the active count.
pub mod commit_points;

/// Instanced star pipeline using per-instance vertex buffers.
pub mod instanced_render_plugin;

/// Default draw mirroring scene nodes into Bevy entities, meshes and materials.
pub mod scene_sync;

/// Tube tessellation with parallel-transport frames.
pub mod tube;
