/// Fraction of the remaining distance covered by the animated progress each frame
pub const PROGRESS_SMOOTHING: f64 = 0.17;

/// Remaining distance below which the animated progress snaps to its target
pub const PROGRESS_SNAP_EPSILON: f64 = 0.0007;

/// Progress gained per second of autoplay
pub const PLAYBACK_RATE: f64 = 0.075;

/// Progress step applied by a single keyboard scrub
pub const SCRUB_STEP: f64 = 0.02;
