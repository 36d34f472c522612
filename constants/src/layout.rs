/// Angular advance per commit inside a branch arm (radians)
pub const ANGULAR_STEP: f32 = 0.055;

/// Angular sweep applied across the whole normalised timeline (radians)
pub const TIMELINE_SWEEP: f32 = 0.65;

/// Radial growth per commit inside a branch arm
pub const RADIAL_STEP: f32 = 0.5;

/// Radial growth across the whole normalised timeline
pub const TIMELINE_GROWTH: f32 = 28.0;

/// Amplitude and frequencies of the per-branch spiral wobble
pub const SPIRAL_WOBBLE_AMPLITUDE: f32 = 2.2;
pub const SPIRAL_WOBBLE_FREQUENCY: f32 = 0.18;
pub const SPIRAL_WOBBLE_BRANCH_PHASE: f32 = 1.7;

/// Vertical separation between neighbouring branch lanes
pub const LANE_SPACING: f32 = 1.7;
pub const LANE_WOBBLE_AMPLITUDE: f32 = 1.2;
pub const LANE_WOBBLE_FREQUENCY: f32 = 0.07;

/// Hash jitter seeds, one per axis (x, y, z)
pub const JITTER_SEEDS: [u32; 3] = [11, 23, 37];

/// Hash jitter scale per axis (x, y, z)
pub const JITTER_SCALE: [f32; 3] = [1.2, 2.4, 1.2];

/// Resolution of the hash to unit interval mapping
pub const JITTER_BUCKETS: u32 = 10_000;

/// Commit volume weights: files + insertions * w + deletions * w
pub const INSERTION_WEIGHT: f64 = 0.35;
pub const DELETION_WEIGHT: f64 = 0.30;

/// Exponent compressing the long tail of commit volume
pub const BRIGHTNESS_EXPONENT: f64 = 0.36;
pub const BRIGHTNESS_BASE: f64 = 0.18;
pub const BRIGHTNESS_GAIN: f64 = 1.15;
pub const BRIGHTNESS_MIN: f64 = 0.2;
pub const BRIGHTNESS_MAX: f64 = 1.33;

/// Visual scale = base + brightness * gain
pub const SCALE_BASE: f64 = 0.075;
pub const SCALE_GAIN: f64 = 0.34;

/// Branch palette (saturation, lightness) in percent
pub const BRANCH_SATURATION: f32 = 90.0;
pub const BRANCH_LIGHTNESS: f32 = 64.0;

/// Contributor palette (saturation, lightness) in percent
pub const CONTRIBUTOR_SATURATION: f32 = 88.0;
pub const CONTRIBUTOR_LIGHTNESS: f32 = 70.0;

/// Neutral contributor colour (hue degrees, saturation %, lightness %)
pub const FALLBACK_CONTRIBUTOR_HSL: [f32; 3] = [210.0, 70.0, 70.0];
