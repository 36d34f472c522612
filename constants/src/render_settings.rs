/// Scene clear colour (sRGB)
pub const BACKGROUND_SRGB: [f32; 3] = [0.012, 0.016, 0.039];

/// Exponential distance fog
pub const FOG_SRGB: [f32; 3] = [0.016, 0.020, 0.067];
pub const FOG_DENSITY: f32 = 0.0034;

/// Camera defaults used when the command line does not override them
pub const CAMERA_FOV_DEGREES: f32 = 56.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 6000.0;
pub const CAMERA_POSITION: [f32; 3] = [0.0, 10.0, 115.0];

/// Upper bound applied to the device pixel ratio
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Commit stars: icosphere radius and subdivisions before per-instance scale
pub const STAR_GEOMETRY_RADIUS: f32 = 1.0;
pub const STAR_GEOMETRY_SUBDIVISIONS: u32 = 1;
pub const STAR_OPACITY: f32 = 0.95;

/// Base colour gain = offset + brightness * gain
pub const STAR_COLOUR_OFFSET: f32 = 0.52;
pub const STAR_COLOUR_GAIN: f32 = 1.2;

/// Per-instance phase = (index + 1) * index_step + x * x_step + z * z_step
pub const TWINKLE_PHASE_INDEX_STEP: f32 = 0.379;
pub const TWINKLE_PHASE_X_STEP: f32 = 0.09;
pub const TWINKLE_PHASE_Z_STEP: f32 = 0.05;

/// Twinkle = base + sin(t * f1 + phase) * a1 + sin(t * f2 + phase * m) * a2
pub const TWINKLE_BASE: f32 = 0.93;
pub const TWINKLE_PRIMARY_FREQUENCY: f32 = 2.4;
pub const TWINKLE_PRIMARY_AMPLITUDE: f32 = 0.09;
pub const TWINKLE_SECONDARY_FREQUENCY: f32 = 0.74;
pub const TWINKLE_SECONDARY_PHASE_MULTIPLIER: f32 = 1.8;
pub const TWINKLE_SECONDARY_AMPLITUDE: f32 = 0.03;

/// Selected star pulse = base + sin(t * frequency) * amplitude
pub const SELECTED_PULSE_BASE: f32 = 1.26;
pub const SELECTED_PULSE_FREQUENCY: f32 = 6.2;
pub const SELECTED_PULSE_AMPLITUDE: f32 = 0.08;

/// Branch curve sampling bounds and density
pub const CURVE_MIN_SAMPLES: usize = 24;
pub const CURVE_MAX_SAMPLES: usize = 640;
pub const CURVE_SAMPLES_PER_COMMIT: usize = 4;

/// Arc length table resolution used for evenly spaced curve points
pub const CURVE_ARC_LENGTH_DIVISIONS: usize = 200;

/// Outer glow tube
pub const GLOW_TUBE_RADIUS: f32 = 0.2;
pub const GLOW_TUBE_RADIAL_SEGMENTS: usize = 10;
pub const GLOW_OPACITY: f32 = 0.2;
pub const GLOW_SATURATION_OFFSET: f32 = 0.1;
pub const GLOW_LIGHTNESS_OFFSET: f32 = 0.12;

/// Inner core tube
pub const CORE_TUBE_RADIUS: f32 = 0.08;
pub const CORE_TUBE_RADIAL_SEGMENTS: usize = 8;
pub const CORE_OPACITY: f32 = 0.92;
pub const CORE_INTENSITY: f32 = 1.3;

/// Centre filament line
pub const FILAMENT_OPACITY: f32 = 0.66;
pub const FILAMENT_WHITE_MIX: f32 = 0.22;

/// Draw priority of the three branch layers
pub const GLOW_DRAW_ORDER: i32 = 1;
pub const CORE_DRAW_ORDER: i32 = 2;
pub const FILAMENT_DRAW_ORDER: i32 = 3;

/// Background starfield
pub const BACKGROUND_STAR_COUNT: usize = 4200;
pub const BACKGROUND_STAR_RADIUS: f32 = 1180.0;
pub const BACKGROUND_STAR_SEED: u64 = 0x6368_726f_6e6f;

/// Star distance = inner + r^exponent * (outer - inner), r uniform in [0, 1)
pub const STAR_DISTANCE_EXPONENT: f32 = 0.8;

/// Star tint in unit HSL: hue centre and spread, saturation and lightness ranges
pub const STAR_HUE_CENTRE: f32 = 0.6;
pub const STAR_HUE_SPREAD: f32 = 0.08;
pub const STAR_SATURATION_RANGE: (f32, f32) = (0.36, 0.68);
pub const STAR_LIGHTNESS_RANGE: (f32, f32) = (0.72, 0.96);

/// Per-star twinkle amplitude range
pub const STAR_AMPLITUDE_RANGE: (f32, f32) = (0.04, 0.16);

/// Starfield twinkle = base + sin(t * speed + phase) * amp + sin(t * speed * m + phase * p) * a2
pub const STARFIELD_TWINKLE_BASE: f32 = 0.92;
pub const STARFIELD_SLOW_SPEED_RATIO: f32 = 0.31;
pub const STARFIELD_SLOW_PHASE_MULTIPLIER: f32 = 1.9;
pub const STARFIELD_SLOW_AMPLITUDE: f32 = 0.05;

/// Near starfield layer
pub const NEAR_LAYER_MIN_STARS: usize = 500;
pub const NEAR_LAYER_SHARE: f32 = 0.55;
pub const NEAR_LAYER_RADII: (f32, f32) = (0.4, 1.15);
pub const NEAR_LAYER_POINT_SIZE: f32 = 1.15;
pub const NEAR_LAYER_OPACITY: f32 = 0.62;
pub const NEAR_LAYER_SPEED: f32 = 0.88;
pub const NEAR_LAYER_DRIFT: f32 = 0.004;

/// Distant starfield layer
pub const FAR_LAYER_MIN_STARS: usize = 600;
pub const FAR_LAYER_SHARE: f32 = 0.9;
pub const FAR_LAYER_RADII: (f32, f32) = (1.4, 3.4);
pub const FAR_LAYER_POINT_SIZE: f32 = 0.85;
pub const FAR_LAYER_OPACITY: f32 = 0.45;
pub const FAR_LAYER_SPEED: f32 = 0.54;
pub const FAR_LAYER_DRIFT: f32 = -0.0022;

/// Starfield draws behind everything else
pub const STARFIELD_DRAW_ORDER: i32 = -1;

/// Bloom applied by the post-processing override
pub const BLOOM_INTENSITY: f32 = 2.1;
pub const BLOOM_THRESHOLD: f32 = 0.016;
pub const BLOOM_SMOOTHING: f32 = 0.9;

/// Bevy's bloom composites far stronger than the nominal intensity suggests
pub const BLOOM_INTENSITY_SCALE: f32 = 0.15;

/// Orbit camera collaborator
pub const ORBIT_MIN_DISTANCE: f32 = 8.0;
pub const ORBIT_MAX_DISTANCE: f32 = 1300.0;
pub const ORBIT_DAMPING: f32 = 0.06;
pub const ORBIT_ROTATE_SPEED: f32 = 0.65;
pub const ORBIT_ZOOM_SPEED: f32 = 0.9;
pub const ORBIT_AUTO_ROTATE_SPEED: f32 = 0.18;
pub const ORBIT_IDLE_DELAY_SECS: f32 = 3.2;
