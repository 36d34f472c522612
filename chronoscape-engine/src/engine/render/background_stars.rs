//! Two-layer twinkling starfield behind the commit galaxy.

use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;

use bevy::color::{Hsla, LinearRgba, Srgba};
use bevy::log::info;
use bevy::math::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use constants::render_settings::{
    BACKGROUND_STAR_COUNT, BACKGROUND_STAR_RADIUS, BACKGROUND_STAR_SEED, FAR_LAYER_DRIFT,
    FAR_LAYER_MIN_STARS, FAR_LAYER_OPACITY, FAR_LAYER_POINT_SIZE, FAR_LAYER_RADII,
    FAR_LAYER_SHARE, FAR_LAYER_SPEED, NEAR_LAYER_DRIFT, NEAR_LAYER_MIN_STARS, NEAR_LAYER_OPACITY,
    NEAR_LAYER_POINT_SIZE, NEAR_LAYER_RADII, NEAR_LAYER_SHARE, NEAR_LAYER_SPEED,
    STAR_AMPLITUDE_RANGE, STAR_DISTANCE_EXPONENT, STAR_GEOMETRY_RADIUS, STAR_HUE_CENTRE,
    STAR_HUE_SPREAD, STAR_LIGHTNESS_RANGE, STAR_SATURATION_RANGE, STARFIELD_DRAW_ORDER,
    STARFIELD_SLOW_AMPLITUDE, STARFIELD_SLOW_PHASE_MULTIPLIER, STARFIELD_SLOW_SPEED_RATIO,
    STARFIELD_TWINKLE_BASE,
};

use crate::engine::host::{
    FrameState, InstancedBatch, NodeId, NodeKind, RenderHost, Scene, SceneNode, Subscription,
    SurfaceMaterial,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarfieldConfig {
    pub count: usize,
    pub radius: f32,
    pub seed: u64,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: BACKGROUND_STAR_COUNT,
            radius: BACKGROUND_STAR_RADIUS,
            seed: BACKGROUND_STAR_SEED,
        }
    }
}

struct LayerSpec {
    label: &'static str,
    count: usize,
    inner_radius: f32,
    outer_radius: f32,
    point_size: f32,
    opacity: f32,
    speed: f32,
    drift: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarLayer {
    pub label: &'static str,
    pub positions: Vec<Vec3>,
    pub base_colors: Vec<LinearRgba>,
    pub phases: Vec<f32>,
    pub amplitudes: Vec<f32>,
    pub point_size: f32,
    pub opacity: f32,
    pub speed: f32,
    pub drift: f32,
}

impl StarLayer {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn twinkle(&self, index: usize, elapsed: f32) -> f32 {
        let phase = self.phases[index];
        STARFIELD_TWINKLE_BASE
            + (elapsed * self.speed + phase).sin() * self.amplitudes[index]
            + (elapsed * self.speed * STARFIELD_SLOW_SPEED_RATIO
                + phase * STARFIELD_SLOW_PHASE_MULTIPLIER)
                .sin()
                * STARFIELD_SLOW_AMPLITUDE
    }
}

/// Both layers plus the far layer's fixed angular offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Starfield {
    pub layers: Vec<StarLayer>,
    pub far_offset: f32,
}

impl Starfield {
    pub fn generate(config: &StarfieldConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let count = config.count as f32;
        let radius = config.radius;

        let near = LayerSpec {
            label: "background-stars-near",
            count: NEAR_LAYER_MIN_STARS.max((count * NEAR_LAYER_SHARE) as usize),
            inner_radius: radius * NEAR_LAYER_RADII.0,
            outer_radius: radius * NEAR_LAYER_RADII.1,
            point_size: NEAR_LAYER_POINT_SIZE,
            opacity: NEAR_LAYER_OPACITY,
            speed: NEAR_LAYER_SPEED,
            drift: NEAR_LAYER_DRIFT,
        };
        let far = LayerSpec {
            label: "background-stars-distant",
            count: FAR_LAYER_MIN_STARS.max((count * FAR_LAYER_SHARE) as usize),
            inner_radius: radius * FAR_LAYER_RADII.0,
            outer_radius: radius * FAR_LAYER_RADII.1,
            point_size: FAR_LAYER_POINT_SIZE,
            opacity: FAR_LAYER_OPACITY,
            speed: FAR_LAYER_SPEED,
            drift: FAR_LAYER_DRIFT,
        };

        let layers = vec![build_layer(&near, &mut rng), build_layer(&far, &mut rng)];
        Self {
            layers,
            far_offset: rng.r#gen::<f32>() * TAU,
        }
    }

    /// Y rotation of layer `index` at `elapsed` seconds.
    pub fn rotation(&self, index: usize, elapsed: f32) -> f32 {
        let direction = if index == 0 { 1.0 } else { -1.0 };
        direction * elapsed * self.layers[index].drift + self.far_offset * index as f32
    }
}

fn build_layer(spec: &LayerSpec, rng: &mut StdRng) -> StarLayer {
    let mut layer = StarLayer {
        label: spec.label,
        positions: Vec::with_capacity(spec.count),
        base_colors: Vec::with_capacity(spec.count),
        phases: Vec::with_capacity(spec.count),
        amplitudes: Vec::with_capacity(spec.count),
        point_size: spec.point_size,
        opacity: spec.opacity,
        speed: spec.speed,
        drift: spec.drift,
    };

    for _ in 0..spec.count {
        let distance = spec.inner_radius
            + rng.r#gen::<f32>().powf(STAR_DISTANCE_EXPONENT) * (spec.outer_radius - spec.inner_radius);
        let theta = rng.r#gen::<f32>() * TAU;
        let phi = (2.0 * rng.r#gen::<f32>() - 1.0).acos();
        layer.positions.push(Vec3::new(
            distance * phi.sin() * theta.cos(),
            distance * phi.cos(),
            distance * phi.sin() * theta.sin(),
        ));

        let hue = STAR_HUE_CENTRE + (rng.r#gen::<f32>() - 0.5) * STAR_HUE_SPREAD;
        let saturation = rng.gen_range(STAR_SATURATION_RANGE.0..STAR_SATURATION_RANGE.1);
        let lightness = rng.gen_range(STAR_LIGHTNESS_RANGE.0..STAR_LIGHTNESS_RANGE.1);
        // Tint channels are used as linear values directly.
        let tint = Srgba::from(Hsla::hsl(hue * 360.0, saturation, lightness));
        layer
            .base_colors
            .push(LinearRgba::rgb(tint.red, tint.green, tint.blue));

        layer.phases.push(rng.r#gen::<f32>() * TAU);
        layer
            .amplitudes
            .push(rng.gen_range(STAR_AMPLITUDE_RANGE.0..STAR_AMPLITUDE_RANGE.1));
    }
    layer
}

struct StarfieldState {
    field: Starfield,
    nodes: Vec<NodeId>,
}

impl StarfieldState {
    fn build(&mut self, scene: &mut Scene) {
        for layer in &self.field.layers {
            let mut batch = InstancedBatch::new(layer.len(), STAR_GEOMETRY_RADIUS);
            for (index, position) in layer.positions.iter().enumerate() {
                batch.set_instance(index, *position, layer.point_size * 0.5);
                batch.set_color(index, layer.base_colors[index]);
            }
            self.nodes.push(scene.insert(SceneNode::new(
                layer.label,
                NodeKind::Instances(batch),
                SurfaceMaterial::glow(LinearRgba::WHITE, layer.opacity, STARFIELD_DRAW_ORDER),
            )));
        }
        info!(
            "Starfield built with {} stars",
            self.field.layers.iter().map(StarLayer::len).sum::<usize>()
        );
    }

    fn on_frame(&mut self, frame: &mut FrameState<'_>) {
        if self.nodes.is_empty() {
            self.build(frame.scene);
        }

        for (index, (layer, node)) in self.field.layers.iter().zip(&self.nodes).enumerate() {
            let Some(batch) = frame
                .scene
                .get_mut(*node)
                .and_then(SceneNode::instances_mut)
            else {
                continue;
            };
            let rotation = Quat::from_rotation_y(self.field.rotation(index, frame.elapsed));
            for (star, position) in layer.positions.iter().enumerate() {
                batch.set_instance(star, rotation * *position, layer.point_size * 0.5);
                let base = layer.base_colors[star];
                let factor = layer.twinkle(star, frame.elapsed);
                batch.set_color(
                    star,
                    LinearRgba::rgb(base.red * factor, base.green * factor, base.blue * factor),
                );
            }
        }
    }
}

pub struct StarfieldRenderer {
    state: Rc<RefCell<StarfieldState>>,
    subscription: Subscription,
}

impl StarfieldRenderer {
    pub fn mount(host: &RenderHost, config: StarfieldConfig) -> Self {
        let state = Rc::new(RefCell::new(StarfieldState {
            field: Starfield::generate(&config),
            nodes: Vec::new(),
        }));
        let subscription = host.on_frame({
            let state = Rc::clone(&state);
            move |frame| state.borrow_mut().on_frame(frame)
        });
        Self {
            state,
            subscription,
        }
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.state.borrow().nodes.clone()
    }

    pub fn unmount(self, host: &mut RenderHost) {
        self.subscription.dispose();
        for node in self.state.borrow_mut().nodes.drain(..) {
            host.scene_mut().remove(node);
        }
    }
}
