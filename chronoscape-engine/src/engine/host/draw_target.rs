use super::camera::HostCamera;
use super::render_host::SurfaceSize;
use super::scene::{NodeId, Scene};

/// Post-processing parameters for the bloom pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub intensity: f32,
    pub threshold: f32,
    pub smoothing: f32,
}

/// Backend that turns the retained scene into pixels.
pub trait DrawTarget {
    /// The default draw: present every live node as seen from `camera`.
    fn draw_scene(&mut self, scene: &Scene, camera: &HostCamera, size: &SurfaceSize);

    /// Free whatever was uploaded for a node removed from the arena.
    fn release(&mut self, node: NodeId);

    /// Enable bloom for the current frame. Targets without post-processing ignore it.
    fn apply_bloom(&mut self, _settings: &BloomSettings) {}

    /// Called once per frame after the draw, whether or not an override ran.
    fn finish_frame(&mut self) {}
}

/// What a render override sees for one frame.
pub struct DrawContext<'a> {
    pub(super) scene: &'a Scene,
    pub(super) camera: &'a HostCamera,
    pub(super) size: &'a SurfaceSize,
    pub(super) target: &'a mut dyn DrawTarget,
    pub delta: f32,
    pub elapsed: f32,
}

impl DrawContext<'_> {
    /// Issue the draw the host would have done without an override.
    pub fn draw_default(&mut self) {
        self.target.draw_scene(self.scene, self.camera, self.size);
    }

    pub fn target(&mut self) -> &mut dyn DrawTarget {
        &mut *self.target
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }

    pub fn camera(&self) -> &HostCamera {
        self.camera
    }

    pub fn size(&self) -> &SurfaceSize {
        self.size
    }
}

/// Draw target that records calls. Used by unit tests across the engine.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub draws: usize,
    pub drawn_nodes: Vec<usize>,
    pub released: Vec<NodeId>,
    pub blooms: Vec<BloomSettings>,
    pub finished: usize,
}

#[cfg(test)]
impl DrawTarget for RecordingTarget {
    fn draw_scene(&mut self, scene: &Scene, _camera: &HostCamera, _size: &SurfaceSize) {
        self.draws += 1;
        self.drawn_nodes.push(scene.len());
    }

    fn release(&mut self, node: NodeId) {
        self.released.push(node);
    }

    fn apply_bloom(&mut self, settings: &BloomSettings) {
        self.blooms.push(*settings);
    }

    fn finish_frame(&mut self) {
        self.finished += 1;
    }
}
