use std::time::Duration;

use bevy::log::{debug, info};
use bevy::math::{Ray3d, Vec2};
use constants::render_settings::MAX_PIXEL_RATIO;

use super::camera::HostCamera;
use super::draw_target::{DrawContext, DrawTarget};
use super::registry::{Registry, Subscription};
use super::scene::Scene;

/// Logical size of the drawing surface and where it sits in client space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    /// Top-left corner of the surface's bounding box in client coordinates.
    pub origin: Vec2,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            pixel_ratio: 1.0,
            origin: Vec2::ZERO,
        }
    }
}

impl SurfaceSize {
    pub fn physical_width(&self) -> u32 {
        (self.width * self.pixel_ratio).round() as u32
    }

    pub fn physical_height(&self) -> u32 {
        (self.height * self.pixel_ratio).round() as u32
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Client coordinates to NDC, +y up.
    pub fn to_ndc(&self, client: Vec2) -> Vec2 {
        let local = client - self.origin;
        Vec2::new(
            local.x / self.width * 2.0 - 1.0,
            -(local.y / self.height) * 2.0 + 1.0,
        )
    }
}

/// Monotonic frame clock driven by externally supplied timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    start: Option<Duration>,
    last: Option<Duration>,
}

impl FrameClock {
    /// Returns `(delta, elapsed)` in seconds. The first tick has zero delta.
    pub fn tick(&mut self, now: Duration) -> (f32, f32) {
        let start = *self.start.get_or_insert(now);
        let delta = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last = Some(now);
        (delta.as_secs_f32(), now.saturating_sub(start).as_secs_f32())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Position in client coordinates, origin top-left, +y down.
    pub client: Vec2,
    pub button: PointerButton,
}

/// Context handed to frame subscribers.
pub struct FrameState<'a> {
    pub delta: f32,
    pub elapsed: f32,
    pub scene: &'a mut Scene,
    pub camera: &'a HostCamera,
    pub size: &'a SurfaceSize,
}

/// Context handed to pointer subscribers.
pub struct PointerState<'a> {
    pub event: PointerEvent,
    pub ray: Ray3d,
    /// Pointer in NDC.
    pub pointer: Vec2,
    pub scene: &'a Scene,
}

pub type FrameCallback = dyn FnMut(&mut FrameState<'_>);
pub type PointerCallback = dyn FnMut(&PointerState<'_>);
pub type ResizeCallback = dyn FnMut(&SurfaceSize);
pub type RenderOverride = Box<dyn FnMut(&mut DrawContext<'_>)>;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostConfig {
    pub camera: HostCamera,
    pub surface: SurfaceSize,
}

/// Owns the surface, camera, clock and scene, and drives the frame loop.
///
/// Visual subsystems never call each other; they subscribe here and read
/// shared state during the callbacks.
pub struct RenderHost {
    camera: HostCamera,
    clock: FrameClock,
    surface: SurfaceSize,
    scene: Scene,
    frame_callbacks: Registry<FrameCallback>,
    pointer_callbacks: Registry<PointerCallback>,
    resize_callbacks: Registry<ResizeCallback>,
    render_override: Option<RenderOverride>,
    mounted: bool,
}

impl RenderHost {
    pub fn mount(config: HostConfig) -> Self {
        let mut host = Self {
            camera: config.camera,
            clock: FrameClock::default(),
            surface: SurfaceSize::default(),
            scene: Scene::new(),
            frame_callbacks: Registry::new(),
            pointer_callbacks: Registry::new(),
            resize_callbacks: Registry::new(),
            render_override: None,
            mounted: true,
        };
        let surface = config.surface;
        host.apply_size(surface.width, surface.height, surface.pixel_ratio);
        host.surface.origin = surface.origin;
        info!(
            "Render host mounted at {}x{} (pixel ratio {})",
            host.surface.width, host.surface.height, host.surface.pixel_ratio
        );
        host
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn on_frame(&self, callback: impl FnMut(&mut FrameState<'_>) + 'static) -> Subscription {
        self.frame_callbacks.subscribe(Box::new(callback))
    }

    pub fn on_pointer(&self, callback: impl FnMut(&PointerState<'_>) + 'static) -> Subscription {
        self.pointer_callbacks.subscribe(Box::new(callback))
    }

    pub fn on_resize(&self, callback: impl FnMut(&SurfaceSize) + 'static) -> Subscription {
        self.resize_callbacks.subscribe(Box::new(callback))
    }

    /// Install the render override, returning the one it replaces.
    pub fn set_render_override(
        &mut self,
        render: impl FnMut(&mut DrawContext<'_>) + 'static,
    ) -> Option<RenderOverride> {
        self.render_override.replace(Box::new(render))
    }

    pub fn clear_render_override(&mut self) -> Option<RenderOverride> {
        self.render_override.take()
    }

    pub fn has_render_override(&self) -> bool {
        self.render_override.is_some()
    }

    /// Run one frame: subscribers, pending releases, then the draw.
    pub fn frame(&mut self, now: Duration, target: &mut dyn DrawTarget) {
        if !self.mounted {
            return;
        }

        let (delta, elapsed) = self.clock.tick(now);
        {
            let mut state = FrameState {
                delta,
                elapsed,
                scene: &mut self.scene,
                camera: &self.camera,
                size: &self.surface,
            };
            self.frame_callbacks
                .dispatch(|callback| callback(&mut state));
        }

        for node in self.scene.drain_released() {
            target.release(node);
        }

        {
            let mut context = DrawContext {
                scene: &self.scene,
                camera: &self.camera,
                size: &self.surface,
                target: &mut *target,
                delta,
                elapsed,
            };
            match self.render_override.as_mut() {
                Some(render) => render(&mut context),
                None => context.draw_default(),
            }
        }
        target.finish_frame();
    }

    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        if !self.mounted {
            return;
        }
        self.apply_size(width, height, pixel_ratio);
        debug!(
            "Surface resized to {}x{} physical",
            self.surface.physical_width(),
            self.surface.physical_height()
        );
        let surface = self.surface;
        self.resize_callbacks.dispatch(|callback| callback(&surface));
    }

    /// Move the surface's bounding box within client space.
    pub fn set_surface_origin(&mut self, origin: Vec2) {
        self.surface.origin = origin;
    }

    pub fn pointer_down(&mut self, event: PointerEvent) {
        if !self.mounted || event.button != PointerButton::Primary {
            return;
        }

        let pointer = self.surface.to_ndc(event.client);
        let state = PointerState {
            event,
            ray: self.camera.ray_from_ndc(pointer),
            pointer,
            scene: &self.scene,
        };
        self.pointer_callbacks.dispatch(|callback| callback(&state));
    }

    /// Tear down: drop every subscriber and the override, release all nodes.
    pub fn unmount(&mut self, target: &mut dyn DrawTarget) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.frame_callbacks.clear();
        self.pointer_callbacks.clear();
        self.resize_callbacks.clear();
        self.render_override = None;

        self.scene.clear();
        for node in self.scene.drain_released() {
            target.release(node);
        }
        info!("Render host unmounted");
    }

    pub fn camera(&self) -> &HostCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut HostCamera {
        &mut self.camera
    }

    pub fn surface(&self) -> &SurfaceSize {
        &self.surface
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn subscriber_counts(&self) -> (usize, usize, usize) {
        (
            self.frame_callbacks.len(),
            self.pointer_callbacks.len(),
            self.resize_callbacks.len(),
        )
    }

    fn apply_size(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };

        self.surface.width = width;
        self.surface.height = height;
        self.surface.pixel_ratio = pixel_ratio;
        self.camera.aspect = width / height;
    }
}

impl Drop for RenderHost {
    fn drop(&mut self) {
        self.frame_callbacks.clear();
        self.pointer_callbacks.clear();
        self.resize_callbacks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::host::draw_target::{BloomSettings, RecordingTarget};
    use crate::engine::host::scene::{NodeKind, Polyline, SceneNode, SurfaceMaterial};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn host() -> RenderHost {
        RenderHost::mount(HostConfig {
            surface: SurfaceSize {
                width: 800.0,
                height: 600.0,
                pixel_ratio: 1.0,
                origin: Vec2::ZERO,
            },
            ..HostConfig::default()
        })
    }

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_frame_delta_and_elapsed() {
        let mut host = host();
        let mut target = RecordingTarget::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _subscription = host.on_frame({
            let seen = Rc::clone(&seen);
            move |state| seen.borrow_mut().push((state.delta, state.elapsed))
        });

        host.frame(millis(1000), &mut target);
        host.frame(millis(1016), &mut target);
        host.frame(millis(1050), &mut target);

        let seen = seen.borrow();
        assert_eq!(seen[0], (0.0, 0.0));
        assert!((seen[1].0 - 0.016).abs() < 1e-6);
        assert!((seen[2].0 - 0.034).abs() < 1e-6);
        assert!((seen[2].1 - 0.05).abs() < 1e-6);
        assert_eq!(target.draws, 3);
        assert_eq!(target.finished, 3);
    }

    #[test]
    fn test_override_replaces_default_draw() {
        let mut host = host();
        let mut target = RecordingTarget::default();
        let calls = Rc::new(Cell::new(0));

        assert!(host.set_render_override({
            let calls = Rc::clone(&calls);
            move |_context| calls.set(calls.get() + 1)
        })
        .is_none());
        host.frame(millis(0), &mut target);
        assert_eq!(calls.get(), 1);
        assert_eq!(target.draws, 0);

        // Last writer wins; the override may still issue the default draw.
        let previous = host.set_render_override(|context| {
            context.draw_default();
            context.target().apply_bloom(&BloomSettings {
                intensity: 1.0,
                threshold: 0.0,
                smoothing: 0.5,
            });
        });
        assert!(previous.is_some());
        host.frame(millis(16), &mut target);
        assert_eq!(calls.get(), 1);
        assert_eq!(target.draws, 1);
        assert_eq!(target.blooms.len(), 1);

        host.clear_render_override();
        host.frame(millis(32), &mut target);
        assert_eq!(target.draws, 2);
        assert_eq!(target.blooms.len(), 1);
    }

    #[test]
    fn test_resize_clamps_and_notifies() {
        let mut host = host();
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let _subscription = host.on_resize({
            let sizes = Rc::clone(&sizes);
            move |size| sizes.borrow_mut().push(*size)
        });

        host.resize(0.0, -5.0, 3.0);
        host.resize(1280.0, 720.0, 1.5);

        let sizes = sizes.borrow();
        assert_eq!((sizes[0].width, sizes[0].height), (1.0, 1.0));
        assert_eq!(sizes[0].pixel_ratio, 2.0);
        assert_eq!(sizes[1].physical_width(), 1920);
        assert_eq!(sizes[1].physical_height(), 1080);
        assert!((host.camera().aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_primary_only() {
        let mut host = host();
        let events = Rc::new(RefCell::new(Vec::new()));
        let _subscription = host.on_pointer({
            let events = Rc::clone(&events);
            move |state| events.borrow_mut().push(state.pointer)
        });

        host.pointer_down(PointerEvent {
            client: Vec2::new(400.0, 300.0),
            button: PointerButton::Secondary,
        });
        assert!(events.borrow().is_empty());

        host.set_surface_origin(Vec2::new(100.0, 50.0));
        host.pointer_down(PointerEvent {
            client: Vec2::new(900.0, 50.0),
            button: PointerButton::Primary,
        });
        assert_eq!(events.borrow().as_slice(), &[Vec2::new(1.0, 1.0)]);
    }

    #[test]
    fn test_all_pointer_subscribers_notified() {
        let mut host = host();
        let count = Rc::new(Cell::new(0));
        let subscriptions: Vec<_> = (0..3)
            .map(|_| {
                let count = Rc::clone(&count);
                host.on_pointer(move |_| count.set(count.get() + 1))
            })
            .collect();

        host.pointer_down(PointerEvent {
            client: Vec2::new(10.0, 10.0),
            button: PointerButton::Primary,
        });
        assert_eq!(count.get(), 3);
        drop(subscriptions);
    }

    #[test]
    fn test_released_nodes_reach_target() {
        let mut host = host();
        let mut target = RecordingTarget::default();
        let id = host.scene_mut().insert(SceneNode::new(
            "line",
            NodeKind::Line(Polyline::default()),
            SurfaceMaterial::default(),
        ));

        host.frame(millis(0), &mut target);
        assert!(target.released.is_empty());
        host.scene_mut().remove(id);
        host.frame(millis(16), &mut target);
        assert_eq!(target.released, vec![id]);
    }

    #[test]
    fn test_unmount_releases_and_silences() {
        let mut host = host();
        let mut target = RecordingTarget::default();
        let frames = Rc::new(Cell::new(0));
        let subscription = host.on_frame({
            let frames = Rc::clone(&frames);
            move |_| frames.set(frames.get() + 1)
        });
        let id = host.scene_mut().insert(SceneNode::new(
            "line",
            NodeKind::Line(Polyline::default()),
            SurfaceMaterial::default(),
        ));
        host.set_render_override(|context| context.draw_default());

        host.unmount(&mut target);
        assert!(!host.is_mounted());
        assert_eq!(host.subscriber_counts(), (0, 0, 0));
        assert!(!host.has_render_override());
        assert_eq!(target.released, vec![id]);

        host.frame(millis(0), &mut target);
        assert_eq!(frames.get(), 0);
        assert_eq!(target.draws, 0);
        subscription.dispose();
    }

    #[test]
    fn test_frame_subscriber_can_dispose_itself() {
        let mut host = host();
        let mut target = RecordingTarget::default();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let subscription = host.on_frame({
            let slot = Rc::clone(&slot);
            let calls = Rc::clone(&calls);
            move |_| {
                calls.set(calls.get() + 1);
                slot.borrow_mut().take();
            }
        });
        *slot.borrow_mut() = Some(subscription);

        host.frame(millis(0), &mut target);
        host.frame(millis(16), &mut target);
        assert_eq!(calls.get(), 1);
        assert_eq!(host.subscriber_counts().0, 0);
    }
}
