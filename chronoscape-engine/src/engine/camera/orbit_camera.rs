use std::f32::consts::TAU;

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::render_settings::{
    ORBIT_AUTO_ROTATE_SPEED, ORBIT_DAMPING, ORBIT_IDLE_DELAY_SECS, ORBIT_MAX_DISTANCE,
    ORBIT_MIN_DISTANCE, ORBIT_ROTATE_SPEED, ORBIT_ZOOM_SPEED,
};

use crate::engine::host::HostCamera;
use crate::engine::runtime::GalaxyRuntime;

const POLAR_EPSILON: f32 = 1e-6;

/// Marker for the Bevy camera entity that mirrors the host camera.
#[derive(Component, Debug, Default)]
pub struct GalaxyCamera;

/// Spherical orbit around `target` with damped deltas.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, measured from +Z towards +X.
    pub theta: f32,
    /// Polar angle from +Y.
    pub phi: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub auto_rotate_speed: f32,
    pub idle_delay: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    idle_for: f32,
    interacting: bool,
}

impl OrbitCamera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let mut orbit = Self {
            target,
            radius: 1.0,
            theta: 0.0,
            phi: 0.0,
            min_distance: ORBIT_MIN_DISTANCE,
            max_distance: ORBIT_MAX_DISTANCE,
            damping: ORBIT_DAMPING,
            rotate_speed: ORBIT_ROTATE_SPEED,
            zoom_speed: ORBIT_ZOOM_SPEED,
            auto_rotate_speed: ORBIT_AUTO_ROTATE_SPEED,
            idle_delay: ORBIT_IDLE_DELAY_SECS,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            idle_for: 0.0,
            interacting: false,
        };
        orbit.set_from_offset(position - target);
        orbit
    }

    pub fn from_host(camera: &HostCamera) -> Self {
        Self::new(camera.position, camera.target)
    }

    /// Queue a rotation from a pointer drag of `delta` pixels on a surface
    /// `surface_height` pixels tall.
    pub fn rotate(&mut self, delta: Vec2, surface_height: f32) {
        let height = surface_height.max(1.0);
        self.delta_theta -= TAU * delta.x / height * self.rotate_speed;
        self.delta_phi -= TAU * delta.y / height * self.rotate_speed;
        self.mark_interaction();
    }

    /// Positive `steps` zoom in, negative zoom out.
    pub fn zoom(&mut self, steps: f32) {
        if steps == 0.0 {
            return;
        }
        let step_scale = self.zoom_scale().powf(steps.abs());
        if steps > 0.0 {
            self.scale *= step_scale;
        } else {
            self.scale /= step_scale;
        }
        self.mark_interaction();
    }

    pub fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    pub fn mark_interaction(&mut self) {
        self.idle_for = 0.0;
    }

    pub fn set_interacting(&mut self, interacting: bool) {
        if self.interacting != interacting {
            self.interacting = interacting;
            self.mark_interaction();
        }
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn is_auto_rotating(&self) -> bool {
        !self.interacting && self.idle_for > self.idle_delay
    }

    /// Advance by `dt` seconds and write the result into `camera`.
    pub fn update(&mut self, dt: f32, camera: &mut HostCamera) {
        self.idle_for += dt.max(0.0);
        if self.is_auto_rotating() {
            self.delta_theta -= TAU / 60.0 * self.auto_rotate_speed * dt;
        }

        self.theta += self.delta_theta * self.damping;
        self.phi += self.delta_phi * self.damping;
        self.phi = self.phi.clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);
        self.radius = (self.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.delta_theta *= 1.0 - self.damping;
        self.delta_phi *= 1.0 - self.damping;
        self.scale = 1.0;

        camera.position = self.position();
        camera.target = self.target;
    }

    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + Vec3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    fn set_from_offset(&mut self, offset: Vec3) {
        self.radius = offset.length();
        if self.radius <= f32::EPSILON {
            self.theta = 0.0;
            self.phi = 0.0;
        } else {
            self.theta = offset.x.atan2(offset.z);
            self.phi = (offset.y / self.radius).clamp(-1.0, 1.0).acos();
        }
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_host(&HostCamera::default())
    }
}

/// Right-drag rotates, the wheel zooms, any key press counts as interaction.
pub fn orbit_camera_controller(
    mut orbit: ResMut<OrbitCamera>,
    mut runtime: NonSendMut<GalaxyRuntime>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    time: Res<Time>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let surface_height = windows
        .single()
        .map(|window| window.height())
        .unwrap_or(1.0);

    orbit.set_interacting(mouse_button.pressed(MouseButton::Right));
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        orbit.rotate(mouse_delta, surface_height);
    }

    if mouse_button.get_just_pressed().next().is_some()
        || keyboard.get_just_pressed().next().is_some()
    {
        orbit.mark_interaction();
    }

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.01,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        orbit.zoom(scroll_accum);
    }

    if let Some(host) = runtime.host_mut() {
        orbit.update(time.delta_secs(), host.camera_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_camera() -> HostCamera {
        HostCamera::default()
    }

    #[test]
    fn test_from_host_round_trips_position() {
        let camera = host_camera();
        let orbit = OrbitCamera::from_host(&camera);
        assert!(orbit.position().distance(camera.position) < 1e-3);
        assert!((orbit.radius - camera.distance_to_target()).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_is_damped_over_frames() {
        let mut camera = host_camera();
        let mut orbit = OrbitCamera::from_host(&camera);
        let start = orbit.theta;

        orbit.rotate(Vec2::new(100.0, 0.0), 800.0);
        orbit.update(1.0 / 60.0, &mut camera);
        let first = (orbit.theta - start).abs();
        orbit.update(1.0 / 60.0, &mut camera);
        let second = (orbit.theta - start).abs() - first;

        assert!(first > 0.0);
        assert!(second > 0.0 && second < first);
    }

    #[test]
    fn test_dragging_right_swings_camera_left() {
        let mut camera = host_camera();
        let mut orbit = OrbitCamera::from_host(&camera);
        orbit.rotate(Vec2::new(50.0, 0.0), 600.0);
        orbit.update(0.016, &mut camera);
        assert!(orbit.theta < 0.0);
        assert!(camera.position.x < 0.0);
    }

    #[test]
    fn test_zoom_clamps_to_distance_range() {
        let mut camera = host_camera();
        let mut orbit = OrbitCamera::from_host(&camera);

        orbit.zoom(500.0);
        orbit.update(0.0, &mut camera);
        assert_eq!(orbit.radius, ORBIT_MIN_DISTANCE);

        orbit.zoom(-5000.0);
        orbit.update(0.0, &mut camera);
        assert_eq!(orbit.radius, ORBIT_MAX_DISTANCE);
        assert!((camera.distance_to_target() - ORBIT_MAX_DISTANCE).abs() < 1e-2);
    }

    #[test]
    fn test_zoom_in_shrinks_radius_once() {
        let mut camera = host_camera();
        let mut orbit = OrbitCamera::from_host(&camera);
        let before = orbit.radius;

        orbit.zoom(1.0);
        orbit.update(0.0, &mut camera);
        let after = orbit.radius;
        assert!((after - before * orbit.zoom_scale()).abs() < 1e-3);

        orbit.update(0.0, &mut camera);
        assert_eq!(orbit.radius, after);
    }

    #[test]
    fn test_polar_angle_stays_inside_poles() {
        let mut camera = host_camera();
        let mut orbit = OrbitCamera::from_host(&camera);
        orbit.rotate(Vec2::new(0.0, 1.0e6), 100.0);
        for _ in 0..200 {
            orbit.update(0.016, &mut camera);
        }
        assert!(orbit.phi >= POLAR_EPSILON);
        assert!(orbit.phi <= std::f32::consts::PI - POLAR_EPSILON);
        assert!(camera.position.is_finite());
    }

    #[test]
    fn test_auto_rotate_waits_for_idle_delay() {
        let mut camera = host_camera();
        let mut orbit = OrbitCamera::from_host(&camera);
        let start = orbit.theta;

        orbit.update(ORBIT_IDLE_DELAY_SECS - 0.5, &mut camera);
        assert!(!orbit.is_auto_rotating());
        assert_eq!(orbit.theta, start);

        orbit.update(1.0, &mut camera);
        assert!(orbit.is_auto_rotating());
        orbit.update(0.016, &mut camera);
        assert!(orbit.theta < start);
    }

    #[test]
    fn test_interaction_resets_idle_and_blocks_auto_rotate() {
        let mut camera = host_camera();
        let mut orbit = OrbitCamera::from_host(&camera);
        orbit.update(ORBIT_IDLE_DELAY_SECS + 1.0, &mut camera);
        assert!(orbit.is_auto_rotating());

        orbit.mark_interaction();
        assert!(!orbit.is_auto_rotating());

        orbit.set_interacting(true);
        orbit.update(ORBIT_IDLE_DELAY_SECS * 4.0, &mut camera);
        assert!(!orbit.is_auto_rotating());
    }

    #[test]
    fn test_update_keeps_target() {
        let mut camera = host_camera();
        camera.target = Vec3::new(1.0, 2.0, 3.0);
        let mut orbit = OrbitCamera::from_host(&camera);
        orbit.rotate(Vec2::new(30.0, -20.0), 500.0);
        orbit.update(0.016, &mut camera);
        assert_eq!(camera.target, Vec3::new(1.0, 2.0, 3.0));
        assert!((camera.distance_to_target() - orbit.radius).abs() < 1e-3);
    }
}
