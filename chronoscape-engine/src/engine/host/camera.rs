use bevy::math::{Dir3, Mat4, Ray3d, Vec2, Vec3};
use constants::render_settings::{CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, CAMERA_POSITION};

/// Perspective camera owned by the render host.
///
/// The Bevy camera entity is a mirror of this; input systems and the orbit
/// controller mutate it through the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Default for HostCamera {
    fn default() -> Self {
        Self {
            position: Vec3::from_array(CAMERA_POSITION),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: CAMERA_FOV_DEGREES,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            aspect: 1.0,
        }
    }
}

impl HostCamera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect.max(f32::EPSILON),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Picking ray through a point in normalised device coordinates.
    ///
    /// `ndc` is in `[-1, 1]` with +y up. The ray starts at the camera.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray3d {
        let inverse = self.view_projection().inverse();
        let far_point = inverse.project_point3(ndc.extend(1.0));
        let direction = Dir3::new(far_point - self.position).unwrap_or(self.forward());
        Ray3d::new(self.position, direction)
    }

    pub fn forward(&self) -> Dir3 {
        Dir3::new(self.target - self.position).unwrap_or(Dir3::NEG_Z)
    }

    pub fn distance_to_target(&self) -> f32 {
        self.position.distance(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let camera = HostCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 10.0, 115.0));
        assert_eq!(camera.fov_degrees, 56.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 6000.0);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = HostCamera {
            aspect: 16.0 / 9.0,
            ..HostCamera::default()
        };
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        let expected = camera.forward();
        assert_eq!(ray.origin, camera.position);
        assert!(ray.direction.dot(*expected) > 0.9999);
    }

    #[test]
    fn test_right_edge_ray_leans_right() {
        let camera = HostCamera {
            position: Vec3::new(0.0, 0.0, 10.0),
            ..HostCamera::default()
        };
        let ray = camera.ray_from_ndc(Vec2::new(1.0, 0.0));
        assert!(ray.direction.x > 0.0);
        // Half the horizontal fov at aspect 1 equals half the vertical fov.
        let angle = ray.direction.angle_between(Vec3::NEG_Z).to_degrees();
        assert!((angle - 28.0).abs() < 0.01);
    }
}
