use std::path::PathBuf;

use bevy::math::Vec3;
use bevy::prelude::Resource;
use clap::Parser;
use constants::render_settings::{CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, CAMERA_POSITION};

use crate::engine::host::HostCamera;

pub const DEFAULT_LOG_FILTER: &str = "info,wgpu=error,naga=warn";

/// Explore a repository's commit history as a 3D galaxy.
#[derive(Parser, Resource, Debug, Clone, PartialEq)]
#[command(name = "chronoscape", version, about)]
pub struct GalaxyConfig {
    /// Commit history JSON export. Defaults to the bundled demo history
    pub history: Option<PathBuf>,

    /// Skip the bloom pass
    #[arg(long)]
    pub no_bloom: bool,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = CAMERA_FOV_DEGREES)]
    pub fov: f32,

    /// Near clip plane
    #[arg(long, default_value_t = CAMERA_NEAR)]
    pub near: f32,

    /// Far clip plane
    #[arg(long, default_value_t = CAMERA_FAR)]
    pub far: f32,

    /// Initial camera position as x,y,z
    #[arg(long, value_parser = parse_vec3, default_value = "0,10,115", allow_hyphen_values = true)]
    pub camera: Vec3,

    /// Log filter in `tracing` env-filter syntax
    #[arg(long, default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            history: None,
            no_bloom: false,
            fov: CAMERA_FOV_DEGREES,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            camera: Vec3::from_array(CAMERA_POSITION),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl GalaxyConfig {
    pub fn bloom_enabled(&self) -> bool {
        !self.no_bloom
    }

    /// Host camera looking at the origin from the configured position.
    pub fn host_camera(&self) -> HostCamera {
        HostCamera {
            position: self.camera,
            fov_degrees: self.fov,
            near: self.near,
            far: self.far,
            ..HostCamera::default()
        }
    }
}

fn parse_vec3(value: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let &[x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got '{value}'"));
    };
    let parse = |part: &str| {
        part.parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{part}' is not a finite number"))
    };
    Ok(Vec3::new(parse(x)?, parse(y)?, parse(z)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = GalaxyConfig::try_parse_from(["chronoscape"]).expect("parse");
        assert_eq!(config, GalaxyConfig::default());
        assert!(config.bloom_enabled());
        assert_eq!(config.host_camera(), HostCamera::default());
    }

    #[test]
    fn test_all_flags() {
        let config = GalaxyConfig::try_parse_from([
            "chronoscape",
            "history.json",
            "--no-bloom",
            "--fov",
            "70",
            "--near",
            "0.5",
            "--far",
            "900",
            "--camera",
            "-5, 2.5,40",
            "--log-filter",
            "debug",
        ])
        .expect("parse");

        assert_eq!(config.history, Some(PathBuf::from("history.json")));
        assert!(!config.bloom_enabled());
        assert_eq!(config.log_filter, "debug");

        let camera = config.host_camera();
        assert_eq!(camera.position, Vec3::new(-5.0, 2.5, 40.0));
        assert_eq!(camera.fov_degrees, 70.0);
        assert_eq!(camera.near, 0.5);
        assert_eq!(camera.far, 900.0);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn test_bad_camera_is_rejected() {
        assert!(GalaxyConfig::try_parse_from(["chronoscape", "--camera", "1,2"]).is_err());
        assert!(GalaxyConfig::try_parse_from(["chronoscape", "--camera", "1,x,3"]).is_err());
        assert!(GalaxyConfig::try_parse_from(["chronoscape", "--camera", "1,inf,3"]).is_err());
    }
}
