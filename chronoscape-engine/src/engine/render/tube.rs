use std::f32::consts::TAU;

use bevy::math::{Quat, Vec3};

use super::catmull_rom::CatmullRomCurve;
use crate::engine::host::TubeMesh;

/// Orthonormal frame carried along a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFrame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

/// `segments + 1` frames at evenly spaced arc-length positions.
///
/// The first normal is perpendicular to the tangent's smallest component,
/// later ones are parallel-transported so the tube never twists abruptly.
pub fn curve_frames(curve: &CatmullRomCurve, segments: usize) -> Vec<CurveFrame> {
    let segments = segments.max(1);
    let tangents: Vec<Vec3> = (0..=segments)
        .map(|step| curve.tangent_at(step as f32 / segments as f32))
        .collect();

    let first = tangents[0];
    let seed = smallest_axis(first);
    let side = first.cross(seed).normalize_or(Vec3::Y);
    let mut normal = first.cross(side);
    let mut binormal = first.cross(normal);

    let mut frames = Vec::with_capacity(tangents.len());
    frames.push(CurveFrame {
        tangent: first,
        normal,
        binormal,
    });

    for pair in tangents.windows(2) {
        let (previous, tangent) = (pair[0], pair[1]);
        let axis = previous.cross(tangent);
        if axis.length() > f32::EPSILON {
            let theta = previous.dot(tangent).clamp(-1.0, 1.0).acos();
            normal = Quat::from_axis_angle(axis.normalize(), theta) * normal;
        }
        binormal = tangent.cross(normal);
        frames.push(CurveFrame {
            tangent,
            normal,
            binormal,
        });
    }
    frames
}

fn smallest_axis(tangent: Vec3) -> Vec3 {
    let magnitude = tangent.abs();
    let mut min = f32::MAX;
    let mut axis = Vec3::X;
    if magnitude.x <= min {
        min = magnitude.x;
        axis = Vec3::X;
    }
    if magnitude.y <= min {
        min = magnitude.y;
        axis = Vec3::Y;
    }
    if magnitude.z <= min {
        axis = Vec3::Z;
    }
    axis
}

/// Sweep a circle of `radius` along `curve`.
///
/// Produces `(tubular_segments + 1) * (radial_segments + 1)` vertices; the
/// seam column is duplicated so each ring closes on itself.
pub fn tube_mesh(
    curve: &CatmullRomCurve,
    tubular_segments: usize,
    radius: f32,
    radial_segments: usize,
) -> TubeMesh {
    let tubular_segments = tubular_segments.max(1);
    let radial_segments = radial_segments.max(3);
    let frames = curve_frames(curve, tubular_segments);
    let ring = radial_segments + 1;

    let mut mesh = TubeMesh {
        positions: Vec::with_capacity(frames.len() * ring),
        normals: Vec::with_capacity(frames.len() * ring),
        indices: Vec::with_capacity(tubular_segments * radial_segments * 6),
    };

    for (step, frame) in frames.iter().enumerate() {
        let center = curve.point_at(step as f32 / tubular_segments as f32);
        for around in 0..=radial_segments {
            let angle = around as f32 / radial_segments as f32 * TAU;
            let normal =
                (frame.normal * -angle.cos() + frame.binormal * angle.sin()).normalize_or(frame.normal);
            mesh.normals.push(normal.to_array());
            mesh.positions.push((center + normal * radius).to_array());
        }
    }

    let ring = ring as u32;
    for step in 1..=tubular_segments as u32 {
        for around in 1..=radial_segments as u32 {
            let a = ring * (step - 1) + (around - 1);
            let b = ring * step + (around - 1);
            let c = ring * step + around;
            let d = ring * (step - 1) + around;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bent_curve() -> CatmullRomCurve {
        CatmullRomCurve::new(vec![
            Vec3::ZERO,
            Vec3::new(4.0, 1.0, 0.0),
            Vec3::new(6.0, 5.0, 2.0),
            Vec3::new(5.0, 9.0, 6.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_frames_are_orthonormal() {
        for frame in curve_frames(&bent_curve(), 48) {
            assert!((frame.tangent.length() - 1.0).abs() < 1e-3);
            assert!((frame.normal.length() - 1.0).abs() < 1e-3);
            assert!(frame.tangent.dot(frame.normal).abs() < 1e-2);
            assert!(frame.binormal.dot(frame.normal).abs() < 1e-2);
        }
    }

    #[test]
    fn test_tube_vertex_and_index_counts() {
        let mesh = tube_mesh(&bent_curve(), 24, 0.2, 10);
        assert_eq!(mesh.positions.len(), 25 * 11);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(mesh.indices.len(), 24 * 10 * 6);
        let max_index = mesh.indices.iter().copied().max().unwrap() as usize;
        assert!(max_index < mesh.positions.len());
    }

    #[test]
    fn test_tube_vertices_sit_at_radius() {
        let curve = CatmullRomCurve::new(vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 8.0)]).unwrap();
        let mesh = tube_mesh(&curve, 4, 0.08, 8);
        for (step, ring) in mesh.positions.chunks(9).enumerate() {
            let center = curve.point_at(step as f32 / 4.0);
            for position in ring {
                let distance = Vec3::from_array(*position).distance(center);
                assert!((distance - 0.08).abs() < 1e-4);
            }
        }
    }
}
