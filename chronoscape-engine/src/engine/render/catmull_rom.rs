//! Open centripetal Catmull-Rom spline with an arc-length table.

use bevy::math::Vec3;
use constants::render_settings::CURVE_ARC_LENGTH_DIVISIONS;

const CENTRIPETAL_POWER: f32 = 0.25;
const MIN_KNOT_INTERVAL: f32 = 1e-4;
const TANGENT_DELTA: f32 = 1e-4;

/// Cubic in Hermite form: `c0 + c1 t + c2 t^2 + c3 t^3`.
#[derive(Debug, Clone, Copy)]
struct Cubic {
    c0: f32,
    c1: f32,
    c2: f32,
    c3: f32,
}

impl Cubic {
    fn hermite(x0: f32, x1: f32, t0: f32, t1: f32) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    // Non-uniform Catmull-Rom segment between x1 and x2, tangents rescaled to dt1
    fn nonuniform(x0: f32, x1: f32, x2: f32, x3: f32, dt0: f32, dt1: f32, dt2: f32) -> Self {
        let t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        Self::hermite(x1, x2, t1 * dt1, t2 * dt1)
    }

    fn eval(&self, t: f32) -> f32 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomCurve {
    points: Vec<Vec3>,
    arc_lengths: Vec<f32>,
}

impl CatmullRomCurve {
    /// Returns `None` for fewer than two control points.
    pub fn new(points: Vec<Vec3>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut curve = Self {
            points,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_arc_lengths(CURVE_ARC_LENGTH_DIVISIONS);
        Some(curve)
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at curve parameter `t` in `[0, 1]`, spaced by control point.
    pub fn point(&self, t: f32) -> Vec3 {
        let points = &self.points;
        let count = points.len();
        let scaled = (count - 1) as f32 * t.clamp(0.0, 1.0);
        let mut segment = scaled.floor() as usize;
        let mut weight = scaled - segment as f32;
        if segment >= count - 1 {
            segment = count - 2;
            weight = 1.0;
        }

        let p1 = points[segment];
        let p2 = points[segment + 1];
        // Open ends are extrapolated by mirroring the neighbouring point.
        let p0 = if segment > 0 {
            points[segment - 1]
        } else {
            p1 + (p1 - p2)
        };
        let p3 = if segment + 2 < count {
            points[segment + 2]
        } else {
            p2 + (p2 - p1)
        };

        let mut dt1 = p1.distance_squared(p2).powf(CENTRIPETAL_POWER);
        let mut dt0 = p0.distance_squared(p1).powf(CENTRIPETAL_POWER);
        let mut dt2 = p2.distance_squared(p3).powf(CENTRIPETAL_POWER);
        if dt1 < MIN_KNOT_INTERVAL {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_INTERVAL {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_INTERVAL {
            dt2 = dt1;
        }

        Vec3::new(
            Cubic::nonuniform(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2).eval(weight),
            Cubic::nonuniform(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2).eval(weight),
            Cubic::nonuniform(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2).eval(weight),
        )
    }

    /// Point at arc-length fraction `u` in `[0, 1]`.
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.point(self.u_to_t(u))
    }

    /// Unit tangent at parameter `t`, by central difference.
    pub fn tangent(&self, t: f32) -> Vec3 {
        let before = (t - TANGENT_DELTA).max(0.0);
        let after = (t + TANGENT_DELTA).min(1.0);
        (self.point(after) - self.point(before)).normalize_or(Vec3::X)
    }

    pub fn tangent_at(&self, u: f32) -> Vec3 {
        self.tangent(self.u_to_t(u))
    }

    /// `divisions + 1` points evenly spaced in parameter.
    pub fn sample_points(&self, divisions: usize) -> Vec<Vec3> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|step| self.point(step as f32 / divisions as f32))
            .collect()
    }

    fn compute_arc_lengths(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut previous = self.point(0.0);
        let mut total = 0.0;
        lengths.push(0.0);
        for step in 1..=divisions {
            let current = self.point(step as f32 / divisions as f32);
            total += current.distance(previous);
            lengths.push(total);
            previous = current;
        }
        lengths
    }

    fn u_to_t(&self, u: f32) -> f32 {
        let lengths = &self.arc_lengths;
        let last = lengths.len() - 1;
        let total = lengths[last];
        if total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }

        let target = u.clamp(0.0, 1.0) * total;
        // Last table entry not beyond the target length.
        let index = lengths
            .partition_point(|length| *length <= target)
            .saturating_sub(1)
            .min(last);
        if index == last || lengths[index] == target {
            return index as f32 / last as f32;
        }

        let before = lengths[index];
        let segment = lengths[index + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (index as f32 + fraction) / last as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_needs_two_points() {
        assert!(CatmullRomCurve::new(vec![]).is_none());
        assert!(CatmullRomCurve::new(vec![Vec3::ONE]).is_none());
    }

    #[test]
    fn test_interpolates_control_points() {
        let points = vec![
            Vec3::ZERO,
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(4.0, -1.0, 3.0),
            Vec3::new(7.0, 0.0, 1.0),
        ];
        let curve = CatmullRomCurve::new(points.clone()).unwrap();
        for (index, point) in points.iter().enumerate() {
            assert_close(curve.point(index as f32 / 3.0), *point);
        }
    }

    #[test]
    fn test_straight_line_stays_straight() {
        let curve = CatmullRomCurve::new(vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)]).unwrap();
        assert_close(curve.point(0.5), Vec3::new(5.0, 0.0, 0.0));
        assert!((curve.length() - 10.0).abs() < 1e-3);
        assert_close(curve.point_at(0.25), Vec3::new(2.5, 0.0, 0.0));
        assert_close(curve.tangent_at(0.5), Vec3::X);
    }

    #[test]
    fn test_sample_count() {
        let curve = CatmullRomCurve::new(vec![Vec3::ZERO, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)]).unwrap();
        let samples = curve.sample_points(24);
        assert_eq!(samples.len(), 25);
        assert_close(samples[0], Vec3::ZERO);
        assert_close(samples[24], Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_coincident_points_stay_finite() {
        let curve = CatmullRomCurve::new(vec![Vec3::ONE, Vec3::ONE, Vec3::ONE]).unwrap();
        assert_eq!(curve.length(), 0.0);
        for step in 0..=10 {
            let point = curve.point_at(step as f32 / 10.0);
            assert!(point.is_finite());
            assert!(curve.tangent_at(step as f32 / 10.0).is_finite());
        }
    }

    #[test]
    fn test_arc_length_mapping_is_monotonic() {
        let curve = CatmullRomCurve::new(vec![
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.1, 5.0, 0.0),
            Vec3::new(9.0, 5.0, 2.0),
        ])
        .unwrap();
        let mut previous = -1.0;
        for step in 0..=50 {
            let t = curve.u_to_t(step as f32 / 50.0);
            assert!(t >= previous);
            previous = t;
        }
        assert!((previous - 1.0).abs() < 1e-6);
    }
}
