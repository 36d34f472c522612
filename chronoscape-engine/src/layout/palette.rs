use bevy::color::{Hsla, LinearRgba, Mix};
use constants::layout::{
    BRANCH_LIGHTNESS, BRANCH_SATURATION, CONTRIBUTOR_LIGHTNESS, CONTRIBUTOR_SATURATION,
    FALLBACK_CONTRIBUTOR_HSL,
};

/// Evenly spaced hue for the `index`-th of `total` discovered labels.
pub fn hue_for_index(index: usize, total: usize) -> f32 {
    let hue = (index as f64 / total.max(1) as f64 * 360.0).round() as u32;
    (hue % 360) as f32
}

fn hsl_percent(hue: f32, saturation: f32, lightness: f32) -> Hsla {
    Hsla::hsl(hue, saturation / 100.0, lightness / 100.0)
}

pub fn branch_color(index: usize, total: usize) -> Hsla {
    hsl_percent(hue_for_index(index, total), BRANCH_SATURATION, BRANCH_LIGHTNESS)
}

pub fn contributor_color(index: usize, total: usize) -> Hsla {
    hsl_percent(
        hue_for_index(index, total),
        CONTRIBUTOR_SATURATION,
        CONTRIBUTOR_LIGHTNESS,
    )
}

pub fn fallback_contributor_color() -> Hsla {
    let [hue, saturation, lightness] = FALLBACK_CONTRIBUTOR_HSL;
    hsl_percent(hue, saturation, lightness)
}

/// Shift saturation and lightness, clamped to the unit range.
pub fn offset_hsl(color: Hsla, saturation: f32, lightness: f32) -> Hsla {
    Hsla {
        saturation: (color.saturation + saturation).clamp(0.0, 1.0),
        lightness: (color.lightness + lightness).clamp(0.0, 1.0),
        ..color
    }
}

/// Linear colour multiplied by `factor`, alpha untouched.
pub fn scaled_linear(color: Hsla, factor: f32) -> LinearRgba {
    let linear = LinearRgba::from(color);
    LinearRgba::rgb(
        linear.red * factor,
        linear.green * factor,
        linear.blue * factor,
    )
}

pub fn mix_towards_white(color: Hsla, amount: f32) -> LinearRgba {
    LinearRgba::from(color).mix(&LinearRgba::WHITE, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hue_spacing() {
        assert_eq!(hue_for_index(0, 1), 0.0);
        assert_eq!(hue_for_index(1, 3), 120.0);
        assert_eq!(hue_for_index(2, 3), 240.0);
        assert_eq!(hue_for_index(1, 7), 51.0);
        // Zero total behaves like one.
        assert_eq!(hue_for_index(0, 0), 0.0);
    }

    #[test]
    fn test_branch_palette_parameters() {
        let color = branch_color(0, 1);
        assert_eq!(color.hue, 0.0);
        assert!((color.saturation - 0.9).abs() < 1e-6);
        assert!((color.lightness - 0.64).abs() < 1e-6);
    }

    #[test]
    fn test_offset_clamps() {
        let color = offset_hsl(Hsla::hsl(10.0, 0.95, 0.95), 0.1, 0.12);
        assert_eq!(color.saturation, 1.0);
        assert_eq!(color.lightness, 1.0);
        assert_eq!(color.hue, 10.0);
    }

    #[test]
    fn test_white_mix_endpoints() {
        let color = branch_color(0, 2);
        assert_eq!(mix_towards_white(color, 0.0), LinearRgba::from(color));
        let white = mix_towards_white(color, 1.0);
        assert!((white.red - 1.0).abs() < 1e-6);
        assert!((white.green - 1.0).abs() < 1e-6);
        assert!((white.blue - 1.0).abs() < 1e-6);
    }
}
