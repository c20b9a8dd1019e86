use glam::{Mat3, Vec3};

/// sRGB → AP1 with the RRT saturation folded in (column-major).
const ACES_INPUT: Mat3 = Mat3::from_cols_array(&[
    0.59719, 0.07600, 0.02840, //
    0.35458, 0.90834, 0.13383, //
    0.04823, 0.01566, 0.83777,
]);

/// ODT saturation and AP1 → sRGB (column-major).
const ACES_OUTPUT: Mat3 = Mat3::from_cols_array(&[
    1.60475, -0.10208, -0.00327, //
    -0.53108, 1.10813, -0.07276, //
    -0.07367, -0.00605, 1.07602,
]);

fn rrt_and_odt_fit(v: Vec3) -> Vec3 {
    let a = v * (v + 0.024_578_6) - 0.000_090_537;
    let b = v * (0.983_729 * v + 0.432_951) + 0.238_081;
    a / b
}

/// ACES filmic tone mapping of a linear HDR color, clamped to `[0, 1]`.
///
/// Mirrors `aces_filmic` in the surface shader. The 1/0.6 factor keeps an
/// exposure of 1 looking like the usual filmic curve.
pub fn aces_filmic(color: Vec3, exposure: f32) -> Vec3 {
    let color = color * (exposure / 0.6);
    let color = ACES_INPUT * color;
    let color = rrt_and_odt_fit(color);
    (ACES_OUTPUT * color).clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_stays_black() {
        assert!(aces_filmic(Vec3::ZERO, 1.0).max_element() < 1e-3);
    }

    #[test]
    fn bright_values_saturate() {
        let out = aces_filmic(Vec3::splat(1000.0), 1.0);
        assert!(out.min_element() > 0.99);
        assert!(out.max_element() <= 1.0);
    }

    #[test]
    fn monotonic_in_intensity() {
        let mut last = 0.0;
        for i in 1..50 {
            let v = aces_filmic(Vec3::splat(i as f32 * 0.1), 1.0).x;
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn exposure_brightens() {
        let grey = Vec3::splat(0.18);
        assert!(aces_filmic(grey, 2.0).x > aces_filmic(grey, 1.0).x);
    }
}
