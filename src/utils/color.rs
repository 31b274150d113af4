//! Color-space helpers shared by the threshold and intensity math.

/// Converts a gamma-space value to linear space using the sRGB curve.
///
/// Values above 1 continue along a pure 2.2 power so HDR thresholds stay monotonic.
pub fn gamma_to_linear_space(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else if value < 1.0 {
        ((value + 0.055) / 1.055).powf(2.4)
    } else if value == 1.0 {
        1.0
    } else {
        value.powf(2.2)
    }
}

/// Perceptual intensity curve used by the two-pass bloom slider: `2^(x/10) - 1`.
pub fn exp2_intensity(intensity: f32) -> f32 {
    (intensity / 10.0).exp2() - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Inverse of [`gamma_to_linear_space`].
    fn linear_to_gamma_space(value: f32) -> f32 {
        if value <= 0.0 {
            0.0
        } else if value <= 0.003_130_8 {
            value * 12.92
        } else if value < 1.0 {
            1.055 * value.powf(1.0 / 2.4) - 0.055
        } else if value == 1.0 {
            1.0
        } else {
            value.powf(1.0 / 2.2)
        }
    }

    #[test]
    fn gamma_curve_hits_known_points() {
        assert_eq!(gamma_to_linear_space(0.0), 0.0);
        assert_eq!(gamma_to_linear_space(1.0), 1.0);
        assert_relative_eq!(gamma_to_linear_space(0.5), 0.214_041, epsilon = 1e-5);
        assert_relative_eq!(gamma_to_linear_space(2.0), 2.0_f32.powf(2.2), epsilon = 1e-5);
    }

    #[test]
    fn gamma_round_trip_is_close() {
        for value in [0.01_f32, 0.2, 0.5, 0.9, 1.5, 4.0] {
            let back = linear_to_gamma_space(gamma_to_linear_space(value));
            assert_relative_eq!(back, value, epsilon = 1e-4);
        }
    }

    #[test]
    fn intensity_curve_starts_at_zero() {
        assert_eq!(exp2_intensity(0.0), 0.0);
        assert_relative_eq!(exp2_intensity(10.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn intensity_curve_is_strictly_increasing() {
        let mut previous = exp2_intensity(0.0);
        for step in 1..=1000 {
            let value = exp2_intensity(step as f32 * 0.1);
            assert!(value > previous, "not increasing at {}", step as f32 * 0.1);
            previous = value;
        }
    }
}
