use glam::Vec4;

use crate::config::MIN_KNEE;
use crate::utils::gamma_to_linear_space;

/// Soft-knee brightness cutoff in linear space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    pub linear_threshold: f32,
    pub knee: f32,
}

impl ThresholdParams {
    /// `threshold` is gamma-space; the knee spans half the linear threshold plus `knee_bias`.
    pub fn soft_knee(threshold: f32, knee_bias: f32) -> Self {
        let linear_threshold = gamma_to_linear_space(threshold.max(0.0));
        Self {
            linear_threshold,
            knee: linear_threshold * 0.5 + knee_bias,
        }
    }

    /// `(threshold, threshold - knee, 2 * knee, 0.25 / knee)`.
    pub fn to_vector(&self) -> Vec4 {
        Vec4::new(
            self.linear_threshold,
            self.linear_threshold - self.knee,
            self.knee * 2.0,
            0.25 / self.knee.max(MIN_KNEE),
        )
    }

    /// Applies the quadratic soft-knee curve to a linear color.
    pub fn apply(vector: Vec4, color: Vec4) -> Vec4 {
        let brightness = color.x.max(color.y).max(color.z);
        let soft = (brightness - vector.y).max(0.0).min(vector.z);
        let soft = vector.w * soft * soft;
        let contribution = soft.max(brightness - vector.x) / brightness.max(1e-4);
        (color.truncate() * contribution).extend(color.w)
    }
}
