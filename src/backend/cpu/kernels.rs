//! Software versions of every shader pass the effects record.

use glam::{Vec2, Vec4};

use super::image::Image;
use crate::effects::{CocBand, KernelSize, LensParams, ThresholdParams};

/// 4-tap box filter; taps sit `scale` texels from the center on each diagonal.
pub fn box4(src: &Image, uv: Vec2, scale: f32) -> Vec4 {
    let d = src.texel_size() * scale;
    (src.sample(uv + Vec2::new(-d.x, -d.y))
        + src.sample(uv + Vec2::new(d.x, -d.y))
        + src.sample(uv + Vec2::new(-d.x, d.y))
        + src.sample(uv + Vec2::new(d.x, d.y)))
        * 0.25
}

/// 9-tap tent filter (1 2 1 / 2 4 2 / 1 2 1).
pub fn tent9(src: &Image, uv: Vec2, scale: f32) -> Vec4 {
    let d = src.texel_size() * scale;
    let mut sum = Vec4::ZERO;
    for (j, wy) in [(-1.0, 1.0), (0.0, 2.0), (1.0, 1.0)] {
        for (i, wx) in [(-1.0, 1.0), (0.0, 2.0), (1.0, 1.0)] {
            sum += src.sample(uv + Vec2::new(i * d.x, j * d.y)) * (wx * wy);
        }
    }
    sum / 16.0
}

pub fn bloom_prefilter(src: &Image, size: (u32, u32), threshold: Vec4, scale: f32) -> Image {
    Image::from_fn(size.0, size.1, |uv| {
        ThresholdParams::apply(threshold, box4(src, uv, scale))
    })
}

pub fn bloom_downsample(src: &Image, size: (u32, u32), scale: f32) -> Image {
    Image::from_fn(size.0, size.1, |uv| box4(src, uv, scale))
}

/// Tent-filtered coarse level plus the matching finer level.
pub fn bloom_upsample(coarse: &Image, finer: &Image, size: (u32, u32), scale: f32) -> Image {
    Image::from_fn(size.0, size.1, |uv| {
        let color = tent9(coarse, uv, scale) + finer.sample(uv);
        color.truncate().extend(1.0)
    })
}

pub fn custom_bloom_prefilter(
    src: &Image,
    size: (u32, u32),
    exposure: f32,
    linear_clamp: f32,
    threshold: Vec4,
) -> Image {
    Image::from_fn(size.0, size.1, |uv| {
        let color = src.sample(uv) * exposure;
        let color = color.truncate().min(glam::Vec3::splat(linear_clamp)).extend(color.w);
        ThresholdParams::apply(threshold, color)
    })
}

pub fn custom_bloom_blur(src: &Image, size: (u32, u32), bluriness: f32) -> Image {
    Image::from_fn(size.0, size.1, |uv| box4(src, uv, bluriness))
}

pub fn dof_downsample(src: &Image, size: (u32, u32)) -> Image {
    Image::from_fn(size.0, size.1, |uv| box4(src, uv, 0.5))
}

/// Separable-weight 2-D gaussian over a square footprint of `2·ceil(2σ)+1` taps.
pub fn dof_blur(src: &Image, size: (u32, u32), kernel: KernelSize) -> Image {
    let sigma = kernel.sigma();
    let radius = (sigma * 2.0).ceil() as i32;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let norm: f32 = weights.iter().sum::<f32>().powi(2);
    let texel = src.texel_size();

    Image::from_fn(size.0, size.1, |uv| {
        let mut sum = Vec4::ZERO;
        for (j, wy) in (-radius..=radius).zip(&weights) {
            for (i, wx) in (-radius..=radius).zip(&weights) {
                let offset = Vec2::new(i as f32 * texel.x, j as f32 * texel.y);
                sum += src.sample(uv + offset) * (wx * wy);
            }
        }
        sum / norm
    })
}

pub fn dof_upsample(src: &Image, size: (u32, u32)) -> Image {
    Image::from_fn(size.0, size.1, |uv| tent9(src, uv, 0.5))
}

/// How the composite turns depth into a blur weight.
#[derive(Debug, Clone, Copy)]
pub enum FocusWeight {
    Band(CocBand),
    Lens(LensParams),
}

impl FocusWeight {
    pub fn blur_weight(&self, depth: f32) -> f32 {
        match self {
            Self::Band(band) => band.blur_weight(depth),
            Self::Lens(lens) => lens.blur_weight(depth),
        }
    }
}

pub fn dof_composite(
    sharp: &Image,
    blurred: &Image,
    depth: &Image,
    size: (u32, u32),
    focus: FocusWeight,
) -> Image {
    Image::from_fn(size.0, size.1, |uv| {
        let color = sharp.sample(uv);
        let weight = focus.blur_weight(depth.sample(uv).x);
        color
            .truncate()
            .lerp(blurred.sample(uv).truncate(), weight)
            .extend(color.w)
    })
}

pub fn uber(src: &Image, bloom: Option<(&Image, f32)>, size: (u32, u32)) -> Image {
    Image::from_fn(size.0, size.1, |uv| {
        let color = src.sample(uv);
        match bloom {
            Some((bloom, intensity)) => {
                (color.truncate() + bloom.sample(uv).truncate() * intensity).extend(color.w)
            }
            None => color,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn filters_preserve_flat_fields() {
        let flat = Image::filled(8, 8, Vec4::splat(0.3));
        assert_relative_eq!(box4(&flat, Vec2::splat(0.5), 2.0).x, 0.3, epsilon = 1e-6);
        assert_relative_eq!(tent9(&flat, Vec2::splat(0.1), 1.0).y, 0.3, epsilon = 1e-6);
        let blurred = dof_blur(&flat, (4, 4), KernelSize::VeryLarge);
        assert_relative_eq!(blurred.average().z, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn composite_blends_by_depth() {
        let sharp = Image::filled(4, 1, Vec4::new(1.0, 1.0, 1.0, 1.0));
        let blurred = Image::filled(4, 1, Vec4::ZERO);
        let depth = Image::depth_from_fn(4, 1, |uv| if uv.x < 0.5 { 20.0 } else { 500.0 });
        let band = CocBand::from_vector(Vec4::new(-31.0, 19.0, 21.0, 71.0));
        let out = dof_composite(&sharp, &blurred, &depth, (4, 1), FocusWeight::Band(band));
        assert_eq!(out.texel(0, 0), Vec4::ONE);
        assert_eq!(out.texel(3, 0), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }
}
