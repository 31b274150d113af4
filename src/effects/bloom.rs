//! Bloom Effect
//!
//! Multi-scale bloom built from a half-resolution mip pyramid:
//! 1. Prefilter: soft-knee threshold into the first level
//! 2. Downsample chain: each level halves the previous one
//! 3. Upsample chain: tent-filtered coarse level added onto the finer one
//!
//! The finest upsampled level is published to the uber composite.

use glam::Vec4;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{BloomPyramid, EffectStage, PostProcessEffect, ThresholdParams};
use crate::config::KNEE_EPSILON;
use crate::error::{PostFxError, Result};
use crate::params::{
    ParameterDescriptor, ParameterKind, ParameterSet, ParameterValue, SharedSettings, ValueRange,
};
use crate::render::{
    halve, ids, BloomPass, PropertySheet, RenderContext, ShaderKeyword, ShaderPass, TextureDesc,
    TransientTarget,
};

/// Settings for the pyramid bloom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    /// Strength of the filter; zero disables the effect.
    pub intensity: f32,
    /// Gamma-space brightness cutoff.
    pub threshold: f32,
    /// Extra pyramid levels beyond the first.
    pub bluriness: i32,
    /// Scale applied to the sampling offsets of every pass.
    pub offset_scale: i32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.0,
            threshold: 1.0,
            bluriness: 1,
            offset_scale: 2,
        }
    }
}

const DESCRIPTORS: [ParameterDescriptor; 4] = [
    ParameterDescriptor {
        name: "intensity",
        display_name: "Intensity",
        tooltip: "Strength of the bloom filter. Values higher than 1 will make bloom contribute more energy to the final render.",
        kind: ParameterKind::Float(ValueRange::min(0.0)),
        inspector: true,
    },
    ParameterDescriptor {
        name: "threshold",
        display_name: "Threshold",
        tooltip: "Filters out pixels under this level of brightness. Value is in gamma-space.",
        kind: ParameterKind::Float(ValueRange::min(0.0)),
        inspector: true,
    },
    ParameterDescriptor {
        name: "bluriness",
        display_name: "Bluriness",
        tooltip: "Number of extra pyramid levels. Higher values spread the glow further.",
        kind: ParameterKind::Int { min: 0, max: 3 },
        inspector: true,
    },
    ParameterDescriptor {
        name: "offset_scale",
        display_name: "Offset",
        tooltip: "Sampling offset scale of the blur kernels.",
        kind: ParameterKind::Int { min: 1, max: 4 },
        inspector: false,
    },
];

impl ParameterSet for BloomSettings {
    fn title(&self) -> &'static str {
        "Bloom"
    }

    fn descriptors(&self) -> Vec<ParameterDescriptor> {
        DESCRIPTORS.to_vec()
    }

    fn get(&self, name: &str) -> Option<ParameterValue> {
        match name {
            "intensity" => Some(ParameterValue::Float(self.intensity)),
            "threshold" => Some(ParameterValue::Float(self.threshold)),
            "bluriness" => Some(ParameterValue::Int(self.bluriness)),
            "offset_scale" => Some(ParameterValue::Int(self.offset_scale)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        match (name, descriptor.coerce(self.title(), value)?) {
            ("intensity", ParameterValue::Float(v)) => self.intensity = v,
            ("threshold", ParameterValue::Float(v)) => self.threshold = v,
            ("bluriness", ParameterValue::Int(v)) => self.bluriness = v,
            ("offset_scale", ParameterValue::Int(v)) => self.offset_scale = v,
            _ => {
                return Err(PostFxError::UnknownParameter {
                    effect: self.title(),
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Pyramid bloom renderer.
pub struct BloomEffect {
    settings: SharedSettings<BloomSettings>,
    pyramid: Option<BloomPyramid>,
    sheet: PropertySheet,
}

impl BloomEffect {
    pub fn new() -> Self {
        Self::with_settings(BloomSettings::default())
    }

    pub fn with_settings(settings: BloomSettings) -> Self {
        Self::with_shared(SharedSettings::new(settings))
    }

    /// Uses a handle an editor keeps writing to.
    pub fn with_shared(settings: SharedSettings<BloomSettings>) -> Self {
        Self {
            settings,
            pyramid: None,
            sheet: PropertySheet::new(),
        }
    }

    pub fn settings(&self) -> &SharedSettings<BloomSettings> {
        &self.settings
    }

    /// The level ids, once [`PostProcessEffect::init`] has run.
    pub fn pyramid(&self) -> Option<&BloomPyramid> {
        self.pyramid.as_ref()
    }
}

impl Default for BloomEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl PostProcessEffect for BloomEffect {
    fn name(&self) -> &'static str {
        "Bloom"
    }

    fn stage(&self) -> EffectStage {
        EffectStage::Uber
    }

    fn init(&mut self) {
        self.pyramid = Some(BloomPyramid::new());
        self.settings.read(|s| {
            info!(
                "Bloom initialised (threshold: {}, intensity: {}, bluriness: {})",
                s.threshold, s.intensity, s.bluriness
            )
        });
    }

    fn is_enabled_and_supported(&self, _ctx: &RenderContext) -> bool {
        self.settings.read(|s| s.enabled && s.intensity > 0.0)
    }

    fn render(&mut self, ctx: &mut RenderContext) {
        let settings = self.settings.snapshot();
        let pyramid = self.pyramid.get_or_insert_with(BloomPyramid::new);

        ctx.begin_sample("BloomPyramid");

        // Half resolution is enough for bloom and saves fill rate.
        let mut tw = halve(ctx.screen_width);
        let mut th = halve(ctx.screen_height);

        let threshold = ThresholdParams::soft_knee(settings.threshold, KNEE_EPSILON);
        self.sheet.clear();
        self.sheet.set_vector(ids::THRESHOLD, threshold.to_vector());
        self.sheet
            .set_float(ids::SAMPLE_SCALE, settings.offset_scale as f32);

        let iterations = BloomPyramid::clamp_iterations(settings.bluriness.saturating_add(1));
        debug!("bloom pyramid: {iterations} levels from {tw}x{th}");

        let mut downs: Vec<TransientTarget> = Vec::with_capacity(iterations);
        let mut ups: Vec<TransientTarget> = Vec::with_capacity(iterations);

        let mut last_down = ctx.source;
        for i in 0..iterations {
            let level = pyramid.level(i);
            let desc = TextureDesc::bilinear(tw, th, ctx.source_format);
            let down = ctx.get_temporary(level.down, desc);
            let up = ctx.get_temporary(level.up, desc);
            let pass = if i == 0 {
                BloomPass::Prefilter
            } else {
                BloomPass::Downsample
            };
            ctx.blit(last_down, down.target(), &self.sheet, ShaderPass::Bloom(pass));

            last_down = down.target();
            downs.push(down);
            ups.push(up);
            tw = halve(tw);
            th = halve(th);
        }

        let mut last_up = downs[iterations - 1].target();
        for i in (0..iterations - 1).rev() {
            self.sheet.set_texture(ids::BLOOM_TEX, downs[i].target());
            ctx.blit(
                last_up,
                ups[i].target(),
                &self.sheet,
                ShaderPass::Bloom(BloomPass::Upsample),
            );
            last_up = ups[i].target();
        }

        // With a single level the prefilter result is the output.
        let output = if iterations == 1 {
            downs.remove(0)
        } else {
            ups.remove(0)
        };
        debug_assert_eq!(output.target(), last_up);

        let shader_settings = Vec4::new(
            settings.offset_scale as f32,
            settings.intensity,
            0.0,
            iterations as f32,
        );
        ctx.publish_bloom(output, ShaderKeyword::BloomLow, shader_settings);

        for target in downs.into_iter().chain(ups) {
            ctx.release(target);
        }

        ctx.end_sample("BloomPyramid");
    }

    fn release(&mut self) {
        info!("Bloom released");
    }
}
