//! Two-pass bloom: a fixed full/half resolution ping-pong instead of a pyramid.

use glam::Vec4;
use log::info;
use serde::{Deserialize, Serialize};

use super::{EffectStage, PostProcessEffect, ThresholdParams};
use crate::config::HALF_MAX;
use crate::error::{PostFxError, Result};
use crate::params::{
    ParameterDescriptor, ParameterKind, ParameterSet, ParameterValue, SharedSettings, ValueRange,
};
use crate::render::{
    halve, ids, CustomBloomPass, NameId, PropertySheet, RenderContext, ShaderKeyword, ShaderPass,
    TextureDesc,
};
use crate::utils::{exp2_intensity, gamma_to_linear_space};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomBloomSettings {
    pub enabled: bool,
    /// Slider value; remapped through `2^(x/10) - 1` before use.
    pub intensity: f32,
    /// Gamma-space brightness cutoff.
    pub threshold: f32,
    /// Sampling offset of the blur passes.
    pub bluriness: f32,
}

impl Default for CustomBloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.0,
            threshold: 1.0,
            bluriness: 1.0,
        }
    }
}

const DESCRIPTORS: [ParameterDescriptor; 3] = [
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
        tooltip: "Sampling offset of the blur passes.",
        kind: ParameterKind::Float(ValueRange::min(0.0)),
        inspector: true,
    },
];

impl ParameterSet for CustomBloomSettings {
    fn title(&self) -> &'static str {
        "CustomBloom"
    }

    fn descriptors(&self) -> Vec<ParameterDescriptor> {
        DESCRIPTORS.to_vec()
    }

    fn get(&self, name: &str) -> Option<ParameterValue> {
        match name {
            "intensity" => Some(ParameterValue::Float(self.intensity)),
            "threshold" => Some(ParameterValue::Float(self.threshold)),
            "bluriness" => Some(ParameterValue::Float(self.bluriness)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        let ParameterValue::Float(v) = descriptor.coerce(self.title(), value)? else {
            return Err(PostFxError::UnknownParameter {
                effect: self.title(),
                name: name.to_string(),
            });
        };
        match name {
            "intensity" => self.intensity = v,
            "threshold" => self.threshold = v,
            _ => self.bluriness = v,
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

#[derive(Debug, Clone, Copy)]
struct Targets {
    full: NameId,
    half: NameId,
}

pub struct CustomBloomEffect {
    settings: SharedSettings<CustomBloomSettings>,
    targets: Option<Targets>,
    sheet: PropertySheet,
}

impl CustomBloomEffect {
    pub fn new() -> Self {
        Self::with_settings(CustomBloomSettings::default())
    }

    pub fn with_settings(settings: CustomBloomSettings) -> Self {
        Self::with_shared(SharedSettings::new(settings))
    }

    pub fn with_shared(settings: SharedSettings<CustomBloomSettings>) -> Self {
        Self {
            settings,
            targets: None,
            sheet: PropertySheet::new(),
        }
    }

    pub fn settings(&self) -> &SharedSettings<CustomBloomSettings> {
        &self.settings
    }

    fn targets() -> Targets {
        Targets {
            full: NameId::from_name("_CustomBloomFull"),
            half: NameId::from_name("_CustomBloomHalf"),
        }
    }
}

impl Default for CustomBloomEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl PostProcessEffect for CustomBloomEffect {
    fn name(&self) -> &'static str {
        "CustomBloom"
    }

    fn stage(&self) -> EffectStage {
        EffectStage::Uber
    }

    fn init(&mut self) {
        self.targets = Some(Self::targets());
        info!("CustomBloom initialised");
    }

    fn is_enabled_and_supported(&self, _ctx: &RenderContext) -> bool {
        self.settings.read(|s| s.enabled && s.intensity > 0.0)
    }

    fn render(&mut self, ctx: &mut RenderContext) {
        let settings = self.settings.snapshot();
        let targets = *self.targets.get_or_insert_with(Self::targets);

        ctx.begin_sample("CustomBloom");

        self.sheet.clear();
        // Auto exposure is applied in the prefilter pass.
        self.sheet
            .set_texture(ids::AUTO_EXPOSURE_TEX, ctx.auto_exposure_texture);

        let tw = halve(ctx.screen_width);
        let th = halve(ctx.screen_height);

        let threshold = ThresholdParams::soft_knee(settings.threshold, 0.0);
        self.sheet.set_vector(ids::THRESHOLD, threshold.to_vector());
        let linear_clamp = gamma_to_linear_space(HALF_MAX);
        self.sheet
            .set_vector(ids::PARAMS, Vec4::new(linear_clamp, 0.0, 0.0, 0.0));
        self.sheet.set_float(ids::BLURINESS, settings.bluriness);

        let intensity = exp2_intensity(settings.intensity);

        let full = ctx.get_temporary(
            targets.full,
            TextureDesc::bilinear(ctx.screen_width, ctx.screen_height, ctx.source_format),
        );
        let half = ctx.get_temporary(
            targets.half,
            TextureDesc::bilinear(tw, th, ctx.source_format),
        );

        let source = ctx.source;
        ctx.blit(
            source,
            full.target(),
            &self.sheet,
            ShaderPass::CustomBloom(CustomBloomPass::Prefilter),
        );
        ctx.blit(
            full.target(),
            half.target(),
            &self.sheet,
            ShaderPass::CustomBloom(CustomBloomPass::Blur),
        );
        ctx.blit(
            half.target(),
            full.target(),
            &self.sheet,
            ShaderPass::CustomBloom(CustomBloomPass::Blur),
        );

        ctx.publish_bloom(
            full,
            ShaderKeyword::BloomCustom,
            Vec4::new(1.0, intensity, 0.0, 0.0),
        );
        ctx.release(half);

        ctx.end_sample("CustomBloom");
    }

    fn release(&mut self) {
        info!("CustomBloom released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bluriness_has_no_upper_bound() {
        let mut settings = CustomBloomSettings::default();
        settings
            .set("bluriness", ParameterValue::Float(12.0))
            .expect("bluriness is bindable");
        settings
            .set("threshold", ParameterValue::Float(-3.0))
            .expect("threshold is bindable");
        assert_eq!(settings.bluriness, 12.0);
        assert_eq!(settings.threshold, 0.0);
    }
}
