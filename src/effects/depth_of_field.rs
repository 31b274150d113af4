//! Depth of Field
//!
//! Blurs the frame at half and quarter resolution and blends it back over
//! the sharp source, weighted per pixel by scene depth. Two focus models are
//! available and exactly one is active per settings value:
//!
//! - [`DistanceBand`]: four depth breakpoints around the focus distance.
//! - [`PhysicalLens`]: thin-lens circle of confusion from aperture and focal length.

use glam::Vec4;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{EffectStage, PostProcessEffect};
use crate::config::{DOF_MIN_SHADER_LEVEL, FILM_HEIGHT, MAX_COC_FRACTION, REFERENCE_HEIGHT};
use crate::error::{PostFxError, Result};
use crate::params::{
    ParameterDescriptor, ParameterKind, ParameterSet, ParameterValue, SharedSettings, ValueRange,
};
use crate::render::{
    ids, CameraFlags, DofPass, PropertySheet, RenderContext, RenderTarget, ShaderPass,
    TextureDesc, TextureFormat,
};

/// Convolution kernel size of the blur, which bounds the maximum bokeh radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KernelSize {
    Small,
    #[default]
    Medium,
    Large,
    VeryLarge,
}

impl KernelSize {
    pub const NAMES: &'static [&'static str] = &["Small", "Medium", "Large", "Very Large"];

    pub fn index(self) -> usize {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
            Self::VeryLarge => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Small,
            1 => Self::Medium,
            2 => Self::Large,
            _ => Self::VeryLarge,
        }
    }

    /// Empirical bokeh radius of the kernel.
    pub fn radius_in_pixels(self) -> f32 {
        self.index() as f32 * 4.0 + 6.0
    }

    /// Gaussian sigma, in texels, of the reduced-resolution blur.
    pub fn sigma(self) -> f32 {
        self.index() as f32 + 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceBand {
    /// Depth range around the focus distance that stays sharp.
    pub focal_region: f32,
    pub near_transition: f32,
    pub far_transition: f32,
}

impl Default for DistanceBand {
    fn default() -> Self {
        Self {
            focal_region: 2.0,
            near_transition: 50.0,
            far_transition: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalLens {
    /// f-number; smaller values give a shallower depth of field.
    pub aperture: f32,
    /// Lens to film distance in millimeters.
    pub focal_length: f32,
    pub kernel_size: KernelSize,
}

impl Default for PhysicalLens {
    fn default() -> Self {
        Self {
            aperture: 5.6,
            focal_length: 50.0,
            kernel_size: KernelSize::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DofModel {
    DistanceBand(DistanceBand),
    PhysicalLens(PhysicalLens),
}

impl Default for DofModel {
    fn default() -> Self {
        Self::DistanceBand(DistanceBand::default())
    }
}

impl DofModel {
    pub const NAMES: &'static [&'static str] = &["Distance Band", "Physical Lens"];

    pub fn index(&self) -> usize {
        match self {
            Self::DistanceBand(_) => 0,
            Self::PhysicalLens(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthOfFieldSettings {
    pub enabled: bool,
    /// Distance to the point of focus.
    pub focus_distance: f32,
    pub model: DofModel,
}

impl Default for DepthOfFieldSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            focus_distance: 20.0,
            model: DofModel::default(),
        }
    }
}

/// Depth breakpoints `(near_start, near_end, far_start, far_end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CocBand {
    pub near_start: f32,
    pub near_end: f32,
    pub far_start: f32,
    pub far_end: f32,
}

impl CocBand {
    /// The focal region is centered on the focus distance:
    /// `near_end = focus - region/2`, `near_start = near_end - near_transition`,
    /// `far_start = focus + region/2`, `far_end = far_start + far_transition`.
    pub fn from_distance_band(focus_distance: f32, band: &DistanceBand) -> Self {
        let half_region = band.focal_region / 2.0;
        let near_end = focus_distance - half_region;
        let near_start = near_end - band.near_transition;
        let far_start = focus_distance + half_region;
        let far_end = far_start + band.far_transition;
        Self {
            near_start,
            near_end,
            far_start,
            far_end,
        }
    }

    pub fn from_vector(v: Vec4) -> Self {
        Self {
            near_start: v.x,
            near_end: v.y,
            far_start: v.z,
            far_end: v.w,
        }
    }

    pub fn to_vector(&self) -> Vec4 {
        Vec4::new(self.near_start, self.near_end, self.far_start, self.far_end)
    }

    pub fn is_ordered(&self) -> bool {
        self.near_start <= self.near_end
            && self.near_end <= self.far_start
            && self.far_start <= self.far_end
    }

    /// Raises each breakpoint to at least the previous one.
    pub fn ordered(self) -> Self {
        let near_end = self.near_end.max(self.near_start);
        let far_start = self.far_start.max(near_end);
        let far_end = self.far_end.max(far_start);
        Self {
            near_start: self.near_start,
            near_end,
            far_start,
            far_end,
        }
    }

    /// 1 is fully blurred, 0 is in focus.
    pub fn blur_weight(&self, depth: f32) -> f32 {
        if depth < self.near_end {
            1.0 - ramp(self.near_start, self.near_end, depth)
        } else if depth > self.far_start {
            ramp(self.far_start, self.far_end, depth)
        } else {
            0.0
        }
    }
}

fn ramp(start: f32, end: f32, value: f32) -> f32 {
    let span = end - start;
    if span <= f32::EPSILON {
        return if value >= end { 1.0 } else { 0.0 };
    }
    ((value - start) / span).clamp(0.0, 1.0)
}

/// Thin-lens uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensParams {
    /// Focus distance, never closer than the focal length.
    pub distance: f32,
    pub lens_coeff: f32,
    pub max_coc: f32,
    pub rcp_max_coc: f32,
    pub rcp_aspect: f32,
}

impl LensParams {
    /// `height` is the render-scaled height; the screen size sets the CoC cap and aspect.
    pub fn from_physical_lens(
        focus_distance: f32,
        lens: &PhysicalLens,
        screen_width: u32,
        screen_height: u32,
        height: u32,
    ) -> Self {
        let screen_height = screen_height.max(1);
        let scaled_film_height = FILM_HEIGHT * (height.max(1) as f32 / REFERENCE_HEIGHT);
        let f = lens.focal_length / 1000.0;
        let distance = focus_distance.max(f);
        let aspect = screen_width.max(1) as f32 / screen_height as f32;
        let lens_coeff = f * f
            / (lens.aperture.max(f32::EPSILON)
                * (distance - f).max(1e-4)
                * scaled_film_height
                * 2.0);
        let max_coc = Self::max_coc_radius(lens.kernel_size, screen_height);
        Self {
            distance,
            lens_coeff,
            max_coc,
            rcp_max_coc: 1.0 / max_coc,
            rcp_aspect: 1.0 / aspect,
        }
    }

    /// Kernel radius as a fraction of height, capped at 5%.
    pub fn max_coc_radius(kernel_size: KernelSize, screen_height: u32) -> f32 {
        (kernel_size.radius_in_pixels() / screen_height.max(1) as f32).min(MAX_COC_FRACTION)
    }

    pub fn circle_of_confusion(&self, depth: f32) -> f32 {
        (depth - self.distance) * self.lens_coeff / depth.max(1e-5)
    }

    pub fn blur_weight(&self, depth: f32) -> f32 {
        (self.circle_of_confusion(depth).abs() * self.rcp_max_coc).clamp(0.0, 1.0)
    }
}

const FOCUS_DISTANCE: ParameterDescriptor = ParameterDescriptor {
    name: "focus_distance",
    display_name: "Focus Distance",
    tooltip: "Distance to the point of focus.",
    kind: ParameterKind::Float(ValueRange::min(0.1)),
    inspector: true,
};

const MODEL: ParameterDescriptor = ParameterDescriptor {
    name: "model",
    display_name: "Focus Model",
    tooltip: "Depth band breakpoints or a physical thin-lens model.",
    kind: ParameterKind::Choice(DofModel::NAMES),
    inspector: true,
};

const BAND_DESCRIPTORS: [ParameterDescriptor; 3] = [
    ParameterDescriptor {
        name: "focal_region",
        display_name: "Focal Region",
        tooltip: "The region of image in focus",
        kind: ParameterKind::Float(ValueRange::between(0.05, 1000.0)),
        inspector: true,
    },
    ParameterDescriptor {
        name: "near_transition",
        display_name: "Near Transition",
        tooltip: "The distance from the focal region on the side nearer to the camera over which the scene transitions from focused to blurred",
        kind: ParameterKind::Float(ValueRange::between(0.05, 1000.0)),
        inspector: true,
    },
    ParameterDescriptor {
        name: "far_transition",
        display_name: "Far Transition",
        tooltip: "The distance from the focal region on the side further to the camera over which the scene transitions from focused to blurred",
        kind: ParameterKind::Float(ValueRange::between(0.05, 1000.0)),
        inspector: true,
    },
];

const LENS_DESCRIPTORS: [ParameterDescriptor; 3] = [
    ParameterDescriptor {
        name: "aperture",
        display_name: "Aperture",
        tooltip: "Ratio of aperture (known as f-stop or f-number). The smaller the value is, the shallower the depth of field is.",
        kind: ParameterKind::Float(ValueRange::between(0.05, 32.0)),
        inspector: true,
    },
    ParameterDescriptor {
        name: "focal_length",
        display_name: "Focal Length",
        tooltip: "Distance between the lens and the film. The larger the value is, the shallower the depth of field is.",
        kind: ParameterKind::Float(ValueRange::between(1.0, 300.0)),
        inspector: true,
    },
    ParameterDescriptor {
        name: "kernel_size",
        display_name: "Max Blur Size",
        tooltip: "Convolution kernel size of the bokeh filter, which determines the maximum radius of bokeh. It also affects performances (the larger the kernel is, the longer the GPU time is required).",
        kind: ParameterKind::Choice(KernelSize::NAMES),
        inspector: true,
    },
];

impl ParameterSet for DepthOfFieldSettings {
    fn title(&self) -> &'static str {
        "Depth of Field"
    }

    fn descriptors(&self) -> Vec<ParameterDescriptor> {
        let mut descriptors = vec![FOCUS_DISTANCE, MODEL];
        match self.model {
            DofModel::DistanceBand(_) => descriptors.extend_from_slice(&BAND_DESCRIPTORS),
            DofModel::PhysicalLens(_) => descriptors.extend_from_slice(&LENS_DESCRIPTORS),
        }
        descriptors
    }

    fn get(&self, name: &str) -> Option<ParameterValue> {
        match (name, &self.model) {
            ("focus_distance", _) => Some(ParameterValue::Float(self.focus_distance)),
            ("model", model) => Some(ParameterValue::Choice(model.index())),
            ("focal_region", DofModel::DistanceBand(b)) => Some(ParameterValue::Float(b.focal_region)),
            ("near_transition", DofModel::DistanceBand(b)) => {
                Some(ParameterValue::Float(b.near_transition))
            }
            ("far_transition", DofModel::DistanceBand(b)) => {
                Some(ParameterValue::Float(b.far_transition))
            }
            ("aperture", DofModel::PhysicalLens(l)) => Some(ParameterValue::Float(l.aperture)),
            ("focal_length", DofModel::PhysicalLens(l)) => Some(ParameterValue::Float(l.focal_length)),
            ("kernel_size", DofModel::PhysicalLens(l)) => {
                Some(ParameterValue::Choice(l.kernel_size.index()))
            }
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let title = self.title();
        let value = self.descriptor(name)?.coerce(title, value)?;
        match (name, value, &mut self.model) {
            ("focus_distance", ParameterValue::Float(v), _) => self.focus_distance = v,
            ("model", ParameterValue::Choice(index), model) => {
                // Switching models starts from that model's defaults.
                if index != model.index() {
                    *model = match index {
                        0 => DofModel::DistanceBand(DistanceBand::default()),
                        _ => DofModel::PhysicalLens(PhysicalLens::default()),
                    };
                }
            }
            ("focal_region", ParameterValue::Float(v), DofModel::DistanceBand(b)) => {
                b.focal_region = v
            }
            ("near_transition", ParameterValue::Float(v), DofModel::DistanceBand(b)) => {
                b.near_transition = v
            }
            ("far_transition", ParameterValue::Float(v), DofModel::DistanceBand(b)) => {
                b.far_transition = v
            }
            ("aperture", ParameterValue::Float(v), DofModel::PhysicalLens(l)) => l.aperture = v,
            ("focal_length", ParameterValue::Float(v), DofModel::PhysicalLens(l)) => {
                l.focal_length = v
            }
            ("kernel_size", ParameterValue::Choice(index), DofModel::PhysicalLens(l)) => {
                l.kernel_size = KernelSize::from_index(index)
            }
            _ => {
                return Err(PostFxError::UnknownParameter {
                    effect: title,
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

    fn required_shader_level(&self) -> u32 {
        DOF_MIN_SHADER_LEVEL
    }

    fn unsupported_message(&self) -> &'static str {
        "Depth Of Field is only supported on the following platforms:\nDX11+, OpenGL 3.2+, OpenGL ES 3+, Metal, Vulkan, PS4/XB1 consoles."
    }
}

pub struct DepthOfFieldEffect {
    settings: SharedSettings<DepthOfFieldSettings>,
    sheet: PropertySheet,
    reset_history: bool,
}

impl DepthOfFieldEffect {
    pub fn new() -> Self {
        Self::with_settings(DepthOfFieldSettings::default())
    }

    pub fn with_settings(settings: DepthOfFieldSettings) -> Self {
        Self::with_shared(SharedSettings::new(settings))
    }

    pub fn with_shared(settings: SharedSettings<DepthOfFieldSettings>) -> Self {
        Self {
            settings,
            sheet: PropertySheet::new(),
            reset_history: true,
        }
    }

    pub fn settings(&self) -> &SharedSettings<DepthOfFieldSettings> {
        &self.settings
    }

    pub fn history_reset_pending(&self) -> bool {
        self.reset_history
    }

    /// Uploads the active model's uniforms and returns the blur kernel to use.
    fn configure_sheet(&mut self, settings: &DepthOfFieldSettings, ctx: &RenderContext) -> KernelSize {
        self.sheet.clear();
        self.sheet
            .set_texture(ids::CAMERA_DEPTH_TEXTURE, RenderTarget::CameraDepth);

        match &settings.model {
            DofModel::DistanceBand(band) => {
                let raw = CocBand::from_distance_band(settings.focus_distance, band);
                let coc = raw.ordered();
                if coc != raw {
                    debug!("depth of field band {raw:?} out of order; using {coc:?}");
                }
                self.sheet.set_vector(ids::DOF_DEPTH, coc.to_vector());
                KernelSize::Medium
            }
            DofModel::PhysicalLens(lens) => {
                let params = LensParams::from_physical_lens(
                    settings.focus_distance,
                    lens,
                    ctx.screen_width,
                    ctx.screen_height,
                    ctx.height,
                );
                self.sheet.set_float(ids::DISTANCE, params.distance);
                self.sheet.set_float(ids::LENS_COEFF, params.lens_coeff);
                self.sheet.set_float(ids::MAX_COC, params.max_coc);
                self.sheet.set_float(ids::RCP_MAX_COC, params.rcp_max_coc);
                self.sheet.set_float(ids::RCP_ASPECT, params.rcp_aspect);
                lens.kernel_size
            }
        }
    }
}

impl Default for DepthOfFieldEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl PostProcessEffect for DepthOfFieldEffect {
    fn name(&self) -> &'static str {
        "DepthOfField"
    }

    fn stage(&self) -> EffectStage {
        EffectStage::Chain
    }

    fn is_enabled_and_supported(&self, ctx: &RenderContext) -> bool {
        self.settings.read(|s| s.enabled) && ctx.shader_level >= DOF_MIN_SHADER_LEVEL
    }

    fn camera_flags(&self) -> CameraFlags {
        CameraFlags::DEPTH
    }

    fn render(&mut self, ctx: &mut RenderContext) {
        let settings = self.settings.snapshot();

        // Four channels so the blend has room for alpha; 8-bit gives a weak near blur.
        let color_format = if ctx.allow_hdr {
            TextureFormat::Rgba16Float
        } else {
            TextureFormat::Rgba8
        };
        let kernel = self.configure_sheet(&settings, ctx);
        let (source, destination) = (ctx.source, ctx.destination);

        ctx.begin_sample("DepthOfField");

        ctx.begin_sample("Downsample1");
        let half = ctx.get_temporary(
            ids::DEPTH_OF_FIELD_TEX,
            TextureDesc::bilinear(ctx.width / 2, ctx.height / 2, color_format),
        );
        ctx.blit(
            source,
            half.target(),
            &self.sheet,
            ShaderPass::DepthOfField(DofPass::Downsample),
        );
        ctx.end_sample("Downsample1");

        ctx.begin_sample("Downsample2");
        let quarter = ctx.get_temporary(
            ids::DEPTH_OF_FIELD_TEMP,
            TextureDesc::bilinear(ctx.width / 4, ctx.height / 4, color_format),
        );
        ctx.blit(
            half.target(),
            quarter.target(),
            &self.sheet,
            ShaderPass::DepthOfField(DofPass::Blur(kernel)),
        );
        ctx.end_sample("Downsample2");

        ctx.begin_sample("Upsample");
        ctx.blit(
            quarter.target(),
            half.target(),
            &self.sheet,
            ShaderPass::DepthOfField(DofPass::Upsample),
        );
        ctx.end_sample("Upsample");

        ctx.release(quarter);

        ctx.begin_sample("Combine");
        self.sheet.set_texture(ids::DEPTH_OF_FIELD_TEX, half.target());
        ctx.blit(
            source,
            destination,
            &self.sheet,
            ShaderPass::DepthOfField(DofPass::Composite),
        );
        ctx.end_sample("Combine");
        ctx.release(half);

        // Kept alive for temporal anti-aliasing; otherwise nothing owns it.
        if !ctx.is_temporal_antialiasing_active() {
            ctx.release_id(ids::COC_TEX);
        }

        ctx.end_sample("DepthOfField");

        if self.reset_history {
            ctx.invalidate_history();
        }
        self.reset_history = false;
    }

    fn release(&mut self) {
        self.reset_history();
        info!("DepthOfField released");
    }

    fn reset_history(&mut self) {
        self.reset_history = true;
    }
}
