//! Reference software backend.
//!
//! Replays a recorded [`CommandBuffer`] on `f32` images so that effect output
//! can be inspected without a GPU. Speed is not a goal; every pass is a
//! straightforward per-pixel loop.

mod image;
pub mod kernels;

pub use image::Image;

use std::collections::HashMap;

use glam::Vec4;
use log::{debug, trace};

use self::kernels::FocusWeight;
use super::RenderBackend;
use crate::effects::{CocBand, KernelSize, LensParams};
use crate::error::{PostFxError, Result};
use crate::render::{
    ids, BloomPass, CommandBuffer, CustomBloomPass, DofPass, NameId, PropertySheet, RenderCommand,
    RenderTarget, ShaderKeyword, ShaderPass,
};

pub struct CpuBackend {
    source: Image,
    destination: Option<Image>,
    depth: Option<Image>,
    auto_exposure: Image,
    temporaries: HashMap<NameId, Image>,
    globals: HashMap<NameId, RenderTarget>,
    draws: usize,
}

impl CpuBackend {
    pub fn new(source: Image) -> Self {
        Self {
            source,
            destination: None,
            depth: None,
            auto_exposure: Image::filled(1, 1, Vec4::ONE),
            temporaries: HashMap::new(),
            globals: HashMap::new(),
            draws: 0,
        }
    }

    /// Linear eye depth per pixel, read from the first channel.
    pub fn with_depth(mut self, depth: Image) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Exposure multiplier, read from the center of the image.
    pub fn with_auto_exposure(mut self, exposure: Image) -> Self {
        self.auto_exposure = exposure;
        self
    }

    pub fn source(&self) -> &Image {
        &self.source
    }

    pub fn set_source(&mut self, source: Image) {
        self.source = source;
    }

    pub fn destination(&self) -> Option<&Image> {
        self.destination.as_ref()
    }

    pub fn take_destination(&mut self) -> Option<Image> {
        self.destination.take()
    }

    pub fn temporary(&self, id: NameId) -> Option<&Image> {
        self.temporaries.get(&id)
    }

    pub fn live_temporaries(&self) -> usize {
        self.temporaries.len()
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    fn image(&self, target: RenderTarget) -> Result<&Image> {
        match target {
            RenderTarget::CameraSource => Ok(&self.source),
            RenderTarget::CameraDestination => self
                .destination
                .as_ref()
                .ok_or(PostFxError::MissingTarget(target)),
            RenderTarget::CameraDepth => self.depth.as_ref().ok_or(PostFxError::MissingDepth),
            RenderTarget::AutoExposure => Ok(&self.auto_exposure),
            RenderTarget::Temporary(id) => self
                .temporaries
                .get(&id)
                .ok_or(PostFxError::MissingTarget(target)),
        }
    }

    /// Sheet bindings win over globals.
    fn texture(&self, sheet: &PropertySheet, name: NameId) -> Result<&Image> {
        let target = sheet
            .get_texture(name)
            .or_else(|| self.globals.get(&name).copied())
            .ok_or(PostFxError::UnboundTexture(name))?;
        self.image(target)
    }

    fn target_size(&self, target: RenderTarget) -> Result<(u32, u32)> {
        match target {
            RenderTarget::CameraDestination => Ok(self.source.size()),
            RenderTarget::Temporary(id) => self
                .temporaries
                .get(&id)
                .map(Image::size)
                .ok_or(PostFxError::MissingTarget(target)),
            other => Err(PostFxError::MissingTarget(other)),
        }
    }

    fn store(&mut self, target: RenderTarget, image: Image) -> Result<()> {
        match target {
            RenderTarget::CameraDestination => self.destination = Some(image),
            RenderTarget::Temporary(id) => {
                let slot = self
                    .temporaries
                    .get_mut(&id)
                    .ok_or(PostFxError::MissingTarget(target))?;
                *slot = image;
            }
            other => return Err(PostFxError::MissingTarget(other)),
        }
        Ok(())
    }

    fn blit(
        &mut self,
        source: RenderTarget,
        destination: RenderTarget,
        pass: ShaderPass,
        sheet: &PropertySheet,
    ) -> Result<()> {
        if source == destination {
            return Err(PostFxError::Feedback(source));
        }
        let size = self.target_size(destination)?;
        let src = self.image(source)?;

        let output = match pass {
            ShaderPass::Bloom(pass) => {
                let scale = sheet.get_float(ids::SAMPLE_SCALE).unwrap_or(1.0);
                match pass {
                    BloomPass::Prefilter => {
                        let threshold = sheet.get_vector(ids::THRESHOLD).unwrap_or(Vec4::ZERO);
                        kernels::bloom_prefilter(src, size, threshold, scale)
                    }
                    BloomPass::Downsample => kernels::bloom_downsample(src, size, scale),
                    BloomPass::Upsample => {
                        let finer = self.texture(sheet, ids::BLOOM_TEX)?;
                        kernels::bloom_upsample(src, finer, size, scale)
                    }
                }
            }
            ShaderPass::CustomBloom(CustomBloomPass::Prefilter) => {
                let exposure = self
                    .texture(sheet, ids::AUTO_EXPOSURE_TEX)?
                    .sample(glam::Vec2::splat(0.5))
                    .x;
                let linear_clamp = sheet
                    .get_vector(ids::PARAMS)
                    .map_or(f32::MAX, |params| params.x);
                let threshold = sheet.get_vector(ids::THRESHOLD).unwrap_or(Vec4::ZERO);
                kernels::custom_bloom_prefilter(src, size, exposure, linear_clamp, threshold)
            }
            ShaderPass::CustomBloom(CustomBloomPass::Blur) => {
                let bluriness = sheet.get_float(ids::BLURINESS).unwrap_or(1.0);
                kernels::custom_bloom_blur(src, size, bluriness)
            }
            ShaderPass::DepthOfField(pass) => match pass {
                DofPass::Downsample => kernels::dof_downsample(src, size),
                DofPass::Blur(kernel) => kernels::dof_blur(src, size, kernel),
                DofPass::Upsample => kernels::dof_upsample(src, size),
                DofPass::Composite => {
                    let blurred = self.texture(sheet, ids::DEPTH_OF_FIELD_TEX)?;
                    let depth = self.texture(sheet, ids::CAMERA_DEPTH_TEXTURE)?;
                    kernels::dof_composite(src, blurred, depth, size, focus_weight(sheet))
                }
            },
            ShaderPass::Uber => {
                let bloom_enabled = sheet.is_keyword_enabled(ShaderKeyword::BloomLow)
                    || sheet.is_keyword_enabled(ShaderKeyword::BloomCustom);
                let bloom = if bloom_enabled {
                    let intensity = sheet
                        .get_vector(ids::BLOOM_SETTINGS)
                        .map_or(0.0, |settings| settings.y);
                    Some((self.texture(sheet, ids::BLOOM_TEX)?, intensity))
                } else {
                    None
                };
                kernels::uber(src, bloom, size)
            }
        };

        self.store(destination, output)
    }
}

/// Band breakpoints when `_DofDepth` is bound, thin-lens uniforms otherwise.
fn focus_weight(sheet: &PropertySheet) -> FocusWeight {
    if let Some(band) = sheet.get_vector(ids::DOF_DEPTH) {
        return FocusWeight::Band(CocBand::from_vector(band));
    }
    let max_coc = sheet
        .get_float(ids::MAX_COC)
        .unwrap_or_else(|| LensParams::max_coc_radius(KernelSize::Medium, 1080));
    FocusWeight::Lens(LensParams {
        distance: sheet.get_float(ids::DISTANCE).unwrap_or(0.0),
        lens_coeff: sheet.get_float(ids::LENS_COEFF).unwrap_or(0.0),
        max_coc,
        rcp_max_coc: sheet.get_float(ids::RCP_MAX_COC).unwrap_or(1.0 / max_coc),
        rcp_aspect: sheet.get_float(ids::RCP_ASPECT).unwrap_or(1.0),
    })
}

impl RenderBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu-reference"
    }

    fn execute(&mut self, commands: &CommandBuffer) -> Result<()> {
        debug!(
            "[{}] replaying {} commands from {}",
            self.name(),
            commands.len(),
            commands.name()
        );
        for command in commands.commands() {
            match command {
                RenderCommand::GetTemporary { id, desc } => {
                    self.temporaries
                        .insert(*id, Image::new(desc.width, desc.height));
                }
                RenderCommand::ReleaseTemporary { id } => {
                    if self.temporaries.remove(id).is_none() {
                        trace!("release of {id} ignored: not allocated");
                    }
                }
                RenderCommand::Blit {
                    source,
                    destination,
                    pass,
                    properties,
                } => {
                    self.blit(*source, *destination, *pass, properties)?;
                    self.draws += 1;
                }
                RenderCommand::SetGlobalTexture { name, target } => {
                    self.globals.insert(*name, *target);
                }
                RenderCommand::BeginSample(label) => trace!("begin {label}"),
                RenderCommand::EndSample(label) => trace!("end {label}"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TextureDesc;
    use crate::render::TextureFormat;

    #[test]
    fn feedback_blit_is_rejected() {
        let mut backend = CpuBackend::new(Image::new(4, 4));
        let mut cmd = CommandBuffer::new("test");
        let id = NameId::from_name("_Temp");
        cmd.get_temporary_rt(id, TextureDesc::bilinear(2, 2, TextureFormat::Rgba16Float));
        cmd.blit_fullscreen_triangle(
            RenderTarget::Temporary(id),
            RenderTarget::Temporary(id),
            &PropertySheet::new(),
            ShaderPass::Bloom(BloomPass::Downsample),
        );
        let err = backend.execute(&cmd).unwrap_err();
        assert!(matches!(err, PostFxError::Feedback(_)));
    }

    #[test]
    fn missing_target_and_depth_are_errors() {
        let mut backend = CpuBackend::new(Image::new(4, 4));
        let mut cmd = CommandBuffer::new("test");
        cmd.blit_fullscreen_triangle(
            RenderTarget::CameraSource,
            RenderTarget::Temporary(NameId::from_name("_Nowhere")),
            &PropertySheet::new(),
            ShaderPass::Uber,
        );
        assert!(matches!(
            backend.execute(&cmd).unwrap_err(),
            PostFxError::MissingTarget(_)
        ));

        let mut sheet = PropertySheet::new();
        sheet.set_texture(ids::CAMERA_DEPTH_TEXTURE, RenderTarget::CameraDepth);
        sheet.set_texture(ids::DEPTH_OF_FIELD_TEX, RenderTarget::CameraSource);
        let mut cmd = CommandBuffer::new("test");
        cmd.blit_fullscreen_triangle(
            RenderTarget::CameraSource,
            RenderTarget::CameraDestination,
            &sheet,
            ShaderPass::DepthOfField(DofPass::Composite),
        );
        assert!(matches!(
            backend.execute(&cmd).unwrap_err(),
            PostFxError::MissingDepth
        ));
    }

    #[test]
    fn uber_without_bloom_copies_source() {
        let source = Image::filled(4, 4, Vec4::new(0.2, 0.4, 0.6, 1.0));
        let mut backend = CpuBackend::new(source.clone());
        let mut cmd = CommandBuffer::new("test");
        cmd.blit_fullscreen_triangle(
            RenderTarget::CameraSource,
            RenderTarget::CameraDestination,
            &PropertySheet::new(),
            ShaderPass::Uber,
        );
        backend.execute(&cmd).expect("replay succeeds");
        assert_eq!(backend.destination(), Some(&source));
        assert_eq!(backend.draws(), 1);
    }
}
