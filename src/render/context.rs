use std::ops::BitOr;

use glam::Vec4;
use log::warn;
use serde::{Deserialize, Serialize};

use super::{
    ids, CommandBuffer, NameId, PropertySheet, RenderTarget, ShaderKeyword, ShaderPass,
    TextureDesc, TextureFormat, TransientTarget, TransientTracker,
};
use crate::config::{DEFAULT_SHADER_LEVEL, DEFAULT_SOURCE_FORMAT};

/// Camera buffers an effect needs the renderer to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraFlags {
    pub depth: bool,
    pub depth_normals: bool,
    pub motion_vectors: bool,
}

impl CameraFlags {
    pub const NONE: Self = Self {
        depth: false,
        depth_normals: false,
        motion_vectors: false,
    };

    pub const DEPTH: Self = Self {
        depth: true,
        depth_normals: false,
        motion_vectors: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

impl BitOr for CameraFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            depth: self.depth || rhs.depth,
            depth_normals: self.depth_normals || rhs.depth_normals,
            motion_vectors: self.motion_vectors || rhs.motion_vectors,
        }
    }
}

/// Host-side description of the frame being post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSetup {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Dynamic-resolution factor applied to `width`/`height`.
    pub render_scale: f32,
    pub source_format: TextureFormat,
    pub allow_hdr: bool,
    pub temporal_antialiasing: bool,
    pub shader_level: u32,
}

impl Default for FrameSetup {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            render_scale: 1.0,
            source_format: DEFAULT_SOURCE_FORMAT,
            allow_hdr: true,
            temporal_antialiasing: false,
            shader_level: DEFAULT_SHADER_LEVEL,
        }
    }
}

impl FrameSetup {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen_width,
            screen_height,
            ..Self::default()
        }
    }

    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale.clamp(0.1, 2.0);
        self
    }

    pub fn with_hdr(mut self, allow_hdr: bool) -> Self {
        self.allow_hdr = allow_hdr;
        self.source_format = if allow_hdr {
            TextureFormat::Rgba16Float
        } else {
            TextureFormat::Rgba8
        };
        self
    }

    pub fn with_temporal_antialiasing(mut self, active: bool) -> Self {
        self.temporal_antialiasing = active;
        self
    }

    pub fn with_shader_level(mut self, level: u32) -> Self {
        self.shader_level = level;
        self
    }

    pub fn width(&self) -> u32 {
        ((self.screen_width as f32 * self.render_scale) as u32).max(1)
    }

    pub fn height(&self) -> u32 {
        ((self.screen_height as f32 * self.render_scale) as u32).max(1)
    }
}

/// Bloom output handed to the uber composition stage.
#[derive(Debug)]
pub struct PublishedBloom {
    pub target: TransientTarget,
    pub keyword: ShaderKeyword,
    pub settings: Vec4,
}

/// Per-frame state an effect records against.
pub struct RenderContext {
    pub command: CommandBuffer,
    pub source: RenderTarget,
    pub destination: RenderTarget,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Render-scale adjusted size.
    pub width: u32,
    pub height: u32,
    pub source_format: TextureFormat,
    pub allow_hdr: bool,
    pub auto_exposure_texture: RenderTarget,
    pub temporal_antialiasing: bool,
    pub shader_level: u32,
    uber_sheet: PropertySheet,
    tracker: TransientTracker,
    bloom: Option<PublishedBloom>,
    history_invalidated: bool,
}

impl RenderContext {
    pub fn new(frame: &FrameSetup) -> Self {
        Self {
            command: CommandBuffer::new("PostProcessing"),
            source: RenderTarget::CameraSource,
            destination: RenderTarget::CameraDestination,
            screen_width: frame.screen_width.max(1),
            screen_height: frame.screen_height.max(1),
            width: frame.width(),
            height: frame.height(),
            source_format: frame.source_format,
            allow_hdr: frame.allow_hdr,
            auto_exposure_texture: RenderTarget::AutoExposure,
            temporal_antialiasing: frame.temporal_antialiasing,
            shader_level: frame.shader_level,
            uber_sheet: PropertySheet::new(),
            tracker: TransientTracker::new(),
            bloom: None,
            history_invalidated: false,
        }
    }

    pub fn is_temporal_antialiasing_active(&self) -> bool {
        self.temporal_antialiasing
    }

    pub fn aspect(&self) -> f32 {
        self.screen_width as f32 / self.screen_height as f32
    }

    pub fn get_temporary(&mut self, id: NameId, desc: TextureDesc) -> TransientTarget {
        self.tracker.allocate(&mut self.command, id, desc)
    }

    pub fn release(&mut self, target: TransientTarget) {
        self.tracker.release(&mut self.command, target);
    }

    /// Releases by id; ids that were never allocated are ignored.
    pub fn release_id(&mut self, id: NameId) {
        self.tracker.release_id(&mut self.command, id);
    }

    pub fn blit(
        &mut self,
        source: RenderTarget,
        destination: RenderTarget,
        sheet: &PropertySheet,
        pass: ShaderPass,
    ) {
        self.command
            .blit_fullscreen_triangle(source, destination, sheet, pass);
    }

    /// Final composite with the uber sheet as it stands now.
    pub fn blit_uber(&mut self, source: RenderTarget, destination: RenderTarget) {
        self.command
            .blit_fullscreen_triangle(source, destination, &self.uber_sheet, ShaderPass::Uber);
    }

    pub fn set_global_texture(&mut self, name: NameId, target: RenderTarget) {
        self.command.set_global_texture(name, target);
    }

    pub fn begin_sample(&mut self, label: &'static str) {
        self.command.begin_sample(label);
    }

    pub fn end_sample(&mut self, label: &'static str) {
        self.command.end_sample(label);
    }

    pub fn uber_sheet(&self) -> &PropertySheet {
        &self.uber_sheet
    }

    pub fn uber_sheet_mut(&mut self) -> &mut PropertySheet {
        &mut self.uber_sheet
    }

    /// Hands a bloom buffer to the uber stage and binds it as `_BloomTex`.
    ///
    /// A buffer already published this frame is released; only one bloom
    /// code path is active in the composite. If the new output reused the
    /// earlier buffer's id, the earlier token is stale and the release is a no-op.
    pub fn publish_bloom(&mut self, target: TransientTarget, keyword: ShaderKeyword, settings: Vec4) {
        if let Some(previous) = self.bloom.take() {
            warn!(
                "{} replaces {} bloom output published earlier this frame",
                keyword.as_str(),
                previous.keyword.as_str()
            );
            self.uber_sheet.disable_keyword(previous.keyword);
            self.release(previous.target);
        }
        self.uber_sheet.enable_keyword(keyword);
        self.uber_sheet.set_vector(ids::BLOOM_SETTINGS, settings);
        self.command.set_global_texture(ids::BLOOM_TEX, target.target());
        self.bloom = Some(PublishedBloom {
            target,
            keyword,
            settings,
        });
    }

    pub fn published_bloom(&self) -> Option<&PublishedBloom> {
        self.bloom.as_ref()
    }

    pub fn take_published_bloom(&mut self) -> Option<PublishedBloom> {
        self.bloom.take()
    }

    /// Cross-frame temporal buffers must be treated as invalid this frame.
    pub fn invalidate_history(&mut self) {
        self.history_invalidated = true;
    }

    pub fn history_invalidated(&self) -> bool {
        self.history_invalidated
    }

    pub fn tracker(&self) -> &TransientTracker {
        &self.tracker
    }

    /// Splits the context into its recorded output.
    pub fn finish(self) -> (CommandBuffer, PropertySheet, bool) {
        (self.command, self.uber_sheet, self.history_invalidated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_scale_applies_to_width_only() {
        let frame = FrameSetup::new(1920, 1080).with_render_scale(0.5);
        let ctx = RenderContext::new(&frame);
        assert_eq!((ctx.screen_width, ctx.screen_height), (1920, 1080));
        assert_eq!((ctx.width, ctx.height), (960, 540));
    }

    #[test]
    fn camera_flags_union() {
        let flags = CameraFlags::NONE | CameraFlags::DEPTH;
        assert!(flags.depth);
        assert!(!flags.motion_vectors);
        assert!(CameraFlags::default().is_empty());
    }
}
