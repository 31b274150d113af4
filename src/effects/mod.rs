mod bloom;
mod custom_bloom;
mod depth_of_field;
mod pyramid;
mod threshold;

pub use bloom::{BloomEffect, BloomSettings};
pub use custom_bloom::{CustomBloomEffect, CustomBloomSettings};
pub use depth_of_field::{
    CocBand, DepthOfFieldEffect, DepthOfFieldSettings, DistanceBand, DofModel, KernelSize,
    LensParams, PhysicalLens,
};
pub use pyramid::{BloomPyramid, PyramidLevel};
pub use threshold::ThresholdParams;

use crate::render::{CameraFlags, RenderContext};

/// Where an effect's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectStage {
    /// Writes `ctx.destination`; the result becomes the next effect's source.
    Chain,
    /// Publishes a buffer and uniforms for the uber composite.
    Uber,
}

/// Per-effect hooks invoked by [`crate::stack::PostProcessStack`].
pub trait PostProcessEffect: Send {
    fn name(&self) -> &'static str;

    fn stage(&self) -> EffectStage {
        EffectStage::Uber
    }

    /// Called once when the effect joins a stack.
    fn init(&mut self) {}

    /// Checked once per frame before [`PostProcessEffect::render`]; `false` skips the effect.
    fn is_enabled_and_supported(&self, ctx: &RenderContext) -> bool;

    fn render(&mut self, ctx: &mut RenderContext);

    fn release(&mut self) {}

    fn camera_flags(&self) -> CameraFlags {
        CameraFlags::NONE
    }

    /// Marks temporal history invalid, e.g. after a camera cut.
    fn reset_history(&mut self) {}
}
