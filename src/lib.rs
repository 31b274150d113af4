//! postfx – camera post-processing for real-time renderers.
//!
//! Effects record their work (transient buffer allocation, full-screen
//! draws, releases) into a [`CommandBuffer`] that a renderer replays later.
//! Bloom comes in two flavours, a mip-pyramid and a fixed two-pass variant;
//! depth of field supports a distance band and a thin-lens model. A
//! reference [`CpuBackend`] executes recorded frames on `f32` images.

pub mod backend;
pub mod config;
pub mod effects;
pub mod error;
pub mod inspector;
pub mod params;
pub mod profile;
pub mod render;
pub mod stack;
pub mod utils;

pub use glam::{Vec2, Vec4};

pub use backend::{CpuBackend, Image, NoopBackend, RenderBackend};
pub use effects::{
    BloomEffect, BloomSettings, CustomBloomEffect, CustomBloomSettings, DepthOfFieldEffect,
    DepthOfFieldSettings, DistanceBand, DofModel, EffectStage, KernelSize, PhysicalLens,
    PostProcessEffect,
};
pub use error::{PostFxError, Result};
pub use inspector::{InspectorField, InspectorPanel};
pub use params::{ParameterSet, ParameterValue, SharedSettings};
pub use profile::StackProfile;
pub use render::{CameraFlags, CommandBuffer, FrameSetup, RenderContext, RenderTarget};
pub use stack::{FrameRecording, PostProcessStack};
