//! Recording surface exposed by the host renderer.

mod command;
mod context;
pub mod ids;
mod pass;
mod property_sheet;
mod resources;
mod target;

pub use command::{CommandBuffer, CommandStats, RenderCommand};
pub use context::{CameraFlags, FrameSetup, PublishedBloom, RenderContext};
pub use ids::NameId;
pub use pass::{BloomPass, CustomBloomPass, DofPass, ShaderPass};
pub use property_sheet::{PropertySheet, PropertyValue, ShaderKeyword};
pub use resources::{TransientTarget, TransientTracker};
pub use target::{halve, FilterMode, RenderTarget, TextureDesc, TextureFormat};
