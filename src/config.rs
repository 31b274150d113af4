//! Global configuration constants for the post-processing stack.

use crate::render::TextureFormat;

/// Maximum depth of the bloom mip pyramid. Enough for 64k-wide frames.
pub const MAX_PYRAMID_SIZE: usize = 16;

/// Bias added to the soft-knee width of the pyramid bloom threshold.
pub const KNEE_EPSILON: f32 = 1e-5;

/// Smallest knee used when computing the `0.25 / knee` term.
pub const MIN_KNEE: f32 = 1e-5;

/// Largest finite value representable in a half-float render target.
pub const HALF_MAX: f32 = 65472.0;

/// Height of the 35mm full-frame film back in meters (36mm x 24mm).
pub const FILM_HEIGHT: f32 = 0.024;

/// Vertical resolution the film height is expressed against.
pub const REFERENCE_HEIGHT: f32 = 1080.0;

/// Upper bound on the physical-lens circle of confusion, as a fraction of frame height.
pub const MAX_COC_FRACTION: f32 = 0.05;

/// Minimum shader model required by the depth-of-field passes.
pub const DOF_MIN_SHADER_LEVEL: u32 = 35;

/// Shader level assumed when the host does not report one.
pub const DEFAULT_SHADER_LEVEL: u32 = 50;

/// Format used for camera targets when the host does not override it.
pub const DEFAULT_SOURCE_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
