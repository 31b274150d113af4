use serde::{Deserialize, Serialize};

use super::NameId;

/// Anything a blit can read from or write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The frame's incoming color buffer.
    CameraSource,
    /// The frame's final output buffer.
    CameraDestination,
    /// Linear eye depth, only present when an effect requested it.
    CameraDepth,
    /// 1x1 exposure multiplier maintained by the host.
    AutoExposure,
    /// A frame-scoped buffer keyed by logical name.
    Temporary(NameId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    Rgba8,
    Rgba16Float,
    R8,
}

impl TextureFormat {
    pub fn is_hdr(self) -> bool {
        matches!(self, Self::Rgba16Float)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
}

/// Resolution, format and sampling of a transient buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub filter: FilterMode,
}

impl TextureDesc {
    /// Each axis is floored to one pixel.
    pub fn new(width: u32, height: u32, format: TextureFormat, filter: FilterMode) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            format,
            filter,
        }
    }

    pub fn bilinear(width: u32, height: u32, format: TextureFormat) -> Self {
        Self::new(width, height, format, FilterMode::Bilinear)
    }
}

/// Halves one axis of a mip chain, never going below one pixel.
pub fn halve(size: u32) -> u32 {
    (size / 2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halving_never_reaches_zero() {
        let (mut w, mut h) = (3_u32, 3_u32);
        for _ in 0..32 {
            w = halve(w);
            h = halve(h);
            assert!(w >= 1 && h >= 1);
        }
        assert_eq!((w, h), (1, 1));
    }

    #[test]
    fn desc_floors_to_one_pixel() {
        let desc = TextureDesc::bilinear(0, 0, TextureFormat::Rgba8);
        assert_eq!((desc.width, desc.height), (1, 1));
    }
}
