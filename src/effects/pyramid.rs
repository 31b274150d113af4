use log::warn;

use crate::config::MAX_PYRAMID_SIZE;
use crate::render::NameId;

/// Target ids of one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidLevel {
    pub down: NameId,
    pub up: NameId,
}

/// Level ids for the whole pyramid, built once and reused every frame.
#[derive(Debug, Clone)]
pub struct BloomPyramid {
    levels: [PyramidLevel; MAX_PYRAMID_SIZE],
}

impl BloomPyramid {
    pub fn new() -> Self {
        Self {
            levels: std::array::from_fn(|i| PyramidLevel {
                down: NameId::from_name(&format!("_BloomMipDown{i}")),
                up: NameId::from_name(&format!("_BloomMipUp{i}")),
            }),
        }
    }

    pub const fn capacity() -> usize {
        MAX_PYRAMID_SIZE
    }

    pub fn level(&self, index: usize) -> PyramidLevel {
        self.levels[index]
    }

    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    /// Clamps a requested level count into `1..=capacity`.
    pub fn clamp_iterations(requested: i32) -> usize {
        if requested > MAX_PYRAMID_SIZE as i32 {
            warn!(
                "bloom pyramid depth {requested} exceeds capacity {MAX_PYRAMID_SIZE}; clamping"
            );
        }
        requested.clamp(1, MAX_PYRAMID_SIZE as i32) as usize
    }
}

impl Default for BloomPyramid {
    fn default() -> Self {
        Self::new()
    }
}
