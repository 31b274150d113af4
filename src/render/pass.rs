use crate::effects::KernelSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BloomPass {
    Prefilter,
    Downsample,
    Upsample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomBloomPass {
    Prefilter,
    Blur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DofPass {
    Downsample,
    Upsample,
    /// Two-dimensional gaussian whose radius follows the kernel size.
    Blur(KernelSize),
    Composite,
}

/// Shader program and pass index of a full-screen draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderPass {
    Bloom(BloomPass),
    CustomBloom(CustomBloomPass),
    DepthOfField(DofPass),
    Uber,
}
