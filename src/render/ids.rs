//! Logical identifiers for shader properties and transient targets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier hashed from a property or target name (FNV-1a).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameId(u32);

impl NameId {
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u32 = 0x811c_9dc5;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(0x0100_0193);
            i += 1;
        }
        Self(hash)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameId({:#010x})", self.0)
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

impl From<&str> for NameId {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

pub const THRESHOLD: NameId = NameId::from_name("_Threshold");
pub const SAMPLE_SCALE: NameId = NameId::from_name("_SampleScale");
pub const PARAMS: NameId = NameId::from_name("_Params");
pub const BLURINESS: NameId = NameId::from_name("_Bluriness");
pub const AUTO_EXPOSURE_TEX: NameId = NameId::from_name("_AutoExposureTex");
pub const BLOOM_TEX: NameId = NameId::from_name("_BloomTex");
pub const BLOOM_SETTINGS: NameId = NameId::from_name("_Bloom_Settings");

pub const DOF_DEPTH: NameId = NameId::from_name("_DofDepth");
pub const DISTANCE: NameId = NameId::from_name("_Distance");
pub const LENS_COEFF: NameId = NameId::from_name("_LensCoeff");
pub const MAX_COC: NameId = NameId::from_name("_MaxCoC");
pub const RCP_MAX_COC: NameId = NameId::from_name("_RcpMaxCoC");
pub const RCP_ASPECT: NameId = NameId::from_name("_RcpAspect");
pub const DEPTH_OF_FIELD_TEX: NameId = NameId::from_name("_DepthOfFieldTex");
pub const DEPTH_OF_FIELD_TEMP: NameId = NameId::from_name("_DepthOfFieldTemp");
pub const COC_TEX: NameId = NameId::from_name("_CoCTex");
pub const CAMERA_DEPTH_TEXTURE: NameId = NameId::from_name("_CameraDepthTexture");
