//! JSON profiles describing which effects a stack holds and their settings.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::effects::{BloomSettings, CustomBloomSettings, DepthOfFieldSettings};
use crate::error::Result;
use crate::params::ParameterSet;

/// Absent entries leave the effect out of the stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackProfile {
    pub depth_of_field: Option<DepthOfFieldSettings>,
    pub bloom: Option<BloomSettings>,
    pub custom_bloom: Option<CustomBloomSettings>,
}

impl StackProfile {
    /// Parses and clamps every value to its declared range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut profile: Self = serde_json::from_str(json)?;
        profile.sanitize();
        Ok(profile)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let profile = Self::from_json_str(&text)?;
        info!(
            "loaded post-processing profile {} ({} effects)",
            path.display(),
            profile.effect_count()
        );
        Ok(profile)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn effect_count(&self) -> usize {
        usize::from(self.depth_of_field.is_some())
            + usize::from(self.bloom.is_some())
            + usize::from(self.custom_bloom.is_some())
    }

    pub fn sanitize(&mut self) {
        if let Some(settings) = &mut self.depth_of_field {
            settings.sanitize();
        }
        if let Some(settings) = &mut self.bloom {
            settings.sanitize();
        }
        if let Some(settings) = &mut self.custom_bloom {
            settings.sanitize();
        }
    }
}
