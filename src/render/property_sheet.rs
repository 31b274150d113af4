use std::collections::{BTreeSet, HashMap};

use glam::Vec4;

use super::{NameId, RenderTarget};

/// Feature switches on the uber composition shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderKeyword {
    BloomLow,
    BloomCustom,
}

impl ShaderKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BloomLow => "BLOOM_LOW",
            Self::BloomCustom => "BLOOM_CUSTOM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Float(f32),
    Vector(Vec4),
    Texture(RenderTarget),
}

/// Name-keyed uniform bag bound to a draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySheet {
    values: HashMap<NameId, PropertyValue>,
    keywords: BTreeSet<ShaderKeyword>,
}

impl PropertySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every property; keywords are left as they are.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn set_float(&mut self, name: NameId, value: f32) {
        self.values.insert(name, PropertyValue::Float(value));
    }

    pub fn set_vector(&mut self, name: NameId, value: Vec4) {
        self.values.insert(name, PropertyValue::Vector(value));
    }

    pub fn set_texture(&mut self, name: NameId, target: RenderTarget) {
        self.values.insert(name, PropertyValue::Texture(target));
    }

    pub fn get(&self, name: NameId) -> Option<PropertyValue> {
        self.values.get(&name).copied()
    }

    pub fn get_float(&self, name: NameId) -> Option<f32> {
        match self.values.get(&name) {
            Some(PropertyValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_vector(&self, name: NameId) -> Option<Vec4> {
        match self.values.get(&name) {
            Some(PropertyValue::Vector(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_texture(&self, name: NameId) -> Option<RenderTarget> {
        match self.values.get(&name) {
            Some(PropertyValue::Texture(target)) => Some(*target),
            _ => None,
        }
    }

    pub fn contains(&self, name: NameId) -> bool {
        self.values.contains_key(&name)
    }

    pub fn enable_keyword(&mut self, keyword: ShaderKeyword) {
        self.keywords.insert(keyword);
    }

    pub fn disable_keyword(&mut self, keyword: ShaderKeyword) {
        self.keywords.remove(&keyword);
    }

    pub fn is_keyword_enabled(&self, keyword: ShaderKeyword) -> bool {
        self.keywords.contains(&keyword)
    }

    pub fn keywords(&self) -> impl Iterator<Item = ShaderKeyword> + '_ {
        self.keywords.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ids;

    #[test]
    fn typed_getters_reject_other_kinds() {
        let mut sheet = PropertySheet::new();
        sheet.set_float(ids::SAMPLE_SCALE, 2.0);
        sheet.set_vector(ids::THRESHOLD, Vec4::ONE);

        assert_eq!(sheet.get_float(ids::SAMPLE_SCALE), Some(2.0));
        assert_eq!(sheet.get_vector(ids::SAMPLE_SCALE), None);
        assert_eq!(sheet.get_vector(ids::THRESHOLD), Some(Vec4::ONE));
    }

    #[test]
    fn clear_keeps_keywords() {
        let mut sheet = PropertySheet::new();
        sheet.set_float(ids::SAMPLE_SCALE, 2.0);
        sheet.enable_keyword(ShaderKeyword::BloomLow);
        sheet.clear();

        assert!(sheet.is_empty());
        assert!(sheet.is_keyword_enabled(ShaderKeyword::BloomLow));
        assert_eq!(ShaderKeyword::BloomLow.as_str(), "BLOOM_LOW");
    }
}
