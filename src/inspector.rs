//! Editor-facing panels built from an effect's parameter descriptors.

use crate::params::{ParameterDescriptor, ParameterKind, ParameterSet, ParameterValue};

#[derive(Debug, Clone, PartialEq)]
pub struct InspectorField {
    pub name: &'static str,
    pub label: &'static str,
    pub tooltip: &'static str,
    pub kind: ParameterKind,
    pub value: ParameterValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectorPanel {
    pub title: &'static str,
    pub enabled: bool,
    /// Shown above the fields when the device cannot run the effect.
    pub warning: Option<&'static str>,
    pub fields: Vec<InspectorField>,
}

impl InspectorPanel {
    pub fn build(settings: &dyn ParameterSet, shader_level: u32) -> Self {
        let warning = (shader_level < settings.required_shader_level())
            .then(|| settings.unsupported_message());

        let fields = settings
            .descriptors()
            .into_iter()
            .filter(|d| d.inspector)
            .filter_map(|d| field(settings, d))
            .collect();

        Self {
            title: settings.title(),
            enabled: settings.enabled(),
            warning,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&InspectorField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn field(settings: &dyn ParameterSet, descriptor: ParameterDescriptor) -> Option<InspectorField> {
    let value = settings.get(descriptor.name)?;
    Some(InspectorField {
        name: descriptor.name,
        label: descriptor.display_name,
        tooltip: descriptor.tooltip,
        kind: descriptor.kind,
        value,
    })
}
