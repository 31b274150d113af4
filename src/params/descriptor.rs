use serde::{Deserialize, Serialize};

use crate::error::{PostFxError, Result};

/// Inclusive bounds of a float parameter. `None` is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl ValueRange {
    pub const fn min(min: f32) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub const fn between(min: f32, max: f32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        let mut value = if value.is_nan() {
            self.min.unwrap_or(0.0)
        } else {
            value
        };
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterKind {
    Float(ValueRange),
    Int { min: i32, max: i32 },
    Choice(&'static [&'static str]),
}

/// Everything an inspector needs to draw one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub tooltip: &'static str,
    pub kind: ParameterKind,
    /// Shown in the inspector panel. Hidden parameters stay bindable.
    pub inspector: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f32),
    Int(i32),
    Choice(usize),
}

impl ParameterDescriptor {
    /// Clamps `value` to this parameter's range, rejecting the wrong kind.
    pub fn coerce(&self, effect: &'static str, value: ParameterValue) -> Result<ParameterValue> {
        match (self.kind, value) {
            (ParameterKind::Float(range), ParameterValue::Float(v)) => {
                Ok(ParameterValue::Float(range.clamp(v)))
            }
            (ParameterKind::Float(range), ParameterValue::Int(v)) => {
                Ok(ParameterValue::Float(range.clamp(v as f32)))
            }
            (ParameterKind::Int { min, max }, ParameterValue::Int(v)) => {
                Ok(ParameterValue::Int(v.clamp(min, max)))
            }
            (ParameterKind::Choice(options), ParameterValue::Choice(index)) => {
                Ok(ParameterValue::Choice(index.min(options.len().saturating_sub(1))))
            }
            (kind, _) => Err(PostFxError::TypeMismatch {
                effect,
                name: self.name.to_string(),
                expected: match kind {
                    ParameterKind::Float(_) => "a float",
                    ParameterKind::Int { .. } => "an integer",
                    ParameterKind::Choice(_) => "a choice index",
                },
            }),
        }
    }
}

/// Plain get/set access to an effect's tunable values.
pub trait ParameterSet {
    /// Effect name used for inspector headers and errors.
    fn title(&self) -> &'static str;

    fn descriptors(&self) -> Vec<ParameterDescriptor>;

    fn get(&self, name: &str) -> Option<ParameterValue>;

    /// Writes a value after clamping it to the declared range.
    fn set(&mut self, name: &str, value: ParameterValue) -> Result<()>;

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Lowest device shader level the effect runs on.
    fn required_shader_level(&self) -> u32 {
        0
    }

    /// Inspector warning shown below [`ParameterSet::required_shader_level`].
    fn unsupported_message(&self) -> &'static str {
        "This effect is not supported on the current platform."
    }

    fn descriptor(&self, name: &str) -> Result<ParameterDescriptor> {
        self.descriptors()
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| PostFxError::UnknownParameter {
                effect: self.title(),
                name: name.to_string(),
            })
    }

    /// Re-applies every declared range to the current values.
    fn sanitize(&mut self) {
        for descriptor in self.descriptors() {
            if let Some(value) = self.get(descriptor.name) {
                // Values read back from the set always have the declared kind.
                let _ = self.set(descriptor.name, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTENSITY: ParameterDescriptor = ParameterDescriptor {
        name: "intensity",
        display_name: "Intensity",
        tooltip: "",
        kind: ParameterKind::Float(ValueRange::min(0.0)),
        inspector: true,
    };

    #[test]
    fn float_range_clamps_and_rejects_nan() {
        let range = ValueRange::between(0.05, 32.0);
        assert_eq!(range.clamp(-1.0), 0.05);
        assert_eq!(range.clamp(64.0), 32.0);
        assert_eq!(range.clamp(f32::NAN), 0.05);
        assert_eq!(ValueRange::min(0.0).clamp(1e9), 1e9);
    }

    #[test]
    fn coerce_rejects_wrong_kind() {
        assert_eq!(
            INTENSITY.coerce("Bloom", ParameterValue::Float(-2.0)).unwrap(),
            ParameterValue::Float(0.0)
        );
        let err = INTENSITY
            .coerce("Bloom", ParameterValue::Choice(1))
            .unwrap_err();
        assert!(matches!(err, PostFxError::TypeMismatch { .. }));
    }
}
