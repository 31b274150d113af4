//! Parameter binding between effect settings and an external editor.

mod descriptor;
mod shared;

pub use descriptor::{
    ParameterDescriptor, ParameterKind, ParameterSet, ParameterValue, ValueRange,
};
pub use shared::SharedSettings;
