//! Utility helpers including color-space math, logging, and profiling.

pub mod color;
pub mod logging;
pub mod profiling;

pub use color::*;
