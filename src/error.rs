//! Error types for the post-processing stack.
//!
//! Recording a frame never fails; configuration loading, parameter binding
//! and command replay report through [`PostFxError`].

use thiserror::Error;

use crate::render::{NameId, RenderTarget};

/// Main error type for the crate.
#[derive(Debug, Error)]
pub enum PostFxError {
    /// Reading a profile from disk failed.
    #[error("Profile I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A profile document could not be parsed.
    #[error("Profile parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    /// The parameter name is not part of the effect's settings.
    #[error("Unknown parameter `{name}` on {effect}")]
    UnknownParameter { effect: &'static str, name: String },
    /// The value kind does not match the parameter's declared kind.
    #[error("Parameter `{name}` on {effect} expects {expected}")]
    TypeMismatch {
        effect: &'static str,
        name: String,
        expected: &'static str,
    },
    /// A recorded command referenced a target that does not exist at replay time.
    #[error("Render target not found: {0:?}")]
    MissingTarget(RenderTarget),
    /// A texture property was bound to a name with no backing image.
    #[error("Texture property {0} is not bound")]
    UnboundTexture(NameId),
    /// A blit read from and wrote to the same target.
    #[error("Blit source and destination are the same target: {0:?}")]
    Feedback(RenderTarget),
    /// The frame requested depth but the backend has none.
    #[error("Depth texture required but not provided")]
    MissingDepth,
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, PostFxError>;
