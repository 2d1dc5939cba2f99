//! Error types for the Trellis engine.

use thiserror::Error;

/// Main error type for Trellis operations.
///
/// Composition errors are definition-time defects in the command or option
/// schemas and carry the full diagnostic message. Host errors are failures
/// raised by caller-supplied callbacks (handlers, transforms, hooks) and are
/// passed through unchanged.
#[derive(Error, Debug)]
pub enum TrellisError {
    /// A command or option schema violates a composition rule
    #[error("{0}")]
    Composition(String),

    /// A caller-supplied callback returned an error
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl TrellisError {
    /// Builds a composition error for a malformed option definition.
    pub(crate) fn option(name: &str, reason: impl AsRef<str>) -> Self {
        TrellisError::Composition(format!(
            "Can't define option '{}': {}!",
            name,
            reason.as_ref()
        ))
    }

    /// Builds a composition error for a malformed command definition.
    pub(crate) fn command(name: &str, reason: impl AsRef<str>) -> Self {
        TrellisError::Composition(format!(
            "Can't define command '{}': {}!",
            name,
            reason.as_ref()
        ))
    }
}

/// Result type alias for Trellis operations
pub type Result<T> = std::result::Result<T, TrellisError>;
