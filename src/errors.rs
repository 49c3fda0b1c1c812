//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! Configuration mistakes (inverted frame ranges, unknown target properties,
//! malformed scene JSON) surface here at construction or parse time. The
//! per-frame animation hot path never returns errors: a stale target or a
//! mismatched value kind degrades to a skipped write logged at debug level.

use thiserror::Error;

/// The main error type for the Orrery engine.
#[derive(Error, Debug)]
pub enum OrreryError {
    /// An animatable was configured with `from > to`.
    #[error("Invalid frame range: from {from} > to {to}")]
    InvalidFrameRange {
        /// Requested start frame
        from: f32,
        /// Requested end frame
        to: f32,
    },

    /// A track's target property path could not be resolved on its target.
    #[error("Unknown target property \"{property}\" on target \"{target}\"")]
    UnknownTargetProperty {
        /// The property path that failed to resolve
        property: String,
        /// Name of the target object
        target: String,
    },

    /// An animation was started with no tracks to play.
    #[error("No animations to start on target \"{0}\"")]
    EmptyAnimationList(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A scene or animation document had the wrong shape.
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Alias for `Result<T, OrreryError>`.
pub type Result<T> = std::result::Result<T, OrreryError>;
