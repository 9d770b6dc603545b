//! Timeline error types

use thiserror::Error;

/// Errors raised while building or driving a timeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// An entity with this id is already registered
    #[error("Entity already registered: {0}")]
    DuplicateId(String),

    /// No entity with this id is registered
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Phase list is empty, has gaps or overlaps, or does not cover [0, 1]
    #[error("Invalid phase schedule: {0}")]
    InvalidSchedule(String),

    /// The schedule produced a phase the interpolation policy has no rule for
    #[error("Unknown phase: {0}")]
    UnknownPhase(String),

    /// Speed multiplier must be finite and greater than zero
    #[error("Invalid speed multiplier: {0}")]
    InvalidSpeed(f32),

    /// Total duration must be finite and greater than zero
    #[error("Invalid timeline duration: {0}s")]
    InvalidDuration(f32),

    /// Entity definition needs a capability its kind does not have
    #[error("Entity {id} is not {capability}")]
    MissingCapability {
        id: String,
        capability: &'static str,
    },
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;
