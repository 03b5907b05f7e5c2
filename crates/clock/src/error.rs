//! Error types for clock configuration

/// Error type for clock operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// Time scale was negative, NaN or infinite
    #[error("Invalid time scale: {0}")]
    InvalidTimeScale(f64),

    /// Maximum delta clamp was not a positive finite number
    #[error("Invalid max delta: {0}")]
    InvalidMaxDelta(f64),
}
