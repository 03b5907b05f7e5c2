//! Error types for scheduling operations

use std::collections::TryReserveError;

/// Errors surfaced to the caller of `Scheduler::schedule`
///
/// Stale handles and destroyed owners are not errors; they show up as
/// `false` / `None` from the query APIs.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Duration was negative or NaN
    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),

    /// Pool cannot grow past its slot limit
    #[error("Task slot limit reached ({limit} slots)")]
    SlotLimitReached {
        /// Maximum number of slots the pool may hold
        limit: u32,
    },

    /// Backing storage could not grow
    #[error("Failed to allocate task slot: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Result type for scheduling operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Validate a task duration
pub(crate) fn check_duration(duration: f64) -> ScheduleResult<f64> {
    if duration.is_nan() || duration < 0.0 {
        return Err(ScheduleError::InvalidDuration(duration));
    }
    Ok(duration)
}
