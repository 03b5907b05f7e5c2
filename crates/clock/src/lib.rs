//! cadence clock - per-frame time deltas
//!
//! This crate supplies the two deltas the scheduler consumes every tick:
//! - a *scaled* delta, affected by the global time scale and pause state
//! - a *real* delta, which always advances
//!
//! # Architecture
//!
//! Hosts either drive a [`FrameClock`], which measures elapsed wall time
//! between frames with [`std::time::Instant`], or a [`ManualClock`] fed with
//! predetermined deltas (fixed-step simulation, replays, tests). Both
//! implement [`TimeSource`].

pub mod error;
pub mod frame;
pub mod manual;

use serde::{Deserialize, Serialize};

pub use error::ClockError;
pub use frame::FrameClock;
pub use manual::ManualClock;

/// Time advanced during one frame, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameDelta {
    /// Delta affected by time scale and pause
    pub scaled: f64,
    /// Delta that always advances
    pub real: f64,
}

impl FrameDelta {
    /// A frame in which no time passed
    pub const ZERO: Self = Self {
        scaled: 0.0,
        real: 0.0,
    };

    /// Create a delta from separate scaled and real components
    #[inline]
    pub const fn new(scaled: f64, real: f64) -> Self {
        Self { scaled, real }
    }

    /// Create a delta where scaled and real time advance equally
    #[inline]
    pub const fn uniform(dt: f64) -> Self {
        Self {
            scaled: dt,
            real: dt,
        }
    }
}

/// A source of per-frame deltas
///
/// Called exactly once per host frame, before anything that reads
/// timer-driven state.
pub trait TimeSource {
    /// Produce the delta for the frame that just elapsed
    fn next_delta(&mut self) -> FrameDelta;
}

impl<T: TimeSource + ?Sized> TimeSource for &mut T {
    fn next_delta(&mut self) -> FrameDelta {
        (**self).next_delta()
    }
}

/// Clock settings
///
/// Stored as the `[clock]` table of the scheduler config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Multiplier applied to real time to obtain scaled time
    pub time_scale: f64,

    /// Upper bound for a single frame's delta (hitch protection)
    pub max_delta: Option<f64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta: None,
        }
    }
}

impl ClockConfig {
    /// Check the settings are usable by a [`FrameClock`]
    pub fn validate(&self) -> Result<(), ClockError> {
        validate_time_scale(self.time_scale)?;
        if let Some(max) = self.max_delta {
            if !max.is_finite() || max <= 0.0 {
                return Err(ClockError::InvalidMaxDelta(max));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_time_scale(scale: f64) -> Result<(), ClockError> {
    if !scale.is_finite() || scale < 0.0 {
        return Err(ClockError::InvalidTimeScale(scale));
    }
    Ok(())
}
