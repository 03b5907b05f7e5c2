//! Wall-clock driven frame timing

use std::time::Instant;

use crate::{validate_time_scale, ClockConfig, ClockError, FrameDelta, TimeSource};

/// Frame clock measuring real time between calls
///
/// The scaled delta is `real * time_scale`, or zero while paused. When a
/// `max_delta` is configured both components are clamped to it, so a long
/// hitch (debugger break, window drag) does not fast-forward every timer.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    time_scale: f64,
    max_delta: Option<f64>,
    paused: bool,
    frame_count: u64,
    total_real: f64,
    total_scaled: f64,
}

impl FrameClock {
    /// Create a clock with a time scale of 1.0 and no clamp
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            time_scale: 1.0,
            max_delta: None,
            paused: false,
            frame_count: 0,
            total_real: 0.0,
            total_scaled: 0.0,
        }
    }

    /// Create a clock from config
    pub fn with_config(config: &ClockConfig) -> Result<Self, ClockError> {
        config.validate()?;
        Ok(Self {
            time_scale: config.time_scale,
            max_delta: config.max_delta,
            ..Self::new()
        })
    }

    /// Set the multiplier applied to scaled time
    ///
    /// A scale of zero freezes scaled time without marking the clock paused.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), ClockError> {
        validate_time_scale(scale)?;
        tracing::debug!("Time scale {} -> {}", self.time_scale, scale);
        self.time_scale = scale;
        Ok(())
    }

    /// Current time scale
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Stop scaled time; real time keeps advancing
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume scaled time
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether scaled time is currently stopped
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of deltas produced so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total real seconds produced so far
    pub fn total_real(&self) -> f64 {
        self.total_real
    }

    /// Total scaled seconds produced so far
    pub fn total_scaled(&self) -> f64 {
        self.total_scaled
    }

    /// Restart measurement from now and zero the counters
    pub fn reset(&mut self) {
        self.last = Instant::now();
        self.frame_count = 0;
        self.total_real = 0.0;
        self.total_scaled = 0.0;
    }

    /// Produce the delta between the previous frame and `now`
    ///
    /// An `now` earlier than the previous frame yields a zero delta.
    pub fn delta_at(&mut self, now: Instant) -> FrameDelta {
        let mut real = now.saturating_duration_since(self.last).as_secs_f64();
        self.last = now;

        if let Some(max) = self.max_delta {
            if real > max {
                tracing::trace!("Clamping frame delta {:.4}s to {:.4}s", real, max);
                real = max;
            }
        }

        let mut scaled = if self.paused {
            0.0
        } else {
            real * self.time_scale
        };
        if let Some(max) = self.max_delta {
            scaled = scaled.min(max);
        }

        self.frame_count += 1;
        self.total_real += real;
        self.total_scaled += scaled;

        FrameDelta::new(scaled, real)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for FrameClock {
    fn next_delta(&mut self) -> FrameDelta {
        self.delta_at(Instant::now())
    }
}
