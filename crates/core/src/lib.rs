//! cadence - Core Scheduler
//!
//! This crate contains the tick-driven task scheduler and the pieces built
//! around it:
//! - [`timers`] - scheduler, pooled tasks, handles and named containers
//! - [`owners`] - owner registry used to bind tasks to host objects
//! - [`remote`] - cross-thread command queue
//! - [`config`] - TOML configuration
//!
//! # Re-exports
//!
//! This crate re-exports the clock crate for convenience:
//! - [`clock`] - frame deltas and time sources

use tracing::info;

// Re-export clock crate
pub use cadence_clock as clock;

pub mod config;
pub mod error;
pub mod logging;
pub mod owners;
pub mod remote;
pub mod timers;

// Re-export commonly used items
pub use timers::{
    liveness_fn, LivenessCheck, LoopPolicy, Scheduler, SchedulerStats, TaskFlags, TaskHandle,
    TaskOptions, TaskStatus, TimeDomain, TimerContainer,
};

// Re-export clock types
pub use cadence_clock::{FrameClock, FrameDelta, ManualClock, TimeSource};

// Re-export error types
pub use error::{ScheduleError, ScheduleResult};
pub use remote::{RemoteError, SchedulerRemote};

// Re-export owner types
pub use owners::{OwnerKey, OwnerProbe, OwnerRegistry};

// Re-export config types
pub use config::{ConfigError, ConfigResult, SchedulerConfig};

/// Build a scheduler and frame clock from one config
///
/// # Errors
/// Returns [`ConfigError::Invalid`] if the config fails validation.
pub fn build(config: SchedulerConfig) -> ConfigResult<(Scheduler, FrameClock)> {
    config.validate()?;
    let clock =
        FrameClock::with_config(&config.clock).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    info!(
        "Scheduler ready (capacity {}, slot limit {:?})",
        config.initial_capacity, config.max_slots
    );
    Ok((Scheduler::with_config(config), clock))
}
