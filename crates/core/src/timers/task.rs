//! Task state, options and flags

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bitflags::bitflags;

use super::Scheduler;

bitflags! {
    /// Flags that control bulk cancellation
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct TaskFlags: u32 {
        /// Task is cancelled by `Scheduler::clear_scene`
        const STOP_ON_SCENE_CHANGE = 0x01;
        /// Task survives `Scheduler::cancel_all`
        const KEEP_ON_CLEAR = 0x02;
    }
}

/// What happens when a task's elapsed time reaches its duration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoopPolicy {
    /// Fire once, then finish
    #[default]
    OneShot,
    /// Fire once more for each remaining repeat
    FixedCount(u32),
    /// Fire every `duration` until cancelled
    Infinite,
}

/// Which delta advances a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeDomain {
    /// Follows the global time scale and pause
    #[default]
    Scaled,
    /// Always advances
    Real,
}

impl TimeDomain {
    /// Pick this domain's component out of a tick's deltas
    #[inline]
    pub fn select(self, scaled: f64, real: f64) -> f64 {
        match self {
            Self::Scaled => scaled,
            Self::Real => real,
        }
    }
}

/// Lifecycle state of a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Slot is on the free-list
    Free,
    /// Scheduled, waiting for the next tick to become active
    Scheduled,
    /// Advanced every tick
    Active,
    /// Finished or cancelled, recycled at the end of the next tick
    Done,
}

/// Reports whether the object a task is bound to still exists
///
/// Checked once per tick before the task advances. When it reports `false`
/// the task is finished without firing its completion callback.
pub trait LivenessCheck: Send + 'static {
    /// `true` while the owner is alive
    fn is_alive(&self) -> bool;
}

impl<T: Send + Sync + 'static> LivenessCheck for Weak<T> {
    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}

/// Shared alive flag, cleared by the owner when it is destroyed
impl LivenessCheck for Arc<AtomicBool> {
    fn is_alive(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// Liveness check backed by a closure, see [`liveness_fn`]
pub struct FnLiveness<F>(F);

impl<F> LivenessCheck for FnLiveness<F>
where
    F: Fn() -> bool + Send + 'static,
{
    fn is_alive(&self) -> bool {
        (self.0)()
    }
}

/// Wrap a closure as a [`LivenessCheck`]
pub fn liveness_fn<F>(check: F) -> FnLiveness<F>
where
    F: Fn() -> bool + Send + 'static,
{
    FnLiveness(check)
}

/// Callback fired each time a task reaches its duration
pub type CompleteCallback = Box<dyn FnMut(&mut Scheduler) + Send + 'static>;

/// Callback fired every tick a task advances, with the seconds remaining
pub type TickCallback = Box<dyn FnMut(&mut Scheduler, f64) + Send + 'static>;

/// Everything needed to schedule a task
///
/// # Example
///
/// ```ignore
/// use cadence_core::{LoopPolicy, TaskOptions, TimeDomain};
///
/// let options = TaskOptions::new(1.5)
///     .looping(LoopPolicy::FixedCount(2))
///     .domain(TimeDomain::Real)
///     .on_complete(|_| tracing::info!("pulse"));
/// let handle = scheduler.schedule(options)?;
/// ```
pub struct TaskOptions {
    pub(crate) duration: f64,
    pub(crate) loop_policy: LoopPolicy,
    pub(crate) time_domain: TimeDomain,
    pub(crate) flags: TaskFlags,
    pub(crate) paused: bool,
    pub(crate) on_complete: Option<CompleteCallback>,
    pub(crate) on_tick: Option<TickCallback>,
    pub(crate) owner_probe: Option<Box<dyn LivenessCheck>>,
}

impl TaskOptions {
    /// One-shot, scaled-time task firing after `duration` seconds
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            loop_policy: LoopPolicy::OneShot,
            time_domain: TimeDomain::Scaled,
            flags: TaskFlags::empty(),
            paused: false,
            on_complete: None,
            on_tick: None,
            owner_probe: None,
        }
    }

    /// Set the loop policy
    pub fn looping(mut self, policy: LoopPolicy) -> Self {
        self.loop_policy = policy;
        self
    }

    /// Set the time domain
    pub fn domain(mut self, domain: TimeDomain) -> Self {
        self.time_domain = domain;
        self
    }

    /// Set bulk-cancellation flags
    pub fn flags(mut self, flags: TaskFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Schedule the task paused; it waits for `Scheduler::resume`
    pub fn start_paused(mut self) -> Self {
        self.paused = true;
        self
    }

    /// Callback fired on every completion (once per loop iteration)
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut Scheduler) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Callback fired every tick the task advances
    pub fn on_tick<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut Scheduler, f64) + Send + 'static,
    {
        self.on_tick = Some(Box::new(callback));
        self
    }

    /// Bind the task to an owner; it is silently dropped once the owner is gone
    pub fn bound_to<L: LivenessCheck>(mut self, probe: L) -> Self {
        self.owner_probe = Some(Box::new(probe));
        self
    }

    /// Requested duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

impl fmt::Debug for TaskOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskOptions")
            .field("duration", &self.duration)
            .field("loop_policy", &self.loop_policy)
            .field("time_domain", &self.time_domain)
            .field("flags", &self.flags)
            .field("paused", &self.paused)
            .field("on_complete", &self.on_complete.is_some())
            .field("on_tick", &self.on_tick.is_some())
            .field("bound", &self.owner_probe.is_some())
            .finish()
    }
}

/// Outcome of a completed iteration after applying the loop policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopOutcome {
    /// Elapsed reset, task keeps running
    Rearmed,
    /// No repeats left
    Finished,
}

/// One pool slot and the task currently occupying it
pub(crate) struct Task {
    pub slot: u32,
    pub generation: u64,
    pub status: TaskStatus,
    pub duration: f64,
    pub elapsed: f64,
    pub loop_policy: LoopPolicy,
    pub time_domain: TimeDomain,
    pub flags: TaskFlags,
    pub paused: bool,
    pub on_complete: Option<CompleteCallback>,
    pub on_tick: Option<TickCallback>,
    pub owner_probe: Option<Box<dyn LivenessCheck>>,
}

impl Task {
    /// An empty slot
    pub fn vacant(slot: u32) -> Self {
        Self {
            slot,
            generation: super::handle::INVALID_GENERATION,
            status: TaskStatus::Free,
            duration: 0.0,
            elapsed: 0.0,
            loop_policy: LoopPolicy::OneShot,
            time_domain: TimeDomain::Scaled,
            flags: TaskFlags::empty(),
            paused: false,
            on_complete: None,
            on_tick: None,
            owner_probe: None,
        }
    }

    /// Move a free slot into the Scheduled state under `generation`
    pub fn occupy(&mut self, generation: u64, options: TaskOptions) {
        debug_assert_eq!(self.status, TaskStatus::Free);
        debug_assert!(generation > self.generation);

        self.generation = generation;
        self.status = TaskStatus::Scheduled;
        self.duration = options.duration;
        self.elapsed = 0.0;
        self.loop_policy = options.loop_policy;
        self.time_domain = options.time_domain;
        self.flags = options.flags;
        self.paused = options.paused;
        self.on_complete = options.on_complete;
        self.on_tick = options.on_tick;
        self.owner_probe = options.owner_probe;
    }

    /// Drop callbacks and probe and mark the slot free
    ///
    /// The generation is left untouched; a fresh one is stamped on the next
    /// `occupy`.
    pub fn vacate(&mut self) {
        self.status = TaskStatus::Free;
        self.paused = false;
        self.elapsed = 0.0;
        self.on_complete = None;
        self.on_tick = None;
        self.owner_probe = None;
    }

    /// Whether the task has not been finished or cancelled
    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self.status, TaskStatus::Scheduled | TaskStatus::Active)
    }

    /// `false` only when bound to an owner that is gone
    #[inline]
    pub fn owner_alive(&self) -> bool {
        self.owner_probe
            .as_ref()
            .map_or(true, |probe| probe.is_alive())
    }

    /// Seconds left in the current iteration, never negative
    #[inline]
    pub fn remaining(&self) -> f64 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Whether the current iteration has run its full duration
    #[inline]
    pub fn is_due(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Apply the loop policy after a completion
    pub fn finish_iteration(&mut self) -> LoopOutcome {
        match self.loop_policy {
            LoopPolicy::OneShot | LoopPolicy::FixedCount(0) => {
                self.status = TaskStatus::Done;
                LoopOutcome::Finished
            }
            LoopPolicy::FixedCount(n) => {
                self.loop_policy = LoopPolicy::FixedCount(n - 1);
                self.elapsed = 0.0;
                LoopOutcome::Rearmed
            }
            LoopPolicy::Infinite => {
                self.elapsed = 0.0;
                LoopOutcome::Rearmed
            }
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("slot", &self.slot)
            .field("generation", &self.generation)
            .field("status", &self.status)
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("loop_policy", &self.loop_policy)
            .field("time_domain", &self.time_domain)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}
