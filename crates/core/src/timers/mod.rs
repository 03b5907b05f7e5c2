//! Timer system for scheduling delayed and repeating callbacks
//!
//! The [`Scheduler`] is advanced once per host frame via [`Scheduler::tick`]
//! and can run tasks that:
//! - Fire once after a delay
//! - Repeat a fixed number of times, or forever
//! - Follow scaled (pausable) or real time
//! - Silently stop when the object they are bound to is destroyed
//!
//! Tasks live in pooled slots and are referenced through generation-checked
//! [`TaskHandle`]s, so a handle kept after its task finished never resolves
//! to whatever task reuses the slot.
//!
//! # Tick Phases
//!
//! 1. Drain commands submitted through a [`SchedulerRemote`]
//! 2. Move tasks scheduled since the last tick from `pending` into `active`
//! 3. Advance every active task in insertion order, firing callbacks
//! 4. Sweep finished and cancelled tasks back into the pool
//!
//! Callbacks receive `&mut Scheduler` and may schedule, cancel or pause tasks.
//! Anything they schedule lands in `pending` and first runs on the next tick;
//! nothing is recycled until phase 4, so a callback can never be handed the
//! slot that is currently being driven.
//!
//! # Example
//!
//! ```ignore
//! use cadence_core::{LoopPolicy, Scheduler, TaskOptions};
//!
//! let mut scheduler = Scheduler::new();
//!
//! // One-shot timer
//! let handle = scheduler.schedule_once(5.0, |_| println!("5 seconds passed!"))?;
//!
//! // Repeating timer
//! let pulse = scheduler.schedule_repeating(0.1, |_| println!("Tick!"))?;
//!
//! // Three pulses, then done
//! scheduler.schedule(
//!     TaskOptions::new(1.0)
//!         .looping(LoopPolicy::FixedCount(2))
//!         .on_complete(|_| println!("pulse")),
//! )?;
//!
//! // Host loop
//! scheduler.tick(dt * time_scale, dt);
//!
//! // Cancel a timer
//! scheduler.cancel(pulse);
//! ```

mod container;
mod handle;
mod pool;
mod task;

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use cadence_clock::{FrameDelta, TimeSource};

use crate::config::SchedulerConfig;
use crate::error::{check_duration, ScheduleResult};
use crate::remote::{CommandQueue, SchedulerRemote};

pub use container::TimerContainer;
pub use handle::{TaskHandle, INVALID_GENERATION};
pub use task::{
    liveness_fn, CompleteCallback, FnLiveness, LivenessCheck, LoopPolicy, TaskFlags, TaskOptions,
    TaskStatus, TickCallback, TimeDomain,
};

use pool::Pool;
use task::LoopOutcome;

/// Running counters, useful for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks successfully scheduled
    pub scheduled: u64,
    /// Times any task reached its duration (once per loop iteration)
    pub completed: u64,
    /// Tasks cancelled through a handle or bulk cancellation
    pub cancelled: u64,
    /// Tasks dropped because their owner was gone
    pub owner_gone: u64,
    /// Slots returned to the pool
    pub recycled: u64,
}

/// Tick-driven task scheduler
///
/// Constructed once by the host and passed by `&mut` to whatever needs to
/// schedule work. Other threads go through [`Scheduler::remote`].
pub struct Scheduler {
    pool: Pool,
    /// Slots advanced each tick, in insertion order
    active: Vec<u32>,
    /// Slots scheduled since the last tick
    pending: Vec<u32>,
    next_generation: u64,
    commands: CommandQueue,
    config: SchedulerConfig,
    stats: SchedulerStats,
    tick_count: u64,
    in_tick: bool,
}

impl Scheduler {
    /// Create a scheduler with default config
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a scheduler from config
    ///
    /// Up-front reservation is bounded by `max_slots` and
    /// [`MAX_INITIAL_CAPACITY`](crate::config::MAX_INITIAL_CAPACITY) even when
    /// the config was never validated.
    pub fn with_config(config: SchedulerConfig) -> Self {
        let capacity = config.reserved_capacity();
        Self {
            pool: Pool::new(capacity, config.max_slots),
            active: Vec::with_capacity(capacity),
            pending: Vec::with_capacity(capacity),
            next_generation: INVALID_GENERATION + 1,
            commands: CommandQueue::new(config.remote_capacity),
            config,
            stats: SchedulerStats::default(),
            tick_count: 0,
            in_tick: false,
        }
    }

    /// Active config
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Schedule a task
    ///
    /// The task becomes active at the start of the next tick. A zero
    /// duration fires on that tick.
    ///
    /// # Errors
    /// - [`ScheduleError::InvalidDuration`](crate::ScheduleError::InvalidDuration)
    ///   for a negative or NaN duration
    /// - [`ScheduleError::SlotLimitReached`](crate::ScheduleError::SlotLimitReached)
    ///   or [`ScheduleError::Allocation`](crate::ScheduleError::Allocation) when
    ///   the pool cannot supply a slot
    pub fn schedule(&mut self, options: TaskOptions) -> ScheduleResult<TaskHandle> {
        check_duration(options.duration())?;
        self.pending.try_reserve(1)?;

        let (slot, task) = self.pool.acquire()?;
        let generation = self.next_generation;
        self.next_generation += 1;

        task.occupy(generation, options);
        tracing::trace!(
            slot,
            generation,
            duration = task.duration,
            "Task scheduled ({:?}, {:?})",
            task.loop_policy,
            task.time_domain
        );

        self.pending.push(slot);
        self.stats.scheduled += 1;
        Ok(TaskHandle::from_parts(slot, generation))
    }

    /// Schedule a one-shot task firing after `delay` seconds of scaled time
    pub fn schedule_once<F>(&mut self, delay: f64, callback: F) -> ScheduleResult<TaskHandle>
    where
        F: FnMut(&mut Scheduler) + Send + 'static,
    {
        self.schedule(TaskOptions::new(delay).on_complete(callback))
    }

    /// Schedule a task firing every `interval` seconds of scaled time until cancelled
    pub fn schedule_repeating<F>(&mut self, interval: f64, callback: F) -> ScheduleResult<TaskHandle>
    where
        F: FnMut(&mut Scheduler) + Send + 'static,
    {
        self.schedule(
            TaskOptions::new(interval)
                .looping(LoopPolicy::Infinite)
                .on_complete(callback),
        )
    }

    /// Advance every active task
    ///
    /// Call exactly once per host frame. Negative or non-finite deltas are
    /// treated as zero. Calling `tick` from inside a callback is ignored.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn tick(&mut self, scaled_delta: f64, real_delta: f64) {
        if self.in_tick {
            tracing::warn!("Ignoring re-entrant Scheduler::tick from a task callback");
            return;
        }

        let start = Instant::now();
        self.in_tick = true;
        self.tick_count += 1;

        let scaled = sanitize_delta(scaled_delta);
        let real = sanitize_delta(real_delta);

        // A panicking callback must not leave the scheduler locked out of ticking
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_tick(scaled, real)));
        self.in_tick = false;
        if let Err(payload) = result {
            tracing::error!("Task callback panicked during tick {}", self.tick_count);
            panic::resume_unwind(payload);
        }

        let elapsed = start.elapsed();
        let warn_us = self.config.slow_tick_warn_us;
        if warn_us > 0 && elapsed.as_micros() > u128::from(warn_us) {
            tracing::warn!(
                "Scheduler tick took {}us ({} active tasks, tick {})",
                elapsed.as_micros(),
                self.active.len(),
                self.tick_count
            );
        }
    }

    fn run_tick(&mut self, scaled: f64, real: f64) {
        let commands = self.drain_commands();
        if commands > 0 {
            tracing::trace!("Processed {} remote commands", commands);
        }

        self.merge_pending();

        // Callbacks only append to `pending`, never to `active`
        for index in 0..self.active.len() {
            let slot = self.active[index];
            self.run_slot(slot, scaled, real);
        }

        let recycled = self.sweep();
        if recycled > 0 {
            tracing::trace!("Recycled {} task slots", recycled);
        }
    }

    /// Pull one delta from `source` and tick with it
    pub fn advance<S>(&mut self, source: &mut S) -> FrameDelta
    where
        S: TimeSource + ?Sized,
    {
        let delta = source.next_delta();
        self.tick(delta.scaled, delta.real);
        delta
    }

    /// Cancel a task
    ///
    /// The task stops immediately; its slot is recycled at the end of the
    /// next tick. Stale, finished or already cancelled handles are ignored.
    ///
    /// # Returns
    /// `true` if a running task was cancelled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.pool.resolve_mut(handle) {
            Some(task) if task.is_live() => {
                task.status = TaskStatus::Done;
                self.stats.cancelled += 1;
                tracing::trace!(%handle, "Task cancelled");
                true
            }
            _ => false,
        }
    }

    /// Stop a task from advancing
    ///
    /// # Returns
    /// `true` if the handle resolved to a running task
    pub fn pause(&mut self, handle: TaskHandle) -> bool {
        self.set_paused(handle, true)
    }

    /// Let a paused task advance again
    ///
    /// # Returns
    /// `true` if the handle resolved to a running task
    pub fn resume(&mut self, handle: TaskHandle) -> bool {
        self.set_paused(handle, false)
    }

    fn set_paused(&mut self, handle: TaskHandle, paused: bool) -> bool {
        match self.pool.resolve_mut(handle) {
            Some(task) if task.is_live() => {
                task.paused = paused;
                true
            }
            _ => false,
        }
    }

    /// Whether the handle still refers to its task
    ///
    /// A finished or cancelled task stays valid until the sweep at the end
    /// of the tick that recycles it.
    pub fn is_valid(&self, handle: TaskHandle) -> bool {
        self.pool.resolve(handle).is_some()
    }

    /// `(elapsed, duration)` of the current iteration
    pub fn progress(&self, handle: TaskHandle) -> Option<(f64, f64)> {
        self.pool
            .resolve(handle)
            .map(|task| (task.elapsed, task.duration))
    }

    /// Seconds left in the current iteration
    pub fn remaining(&self, handle: TaskHandle) -> Option<f64> {
        self.pool.resolve(handle).map(|task| task.remaining())
    }

    /// Lifecycle state of the task
    pub fn status(&self, handle: TaskHandle) -> Option<TaskStatus> {
        self.pool.resolve(handle).map(|task| task.status)
    }

    /// Remaining loop policy; `FixedCount` counts down as iterations complete
    pub fn loop_policy(&self, handle: TaskHandle) -> Option<LoopPolicy> {
        self.pool.resolve(handle).map(|task| task.loop_policy)
    }

    /// Whether the task is paused
    pub fn is_paused(&self, handle: TaskHandle) -> Option<bool> {
        self.pool.resolve(handle).map(|task| task.paused)
    }

    /// Change a running task's duration
    ///
    /// Takes effect on the next tick; elapsed time is kept.
    ///
    /// # Returns
    /// `Ok(true)` if the task was updated, `Ok(false)` for a stale handle
    pub fn set_duration(&mut self, handle: TaskHandle, duration: f64) -> ScheduleResult<bool> {
        let duration = check_duration(duration)?;
        Ok(match self.pool.resolve_mut(handle) {
            Some(task) if task.is_live() => {
                task.duration = duration;
                true
            }
            _ => false,
        })
    }

    /// Reset the current iteration's elapsed time to zero
    pub fn restart(&mut self, handle: TaskHandle) -> bool {
        match self.pool.resolve_mut(handle) {
            Some(task) if task.is_live() => {
                task.elapsed = 0.0;
                true
            }
            _ => false,
        }
    }

    /// Cancel every running task carrying any of `flags`
    ///
    /// # Returns
    /// Number of tasks cancelled
    pub fn cancel_where(&mut self, flags: TaskFlags) -> usize {
        self.cancel_matching(|task_flags| task_flags.intersects(flags))
    }

    /// Cancel every running task except those flagged `KEEP_ON_CLEAR`
    ///
    /// # Returns
    /// Number of tasks cancelled
    pub fn cancel_all(&mut self) -> usize {
        let removed = self.cancel_matching(|flags| !flags.contains(TaskFlags::KEEP_ON_CLEAR));
        if removed > 0 {
            tracing::debug!("Cancelled {} tasks", removed);
        }
        removed
    }

    /// Cancel every task flagged `STOP_ON_SCENE_CHANGE`
    ///
    /// Called by the host when it unloads a scene.
    pub fn clear_scene(&mut self) -> usize {
        let removed = self.cancel_where(TaskFlags::STOP_ON_SCENE_CHANGE);
        if removed > 0 {
            tracing::debug!("Removed {} tasks on scene change", removed);
        }
        removed
    }

    fn cancel_matching<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(TaskFlags) -> bool,
    {
        let mut removed = 0;
        for task in self.pool.iter_mut() {
            if task.is_live() && predicate(task.flags) {
                task.status = TaskStatus::Done;
                removed += 1;
            }
        }
        self.stats.cancelled += removed as u64;
        removed
    }

    /// A sender other threads can use to queue work for the next tick
    pub fn remote(&self) -> SchedulerRemote {
        self.commands.remote()
    }

    /// Tasks driven by the current tick loop, including ones awaiting the sweep
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Tasks scheduled since the last tick
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Slots created so far
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Slots ready for reuse
    pub fn free_len(&self) -> usize {
        self.pool.free_len()
    }

    /// Number of ticks processed
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Running counters
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    fn drain_commands(&mut self) -> usize {
        let limit = self.config.max_remote_commands_per_tick;
        let mut count = 0;
        while count < limit {
            let Some(command) = self.commands.try_next() else {
                break;
            };
            command(self);
            count += 1;
        }
        count
    }

    fn merge_pending(&mut self) {
        for slot in self.pending.drain(..) {
            if let Some(task) = self.pool.get_mut(slot) {
                // Tasks cancelled before their first tick stay Done
                if task.status == TaskStatus::Scheduled {
                    task.status = TaskStatus::Active;
                }
            }
            self.active.push(slot);
        }
    }

    fn run_slot(&mut self, slot: u32, scaled: f64, real: f64) {
        let Some(task) = self.pool.get_mut(slot) else {
            return;
        };
        if task.status != TaskStatus::Active {
            return;
        }

        if !task.owner_alive() {
            task.status = TaskStatus::Done;
            self.stats.owner_gone += 1;
            tracing::trace!(slot, generation = task.generation, "Owner gone, dropping task");
            return;
        }

        if task.paused {
            return;
        }

        task.elapsed += task.time_domain.select(scaled, real);
        let remaining = task.remaining();

        if let Some(mut callback) = task.on_tick.take() {
            callback(self, remaining);
            if let Some(task) = self.pool.get_mut(slot) {
                task.on_tick = Some(callback);
            }
        }

        // Re-read: the tick callback may have cancelled, restarted or resized the task
        let Some(task) = self.pool.get_mut(slot) else {
            return;
        };
        if task.status != TaskStatus::Active || !task.is_due() {
            return;
        }

        self.stats.completed += 1;
        if let Some(mut callback) = task.on_complete.take() {
            callback(self);
            if let Some(task) = self.pool.get_mut(slot) {
                task.on_complete = Some(callback);
            }
        }

        let Some(task) = self.pool.get_mut(slot) else {
            return;
        };
        if task.status != TaskStatus::Active {
            return;
        }
        if task.finish_iteration() == LoopOutcome::Finished {
            tracing::trace!(slot, generation = task.generation, "Task finished");
        }
    }

    fn sweep(&mut self) -> usize {
        let pool = &mut self.pool;
        let before = self.active.len();

        self.active.retain(|&slot| match pool.get_mut(slot) {
            Some(task) if task.status == TaskStatus::Done => {
                task.vacate();
                pool.release(slot);
                false
            }
            _ => true,
        });

        let recycled = before - self.active.len();
        self.stats.recycled += recycled as u64;
        recycled
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("active", &self.active.len())
            .field("pending", &self.pending.len())
            .field("slots", &self.pool.capacity())
            .field("free", &self.pool.free_len())
            .field("tick_count", &self.tick_count)
            .field("stats", &self.stats)
            .finish()
    }
}

#[inline]
fn sanitize_delta(delta: f64) -> f64 {
    if delta.is_finite() && delta > 0.0 {
        delta
    } else {
        0.0
    }
}
