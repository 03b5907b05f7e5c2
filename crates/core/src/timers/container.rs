//! Named timers owned by one logical object
//!
//! A [`TimerContainer`] keeps at most one task per name. Re-adding a name
//! cancels the task previously stored under it, which is how cooldowns and
//! debounced actions restart. Entries are garbage collected lazily: a lookup
//! that finds a stale handle drops the entry.
//!
//! The container holds no reference to the scheduler; every call takes the
//! scheduler explicitly.
//!
//! # Example
//!
//! ```ignore
//! use cadence_core::{TaskOptions, TimerContainer};
//!
//! let mut timers = TimerContainer::new();
//!
//! // Re-triggering the cooldown cancels the running one
//! timers.add(&mut scheduler, "dash_cooldown", TaskOptions::new(1.5))?;
//! timers.add(&mut scheduler, "dash_cooldown", TaskOptions::new(1.5))?;
//!
//! let ready = timers.get(&scheduler, "dash_cooldown").is_none();
//! ```

use std::collections::HashMap;

use crate::error::ScheduleResult;

use super::{Scheduler, TaskHandle, TaskOptions};

/// Name to handle registry with replace-on-add semantics
#[derive(Debug, Default)]
pub struct TimerContainer {
    entries: HashMap<String, TaskHandle>,
}

impl TimerContainer {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task under `name`, cancelling the task previously stored there
    ///
    /// The new task is scheduled first; if that fails the old entry is left
    /// untouched. Last writer wins when two call sites share a name.
    pub fn add(
        &mut self,
        scheduler: &mut Scheduler,
        name: impl Into<String>,
        options: TaskOptions,
    ) -> ScheduleResult<TaskHandle> {
        let handle = scheduler.schedule(options)?;
        let name = name.into();

        if let Some(old) = self.entries.insert(name, handle) {
            if scheduler.is_valid(old) {
                scheduler.cancel(old);
            }
        }
        Ok(handle)
    }

    /// Schedule a one-shot callback under `name`
    pub fn add_once<F>(
        &mut self,
        scheduler: &mut Scheduler,
        name: impl Into<String>,
        delay: f64,
        callback: F,
    ) -> ScheduleResult<TaskHandle>
    where
        F: FnMut(&mut Scheduler) + Send + 'static,
    {
        self.add(scheduler, name, TaskOptions::new(delay).on_complete(callback))
    }

    /// Handle stored under `name` if it still resolves
    ///
    /// A stale entry is removed and `None` returned.
    pub fn get(&mut self, scheduler: &Scheduler, name: &str) -> Option<TaskHandle> {
        let handle = *self.entries.get(name)?;
        if scheduler.is_valid(handle) {
            Some(handle)
        } else {
            self.entries.remove(name);
            None
        }
    }

    /// Whether `name` maps to a task that still resolves
    pub fn contains(&mut self, scheduler: &Scheduler, name: &str) -> bool {
        self.get(scheduler, name).is_some()
    }

    /// Cancel and forget the task under `name`
    ///
    /// # Returns
    /// `true` if a running task was cancelled
    pub fn remove(&mut self, scheduler: &mut Scheduler, name: &str) -> bool {
        self.entries
            .remove(name)
            .is_some_and(|handle| scheduler.cancel(handle))
    }

    /// Pause the task under `name`
    pub fn pause(&mut self, scheduler: &mut Scheduler, name: &str) -> bool {
        self.get(scheduler, name)
            .is_some_and(|handle| scheduler.pause(handle))
    }

    /// Resume the task under `name`
    pub fn resume(&mut self, scheduler: &mut Scheduler, name: &str) -> bool {
        self.get(scheduler, name)
            .is_some_and(|handle| scheduler.resume(handle))
    }

    /// Cancel every stored task and empty the container
    ///
    /// Stale handles are skipped.
    pub fn clear(&mut self, scheduler: &mut Scheduler) {
        let mut cancelled = 0;
        for (_, handle) in self.entries.drain() {
            if scheduler.is_valid(handle) && scheduler.cancel(handle) {
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::debug!("Cleared {} named timers", cancelled);
        }
    }

    /// Drop every entry whose handle no longer resolves
    ///
    /// # Returns
    /// Number of entries removed
    pub fn prune(&mut self, scheduler: &Scheduler) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, handle| scheduler.is_valid(*handle));
        before - self.entries.len()
    }

    /// Number of stored entries, stale ones included until pruned
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::ScheduleError;

    fn counted(count: &Arc<AtomicUsize>, duration: f64) -> TaskOptions {
        let count = count.clone();
        TaskOptions::new(duration).on_complete(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_replacement_cancels_previous() {
        let mut scheduler = Scheduler::new();
        let mut timers = TimerContainer::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let old = timers
            .add(&mut scheduler, "cd", counted(&first, 1.0))
            .unwrap();
        let new = timers
            .add(&mut scheduler, "cd", counted(&second, 1.0))
            .unwrap();
        assert_eq!(timers.len(), 1);

        for _ in 0..3 {
            scheduler.tick(1.0, 1.0);
        }
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_valid(old));
        assert!(!scheduler.is_valid(new));
    }

    #[test]
    fn test_get_collects_stale_entries() {
        let mut scheduler = Scheduler::new();
        let mut timers = TimerContainer::new();

        let handle = timers
            .add(&mut scheduler, "blink", TaskOptions::new(0.5))
            .unwrap();
        assert_eq!(timers.get(&scheduler, "blink"), Some(handle));

        scheduler.tick(0.5, 0.5);
        assert_eq!(timers.get(&scheduler, "blink"), None);
        assert!(timers.is_empty());
        assert_eq!(timers.get(&scheduler, "missing"), None);
    }

    #[test]
    fn test_clear_tolerates_stale_handles() {
        let mut scheduler = Scheduler::new();
        let mut timers = TimerContainer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        timers
            .add(&mut scheduler, "short", TaskOptions::new(0.0))
            .unwrap();
        timers
            .add(&mut scheduler, "long", counted(&fired, 5.0))
            .unwrap();
        scheduler.tick(0.0, 0.0);

        timers.clear(&mut scheduler);
        assert!(timers.is_empty());

        scheduler.tick(10.0, 10.0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_add_keeps_old_entry() {
        let mut scheduler = Scheduler::new();
        let mut timers = TimerContainer::new();

        let handle = timers
            .add(&mut scheduler, "cd", TaskOptions::new(1.0))
            .unwrap();
        let result = timers.add(&mut scheduler, "cd", TaskOptions::new(-1.0));
        assert!(matches!(result, Err(ScheduleError::InvalidDuration(_))));
        assert_eq!(timers.get(&scheduler, "cd"), Some(handle));
    }

    #[test]
    fn test_remove_pause_resume_by_name() {
        let mut scheduler = Scheduler::new();
        let mut timers = TimerContainer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let count = fired.clone();

        timers
            .add_once(&mut scheduler, "fade", 1.0, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(timers.pause(&mut scheduler, "fade"));
        scheduler.tick(2.0, 2.0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert!(timers.resume(&mut scheduler, "fade"));
        assert!(timers.contains(&scheduler, "fade"));
        assert!(timers.remove(&mut scheduler, "fade"));
        assert!(!timers.remove(&mut scheduler, "fade"));

        scheduler.tick(2.0, 2.0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_prune_and_names() {
        let mut scheduler = Scheduler::new();
        let mut timers = TimerContainer::new();

        timers
            .add(&mut scheduler, "gone", TaskOptions::new(0.0))
            .unwrap();
        timers
            .add(&mut scheduler, "kept", TaskOptions::new(9.0))
            .unwrap();
        scheduler.tick(0.0, 0.0);

        assert_eq!(timers.prune(&scheduler), 1);
        assert_eq!(timers.names().collect::<Vec<_>>(), vec!["kept"]);
    }
}
