//! Slot storage with a free-list
//!
//! Slots are appended on demand and never deallocated, so a slot index stays
//! meaningful for the life of the process. Recycled indices go on a LIFO
//! free-list. Generations are stamped by the scheduler, not here.

use crate::error::{ScheduleError, ScheduleResult};

use super::handle::TaskHandle;
use super::task::{Task, TaskStatus};

/// Growable slot storage
#[derive(Debug)]
pub(crate) struct Pool {
    slots: Vec<Task>,
    free: Vec<u32>,
    limit: u32,
}

impl Pool {
    /// Create a pool with room for `capacity` slots and at most `limit`
    pub fn new(capacity: usize, limit: Option<u32>) -> Self {
        let limit = limit.unwrap_or(u32::MAX);
        let capacity = capacity.min(limit as usize);
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            limit,
        }
    }

    /// Take a free slot, growing storage when the free-list is empty
    pub fn acquire(&mut self) -> ScheduleResult<(u32, &mut Task)> {
        if let Some(slot) = self.free.pop() {
            return Ok((slot, &mut self.slots[slot as usize]));
        }

        let index = self.slots.len();
        let slot = u32::try_from(index)
            .ok()
            .filter(|&slot| slot < self.limit)
            .ok_or(ScheduleError::SlotLimitReached { limit: self.limit })?;

        // Keep the free-list able to hold every slot so `release` never allocates
        self.slots.try_reserve(1)?;
        self.free.try_reserve(index + 1)?;

        self.slots.push(Task::vacant(slot));
        tracing::trace!("Task pool grew to {} slots", self.slots.len());
        Ok((slot, &mut self.slots[index]))
    }

    /// Return a slot to the free-list
    pub fn release(&mut self, slot: u32) {
        debug_assert!((slot as usize) < self.slots.len());
        self.free.push(slot);
    }

    /// Look up a slot
    #[inline]
    pub fn get(&self, slot: u32) -> Option<&Task> {
        self.slots.get(slot as usize)
    }

    /// Look up a slot mutably
    #[inline]
    pub fn get_mut(&mut self, slot: u32) -> Option<&mut Task> {
        self.slots.get_mut(slot as usize)
    }

    /// Resolve a handle to its task if the generation still matches
    #[inline]
    pub fn resolve(&self, handle: TaskHandle) -> Option<&Task> {
        self.get(handle.slot())
            .filter(|task| task.generation == handle.generation() && task.status != TaskStatus::Free)
    }

    /// Resolve a handle mutably if the generation still matches
    #[inline]
    pub fn resolve_mut(&mut self, handle: TaskHandle) -> Option<&mut Task> {
        self.get_mut(handle.slot())
            .filter(|task| task.generation == handle.generation() && task.status != TaskStatus::Free)
    }

    /// Iterate all slots, free ones included
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.slots.iter_mut()
    }

    /// Total slots ever created
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently on the free-list
    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_grows_then_reuses() {
        let mut pool = Pool::new(0, None);
        assert_eq!(pool.acquire().unwrap().0, 0);
        assert_eq!(pool.acquire().unwrap().0, 1);
        assert_eq!(pool.capacity(), 2);

        pool.release(0);
        assert_eq!(pool.free_len(), 1);
        assert_eq!(pool.acquire().unwrap().0, 0);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.free_len(), 0);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut pool = Pool::new(4, None);
        for _ in 0..3 {
            pool.acquire().unwrap().0;
        }
        pool.release(0);
        pool.release(2);
        assert_eq!(pool.acquire().unwrap().0, 2);
        assert_eq!(pool.acquire().unwrap().0, 0);
    }

    #[test]
    fn test_slot_limit() {
        let mut pool = Pool::new(16, Some(2));
        pool.acquire().unwrap().0;
        pool.acquire().unwrap().0;
        assert!(matches!(
            pool.acquire(),
            Err(ScheduleError::SlotLimitReached { limit: 2 })
        ));

        pool.release(1);
        assert_eq!(pool.acquire().unwrap().0, 1);
    }

    #[test]
    fn test_release_does_not_touch_generation() {
        let mut pool = Pool::new(1, None);
        let (slot, task) = pool.acquire().unwrap();
        task.generation = 9;
        pool.release(slot);
        assert_eq!(pool.get(slot).unwrap().generation, 9);
    }
}
