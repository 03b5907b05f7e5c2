//! Generation-checked task handles
//!
//! A [`TaskHandle`] pairs a pool slot index with the generation the slot was
//! given when the task was scheduled. Slots are recycled, generations never
//! are, so a handle kept past its task's lifetime simply stops resolving
//! instead of aliasing whatever task occupies the slot next.
//!
//! # Handle Format
//!
//! ```text
//! ┌──────────────────────────┬───────────────────────────────────────┐
//! │      slot (u32)          │           generation (u64)            │
//! │  index into pool storage │  global counter, starts at 1, never   │
//! │  stable for process life │  reused or decremented                │
//! └──────────────────────────┴───────────────────────────────────────┘
//! ```
//!
//! - Generation 0 is never assigned, so [`TaskHandle::invalid`] never resolves
//! - Validity is re-checked by the scheduler on every use; holding a handle
//!   grants nothing by itself

use std::fmt;

/// Generation value that is never handed out
pub const INVALID_GENERATION: u64 = 0;

/// Opaque reference to one scheduled task
///
/// # Example
///
/// ```ignore
/// let handle = scheduler.schedule_once(2.0, |_| println!("done"))?;
///
/// if scheduler.is_valid(handle) {
///     scheduler.pause(handle);
/// }
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    slot: u32,
    generation: u64,
}

impl TaskHandle {
    /// Build a handle from its parts
    #[inline]
    pub const fn from_parts(slot: u32, generation: u64) -> Self {
        Self { slot, generation }
    }

    /// A handle that never resolves
    #[inline]
    pub const fn invalid() -> Self {
        Self::from_parts(0, INVALID_GENERATION)
    }

    /// Pool slot index
    #[inline]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation stamped when the task was scheduled
    #[inline]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this is the invalid sentinel
    ///
    /// Note: a non-sentinel handle may still be stale. Only the scheduler
    /// can say whether it currently resolves.
    #[inline]
    pub const fn is_sentinel(&self) -> bool {
        self.generation == INVALID_GENERATION
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            write!(f, "TaskHandle(invalid)")
        } else {
            write!(
                f,
                "TaskHandle(slot={}, generation={})",
                self.slot, self.generation
            )
        }
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            write!(f, "invalid")
        } else {
            write!(f, "{}:{}", self.slot, self.generation)
        }
    }
}
