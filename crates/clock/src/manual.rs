//! Manually fed clock for fixed-step hosts and tests

use std::collections::VecDeque;

use crate::{FrameDelta, TimeSource};

/// Clock that replays queued deltas
///
/// Once the queue is empty every frame yields the fallback delta
/// (zero unless set with [`ManualClock::with_fallback`]).
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    queue: VecDeque<FrameDelta>,
    fallback: FrameDelta,
}

impl ManualClock {
    /// Create an empty clock with a zero fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock that yields `delta` every frame
    pub fn fixed(delta: FrameDelta) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: delta,
        }
    }

    /// Set the delta used once the queue is exhausted
    pub fn with_fallback(mut self, delta: FrameDelta) -> Self {
        self.fallback = delta;
        self
    }

    /// Queue one delta
    pub fn push(&mut self, delta: FrameDelta) {
        self.queue.push_back(delta);
    }

    /// Queue several deltas in order
    pub fn extend<I>(&mut self, deltas: I)
    where
        I: IntoIterator<Item = FrameDelta>,
    {
        self.queue.extend(deltas);
    }

    /// Number of queued deltas not yet consumed
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl TimeSource for ManualClock {
    fn next_delta(&mut self) -> FrameDelta {
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_then_fallback() {
        let mut clock = ManualClock::new().with_fallback(FrameDelta::uniform(0.1));
        clock.push(FrameDelta::new(1.0, 2.0));
        clock.extend([FrameDelta::uniform(0.5)]);
        assert_eq!(clock.queued(), 2);

        assert_eq!(clock.next_delta(), FrameDelta::new(1.0, 2.0));
        assert_eq!(clock.next_delta(), FrameDelta::uniform(0.5));
        assert_eq!(clock.next_delta(), FrameDelta::uniform(0.1));
        assert_eq!(clock.queued(), 0);
    }

    #[test]
    fn test_fixed_clock() {
        let mut clock = ManualClock::fixed(FrameDelta::uniform(0.016));
        for _ in 0..3 {
            assert_eq!(clock.next_delta(), FrameDelta::uniform(0.016));
        }
    }
}
