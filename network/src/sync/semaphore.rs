//! Counting semaphore for the TX outstanding-count.
//!
//! `give` is a single CAS loop and may run in interrupt context. `take`
//! spins on the supplied [`Clock`] until a unit is available or the
//! deadline passes; it is only called from task context.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::hal::Clock;

/// Counting semaphore with a fixed ceiling.
#[derive(Debug)]
pub struct CountingSemaphore {
    count: AtomicUsize,
    max: usize,
}

impl CountingSemaphore {
    /// Semaphore holding `initial` units, never more than `max`.
    pub const fn new(initial: usize, max: usize) -> Self {
        let initial = if initial > max { max } else { initial };
        Self {
            count: AtomicUsize::new(initial),
            max,
        }
    }

    /// Take one unit if available.
    pub fn try_take(&self) -> bool {
        let mut current = self.count.load(Ordering::Acquire);
        while current > 0 {
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    /// Take one unit, waiting at most `timeout_ms`.
    ///
    /// Returns `false` on timeout. A zero timeout is a single attempt.
    pub fn take<C: Clock + ?Sized>(&self, timeout_ms: u32, clock: &C) -> bool {
        if self.try_take() {
            return true;
        }
        if timeout_ms == 0 {
            return false;
        }
        let start = clock.now_ms();
        loop {
            clock.relax();
            if self.try_take() {
                return true;
            }
            if clock.elapsed_ms(start) >= u64::from(timeout_ms) {
                return false;
            }
        }
    }

    /// Return one unit.
    ///
    /// Returns `false` without changing the count if it is already at the
    /// ceiling.
    pub fn give(&self) -> bool {
        let mut current = self.count.load(Ordering::Acquire);
        while current < self.max {
            match self.count.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    /// Units currently available.
    #[inline]
    pub fn available(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StepClock;

    #[test]
    fn test_take_until_empty() {
        let sem = CountingSemaphore::new(2, 2);
        assert!(sem.try_take());
        assert!(sem.try_take());
        assert!(!sem.try_take());
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_give_is_capped() {
        let sem = CountingSemaphore::new(1, 2);
        assert!(sem.give());
        assert!(!sem.give());
        assert_eq!(sem.available(), 2);
    }

    #[test]
    fn test_initial_clamped_to_max() {
        let sem = CountingSemaphore::new(5, 3);
        assert_eq!(sem.available(), 3);
    }

    #[test]
    fn test_take_times_out() {
        let sem = CountingSemaphore::new(0, 1);
        let clock = StepClock::new(10);
        assert!(!sem.take(100, &clock));
        assert!(clock.now_ms() >= 100);
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_take_zero_timeout_is_one_attempt() {
        let sem = CountingSemaphore::new(0, 1);
        let clock = StepClock::new(10);
        assert!(!sem.take(0, &clock));
        assert_eq!(clock.now_ms(), 0);
    }
}
