//! Interrupt-to-task signalling.
//!
//! [`TaskNotify`] is a binary notification: any number of `notify` calls
//! while one is pending collapse into a single wake-up. [`EventFlags`]
//! carries what happened; the task reads and clears it in one swap.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::hal::Clock;

// ═══════════════════════════════════════════════════════════════════════════
// EVENT FLAGS
// ═══════════════════════════════════════════════════════════════════════════

/// Frame received.
pub const EVENT_RX: u32 = 1 << 0;
/// Transmit completed.
pub const EVENT_TX: u32 = 1 << 1;
/// Receive-side bus error or overrun.
pub const EVENT_RX_ERR: u32 = 1 << 2;
/// Transmit-side bus error or underrun.
pub const EVENT_TX_ERR: u32 = 1 << 3;

/// Pending interrupt causes, set from interrupt context.
#[derive(Debug, Default)]
pub struct EventFlags(AtomicU32);

impl EventFlags {
    /// No events pending.
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Set `bits`. Interrupt safe.
    #[inline]
    pub fn raise(&self, bits: u32) {
        self.0.fetch_or(bits, Ordering::Release);
    }

    /// Read and clear every pending bit.
    #[inline]
    pub fn take_all(&self) -> u32 {
        self.0.swap(0, Ordering::AcqRel)
    }

    /// Pending bits, left set.
    #[inline]
    pub fn peek(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TASK NOTIFICATION
// ═══════════════════════════════════════════════════════════════════════════

/// Coalescing wake-up for the deferred task.
#[derive(Debug, Default)]
pub struct TaskNotify {
    pending: AtomicBool,
}

impl TaskNotify {
    /// Nothing pending.
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark a wake-up pending. Interrupt safe.
    #[inline]
    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume a pending wake-up without waiting.
    #[inline]
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Whether a wake-up is pending.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait up to `timeout_ms` for a wake-up and consume it.
    ///
    /// Returns `true` when woken by a notification, `false` on timeout.
    pub fn wait<C: Clock + ?Sized>(&self, timeout_ms: u32, clock: &C) -> bool {
        if self.take() {
            return true;
        }
        let start = clock.now_ms();
        while clock.elapsed_ms(start) < u64::from(timeout_ms) {
            clock.relax();
            if self.take() {
                return true;
            }
        }
        false
    }
}
