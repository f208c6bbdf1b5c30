//! Per-interface counters.
//!
//! Every drop path increments exactly one counter. Counters are plain
//! `Relaxed` atomics; `interrupts` is bumped from interrupt context.

use core::sync::atomic::{AtomicU64, Ordering};

/// Live counters.
#[derive(Debug, Default)]
pub struct NetifStats {
    rx_delivered: AtomicU64,
    rx_filtered: AtomicU64,
    rx_no_buffer: AtomicU64,
    rx_handoff_lost: AtomicU64,
    tx_enqueued: AtomicU64,
    tx_backpressure: AtomicU64,
    tx_rejected: AtomicU64,
    tx_reclaimed: AtomicU64,
    rx_stall_resets: AtomicU64,
    bus_errors: AtomicU64,
    interrupts: AtomicU64,
}

/// Point-in-time copy of [`NetifStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames accepted by the consumer.
    pub rx_delivered: u64,
    /// Frames dropped by the acceptance filter.
    pub rx_filtered: u64,
    /// Accepted frames dropped because the pool had no replacement buffer.
    pub rx_no_buffer: u64,
    /// Handoffs the consumer refused (one per refused chain).
    pub rx_handoff_lost: u64,
    pub tx_enqueued: u64,
    pub tx_backpressure: u64,
    pub tx_rejected: u64,
    pub tx_reclaimed: u64,
    /// Receive-enable toggles by the stall watchdog.
    pub rx_stall_resets: u64,
    /// Bus, overrun and underrun conditions seen by the task.
    pub bus_errors: u64,
    pub interrupts: u64,
}

macro_rules! counter {
    ($inc:ident, $field:ident) => {
        #[inline]
        pub(crate) fn $inc(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl NetifStats {
    pub const fn new() -> Self {
        Self {
            rx_delivered: AtomicU64::new(0),
            rx_filtered: AtomicU64::new(0),
            rx_no_buffer: AtomicU64::new(0),
            rx_handoff_lost: AtomicU64::new(0),
            tx_enqueued: AtomicU64::new(0),
            tx_backpressure: AtomicU64::new(0),
            tx_rejected: AtomicU64::new(0),
            tx_reclaimed: AtomicU64::new(0),
            rx_stall_resets: AtomicU64::new(0),
            bus_errors: AtomicU64::new(0),
            interrupts: AtomicU64::new(0),
        }
    }

    counter!(inc_rx_filtered, rx_filtered);
    counter!(inc_rx_no_buffer, rx_no_buffer);
    counter!(inc_rx_handoff_lost, rx_handoff_lost);
    counter!(inc_tx_enqueued, tx_enqueued);
    counter!(inc_tx_backpressure, tx_backpressure);
    counter!(inc_tx_rejected, tx_rejected);
    counter!(inc_rx_stall_resets, rx_stall_resets);
    counter!(inc_bus_errors, bus_errors);
    counter!(inc_interrupts, interrupts);

    #[inline]
    pub(crate) fn add_rx_delivered(&self, n: usize) {
        self.rx_delivered.fetch_add(n as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_tx_reclaimed(&self, n: usize) {
        self.tx_reclaimed.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Copy every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            rx_delivered: self.rx_delivered.load(Ordering::Relaxed),
            rx_filtered: self.rx_filtered.load(Ordering::Relaxed),
            rx_no_buffer: self.rx_no_buffer.load(Ordering::Relaxed),
            rx_handoff_lost: self.rx_handoff_lost.load(Ordering::Relaxed),
            tx_enqueued: self.tx_enqueued.load(Ordering::Relaxed),
            tx_backpressure: self.tx_backpressure.load(Ordering::Relaxed),
            tx_rejected: self.tx_rejected.load(Ordering::Relaxed),
            tx_reclaimed: self.tx_reclaimed.load(Ordering::Relaxed),
            rx_stall_resets: self.rx_stall_resets.load(Ordering::Relaxed),
            bus_errors: self.bus_errors.load(Ordering::Relaxed),
            interrupts: self.interrupts.load(Ordering::Relaxed),
        }
    }
}

impl core::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "rx {} (filtered {}, no-buf {}, lost {}) tx {} (reclaimed {}, busy {}, bad {}) stalls {} errors {}",
            self.rx_delivered,
            self.rx_filtered,
            self.rx_no_buffer,
            self.rx_handoff_lost,
            self.tx_enqueued,
            self.tx_reclaimed,
            self.tx_backpressure,
            self.tx_rejected,
            self.rx_stall_resets,
            self.bus_errors,
        )
    }
}
