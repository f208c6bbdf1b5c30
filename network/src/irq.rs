//! Interrupt deferral bridge.
//!
//! The only code in the crate that runs in interrupt context. Each entry
//! point acknowledges the cause in hardware, records it in [`EventFlags`]
//! and wakes the deferred task. Nothing here allocates, logs, blocks or
//! walks a ring.
//!
//! ```text
//!   RX:  idle ──irq──> pending ──task takes flags──> idle
//!   TX:  idle ──irq──> pending ──task takes flags──> idle
//! ```
//!
//! Concurrent RX and TX entry is fine: flags are set with `fetch_or` and
//! the wake-up is a single atomic store.

use crate::hal::regs::{
    IXR_RX_MASK, IXR_TX_MASK, ISR, RXSR, RXSR_ERROR_MASK, TXSR, TXSR_ERROR_MASK,
};
use crate::hal::Registers;
use crate::sync::{EventFlags, TaskNotify, EVENT_RX, EVENT_RX_ERR, EVENT_TX, EVENT_TX_ERR};

/// Event flags plus task wake-up, shared by the ISR and the deferred task.
#[derive(Debug, Default)]
pub struct InterruptBridge {
    events: EventFlags,
    notify: TaskNotify,
}

impl InterruptBridge {
    /// Bridge with no events and no wake-up pending.
    pub const fn new() -> Self {
        Self {
            events: EventFlags::new(),
            notify: TaskNotify::new(),
        }
    }

    /// Receive-side interrupt.
    ///
    /// Clears the RX status bits that are set and reads the register back
    /// once so the clear lands before the handler returns. Returns the
    /// status that was cleared.
    #[inline]
    pub fn on_rx_interrupt<R: Registers + ?Sized>(&self, regs: &R) -> u32 {
        let status = regs.read(RXSR);
        regs.write_flush(RXSR, status);

        let mut bits = EVENT_RX;
        if status & RXSR_ERROR_MASK != 0 {
            bits |= EVENT_RX_ERR;
        }
        self.events.raise(bits);
        self.notify.notify();
        status
    }

    /// Transmit-side interrupt. Same contract as [`Self::on_rx_interrupt`].
    #[inline]
    pub fn on_tx_interrupt<R: Registers + ?Sized>(&self, regs: &R) -> u32 {
        let status = regs.read(TXSR);
        regs.write_flush(TXSR, status);

        let mut bits = EVENT_TX;
        if status & TXSR_ERROR_MASK != 0 {
            bits |= EVENT_TX_ERR;
        }
        self.events.raise(bits);
        self.notify.notify();
        status
    }

    /// Top-level handler for the controller's single interrupt line.
    ///
    /// Reads and clears the interrupt status register, then dispatches to
    /// the per-direction handlers. Returns the interrupt status.
    pub fn on_interrupt<R: Registers + ?Sized>(&self, regs: &R) -> u32 {
        let isr = regs.read(ISR);
        if isr == 0 {
            return 0;
        }
        regs.write_flush(ISR, isr);

        if isr & IXR_RX_MASK != 0 {
            self.on_rx_interrupt(regs);
        }
        if isr & IXR_TX_MASK != 0 {
            self.on_tx_interrupt(regs);
        }
        isr
    }

    /// Pending event flags.
    pub fn events(&self) -> &EventFlags {
        &self.events
    }

    /// Task wake-up.
    pub fn notifier(&self) -> &TaskNotify {
        &self.notify
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::regs::{IXR_FRAMERX, IXR_HRESPNOK, IXR_TXCOMPL, RXSR_FRAMERX, RXSR_RXOVR, TXSR_TXCOMPL};
    use crate::testutil::FakeRegisters;

    #[test]
    fn test_rx_interrupt_clears_with_readback() {
        let regs = FakeRegisters::new();
        regs.set(RXSR, RXSR_FRAMERX);
        let bridge = InterruptBridge::new();

        assert_eq!(bridge.on_rx_interrupt(&regs), RXSR_FRAMERX);
        assert_eq!(regs.writes_to(RXSR), [RXSR_FRAMERX]);
        // Initial read plus the read-back.
        assert_eq!(regs.reads_of(RXSR), 2);
        assert_eq!(regs.get(RXSR), 0);
        assert_eq!(bridge.events().take_all(), EVENT_RX);
        assert!(bridge.notifier().take());
    }

    #[test]
    fn test_error_bits_raise_error_flag() {
        let regs = FakeRegisters::new();
        regs.set(RXSR, RXSR_FRAMERX | RXSR_RXOVR);
        let bridge = InterruptBridge::new();
        bridge.on_rx_interrupt(&regs);
        assert_eq!(bridge.events().take_all(), EVENT_RX | EVENT_RX_ERR);
    }

    #[test]
    fn test_wakeups_coalesce() {
        let regs = FakeRegisters::new();
        let bridge = InterruptBridge::new();
        regs.set(TXSR, TXSR_TXCOMPL);
        bridge.on_tx_interrupt(&regs);
        regs.set(TXSR, TXSR_TXCOMPL);
        bridge.on_tx_interrupt(&regs);
        assert!(bridge.notifier().take());
        assert!(!bridge.notifier().take());
        assert_eq!(bridge.events().take_all(), EVENT_TX);
    }

    #[test]
    fn test_combined_dispatch() {
        let regs = FakeRegisters::new();
        let bridge = InterruptBridge::new();
        regs.set(ISR, IXR_FRAMERX | IXR_TXCOMPL);
        regs.set(RXSR, RXSR_FRAMERX);
        regs.set(TXSR, TXSR_TXCOMPL);

        assert_eq!(bridge.on_interrupt(&regs), IXR_FRAMERX | IXR_TXCOMPL);
        assert_eq!(regs.get(ISR), 0);
        assert_eq!(regs.get(RXSR), 0);
        assert_eq!(regs.get(TXSR), 0);
        assert_eq!(bridge.events().take_all(), EVENT_RX | EVENT_TX);
    }

    #[test]
    fn test_bus_error_dispatches_both_directions() {
        let regs = FakeRegisters::new();
        let bridge = InterruptBridge::new();
        regs.set(ISR, IXR_HRESPNOK);
        bridge.on_interrupt(&regs);
        assert_eq!(bridge.events().take_all(), EVENT_RX | EVENT_TX);
    }

    #[test]
    fn test_spurious_interrupt_is_ignored() {
        let regs = FakeRegisters::new();
        let bridge = InterruptBridge::new();
        assert_eq!(bridge.on_interrupt(&regs), 0);
        assert!(!bridge.notifier().is_pending());
    }
}
