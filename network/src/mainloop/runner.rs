//! Deferred processing task.
//!
//! The single consumer of both rings. Each pass:
//! 1. Wait for the interrupt bridge (bounded by `max_block_ms`)
//! 2. Take pending event flags, report bus errors
//! 3. Sample the RX-stall watchdog when its interval is due
//! 4. Drain RX into the IP stack
//! 5. Reclaim completed TX buffers
//! 6. Update link state

use log::{trace, warn};

use super::link::LinkMonitor;
use crate::hal::{BufferPool, CacheMaintenance, Clock, FrameSink, LinkObserver, PhyLink, PortRegistry, Registers};
use crate::netif::Netif;
use crate::ring::DrainOutcome;
use crate::sync::{EVENT_RX_ERR, EVENT_TX_ERR};

/// What one pass of the task did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    /// Woken by an interrupt rather than the timeout.
    pub woken: bool,
    /// Event flags taken this pass.
    pub events: u32,
    /// The stall watchdog toggled receive-enable.
    pub rx_stall_reset: bool,
    /// RX drain result.
    pub rx: DrainOutcome,
    /// TX slots reclaimed.
    pub tx_reclaimed: usize,
    /// Link transition, if any.
    pub link_change: Option<bool>,
}

/// Everything the task hands frames to or asks about the outside world.
pub struct TaskIo<S, Q, O, H> {
    /// IP stack input.
    pub sink: S,
    /// Bound UDP ports, for the acceptance filter.
    pub ports: Q,
    /// Link state listener.
    pub observer: O,
    /// PHY link query.
    pub phy: H,
}

/// Deferred processing task for one interface.
pub struct DeferredTask<'a, R, C, P, K, S, Q, O, H>
where
    P: BufferPool,
{
    netif: &'a Netif<R, C, P, K>,
    io: TaskIo<S, Q, O, H>,
    link: LinkMonitor,
    last_stall_check: u64,
}

impl<'a, R, C, P, K, S, Q, O, H> DeferredTask<'a, R, C, P, K, S, Q, O, H>
where
    R: Registers,
    C: CacheMaintenance,
    P: BufferPool,
    K: Clock,
    S: FrameSink<P::Buffer>,
    Q: PortRegistry,
    O: LinkObserver,
    H: PhyLink,
{
    /// Create the task. The initial link state is read from the PHY.
    pub fn new(netif: &'a Netif<R, C, P, K>, mut io: TaskIo<S, Q, O, H>) -> Self {
        let now = netif.clock().now_ms();
        let cfg = netif.config();
        let up = io.phy.link_is_up();
        netif.set_link_up(up);
        Self {
            netif,
            io,
            link: LinkMonitor::new(up, cfg.link_down_check_ms, cfg.link_up_check_ms, now),
            last_stall_check: now,
        }
    }

    /// One pass of the task loop.
    pub fn run_once(&mut self) -> PassReport {
        let netif = self.netif;
        let cfg = netif.config();
        let clock = netif.clock();
        let mut report = PassReport {
            woken: netif.bridge().notifier().wait(cfg.max_block_ms, clock),
            ..PassReport::default()
        };

        report.events = netif.bridge().events().take_all();
        if report.events & (EVENT_RX_ERR | EVENT_TX_ERR) != 0 {
            netif.counters().inc_bus_errors();
            warn!(
                "netif: bus error reported ({}{})",
                if report.events & EVENT_RX_ERR != 0 { "rx " } else { "" },
                if report.events & EVENT_TX_ERR != 0 { "tx" } else { "" }
            );
        }

        let now = clock.now_ms();
        if now.saturating_sub(self.last_stall_check) >= u64::from(cfg.rx_stall_check_ms) {
            self.last_stall_check = now;
            report.rx_stall_reset = netif.check_rx_stall();
        }

        report.rx = netif.drain_rx(&mut self.io.sink, &self.io.ports);
        if report.rx.ring_exhausted(cfg.rx_desc_count) {
            // More may be waiting; do not sleep on the next pass.
            netif.bridge().notifier().notify();
        }

        report.tx_reclaimed = netif.reclaim_tx();

        let now = clock.now_ms();
        if report.rx.scanned > 0 && self.link.on_frames_received(now, &mut self.io.observer) {
            report.link_change = Some(true);
        }
        if let Some(up) = self.link.poll(now, &mut self.io.phy, &mut self.io.observer) {
            report.link_change = Some(up);
        }
        netif.set_link_up(self.link.is_up());

        trace!(
            "netif: pass rx {} tx {} events {:#x}",
            report.rx.scanned,
            report.tx_reclaimed,
            report.events
        );
        report
    }

    /// Run forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_once();
        }
    }

    /// Current link belief.
    pub fn link(&self) -> &LinkMonitor {
        &self.link
    }

    /// The task's collaborators.
    pub fn io(&self) -> &TaskIo<S, Q, O, H> {
        &self.io
    }

    /// The task's collaborators, mutably.
    pub fn io_mut(&mut self) -> &mut TaskIo<S, Q, O, H> {
        &mut self.io
    }
}
