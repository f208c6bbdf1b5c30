//! Per-interface context.
//!
//! A [`Netif`] owns everything one MAC needs: both rings, the interrupt
//! bridge, counters and the platform collaborators. Several interfaces can
//! coexist; nothing in the crate is global.
//!
//! # Bring-up sequence
//! 1. Validate configuration
//! 2. Populate every RX slot from the pool, wrap on the last
//! 3. Mark every TX slot software-owned, wrap on the last
//! 4. Program RX/TX queue base registers
//! 5. DMA configuration: INCR16 bursts, TX checksum offload
//! 6. Network configuration: RX buffer offset, RX checksum offload
//! 7. Clear stale status, enable interrupts
//! 8. Enable receive and transmit
//!
//! # Sharing
//! `Netif` is `Sync`. The interrupt handler calls [`Netif::on_interrupt`],
//! the IP task calls [`Netif::enqueue`], and the deferred task owns
//! everything else. RX state sits behind a lock only the deferred task
//! takes.
//!
//! # Reference
//! Zynq-7000 TRM, 16.3 (GEM programming model)

use core::sync::atomic::{AtomicBool, Ordering};

use log::info;
use spin::Mutex;

use crate::config::NetifConfig;
use crate::error::{EnqueueError, NetifError, Result};
use crate::hal::regs::{
    DMACR, DMACR_BLENGTH_MASK, DMACR_INCR16_AHB_BURST, DMACR_TCPCKSUM, IER, ISR, IXR_ALL_MASK,
    NWCFG, NWCFG_RXCHKSUMEN, NWCFG_RXOFFS_2, NWCFG_RXOFFS_MASK, NWCTRL, NWCTRL_RXEN, NWCTRL_TXEN,
    RXQBASE, RXSR, RXSR_ALL_MASK, TXQBASE, TXSR, TXSR_ALL_MASK,
};
use crate::hal::{BufferPool, CacheMaintenance, Clock, FrameSink, PortRegistry, Registers};
use crate::irq::InterruptBridge;
use crate::ring::{rx, DescriptorTable, DrainOutcome, RxDescriptor, RxRing, TxDescriptor, TxRing};
use crate::stats::{NetifStats, StatsSnapshot};

/// One Ethernet MAC with its DMA rings.
pub struct Netif<R, C, P, K>
where
    P: BufferPool,
{
    regs: R,
    cache: C,
    pool: P,
    clock: K,
    config: NetifConfig,
    rx: Mutex<RxRing<P::Buffer>>,
    tx: TxRing<P::Buffer>,
    bridge: InterruptBridge,
    stats: NetifStats,
    link_up: AtomicBool,
}

impl<R, C, P, K> Netif<R, C, P, K>
where
    R: Registers,
    C: CacheMaintenance,
    P: BufferPool,
    K: Clock,
{
    /// Bring up an interface with descriptor tables from the heap.
    ///
    /// The heap must be DMA-coherent (or uncached) for descriptors on this
    /// platform; use [`Netif::with_tables`] otherwise.
    pub fn new(regs: R, cache: C, pool: P, clock: K, config: NetifConfig) -> Result<Self> {
        config.validate()?;
        let rx_descs = DescriptorTable::allocate(config.rx_desc_count);
        let tx_descs = DescriptorTable::allocate(config.tx_desc_count);
        Self::with_tables(regs, cache, pool, clock, config, rx_descs, tx_descs)
    }

    /// Bring up an interface on caller-placed descriptor tables.
    pub fn with_tables(
        regs: R,
        cache: C,
        pool: P,
        clock: K,
        config: NetifConfig,
        rx_descs: DescriptorTable<RxDescriptor>,
        tx_descs: DescriptorTable<TxDescriptor>,
    ) -> Result<Self> {
        config.validate()?;
        if rx_descs.len() != config.rx_desc_count || tx_descs.len() != config.tx_desc_count {
            return Err(NetifError::InvalidConfig(
                "descriptor table size does not match configuration",
            ));
        }

        let rx = RxRing::new(
            rx_descs,
            &pool,
            &cache,
            config.buffer_size,
            config.rx_data_offset(),
        )?;
        let tx = TxRing::new(
            tx_descs,
            config.min_frame_len,
            config.buffer_size,
            config.tx_timeout_ms,
        );

        let netif = Self {
            regs,
            cache,
            pool,
            clock,
            config,
            rx: Mutex::new(rx),
            tx,
            bridge: InterruptBridge::new(),
            stats: NetifStats::new(),
            link_up: AtomicBool::new(false),
        };
        netif.start_dma();
        Ok(netif)
    }

    fn start_dma(&self) {
        let rx_base = self.rx.lock().bus_addr();
        self.regs.write_flush(RXQBASE, rx_base);
        self.regs.write_flush(TXQBASE, self.tx.bus_addr());

        let mut dmacr = DMACR_INCR16_AHB_BURST;
        if self.config.tx_checksum_offload {
            dmacr |= DMACR_TCPCKSUM;
        }
        self.regs.modify(DMACR, DMACR_BLENGTH_MASK | DMACR_TCPCKSUM, dmacr);

        let mut nwcfg = 0;
        if self.config.rx_buffer_offset {
            nwcfg |= NWCFG_RXOFFS_2;
        }
        if self.config.rx_checksum_offload {
            nwcfg |= NWCFG_RXCHKSUMEN;
        }
        self.regs.modify(NWCFG, NWCFG_RXOFFS_MASK | NWCFG_RXCHKSUMEN, nwcfg);

        self.regs.write_flush(RXSR, RXSR_ALL_MASK);
        self.regs.write_flush(TXSR, TXSR_ALL_MASK);
        self.regs.write_flush(ISR, IXR_ALL_MASK);
        self.regs.write_flush(IER, IXR_ALL_MASK);

        self.regs.modify(NWCTRL, 0, NWCTRL_RXEN | NWCTRL_TXEN);

        info!(
            "netif: up, rx {} x {} bytes, tx {}, rx ring {:#010x}, tx ring {:#010x}",
            self.config.rx_desc_count,
            self.config.buffer_size,
            self.config.tx_desc_count,
            rx_base,
            self.tx.bus_addr()
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // IP STACK SIDE
    // ═══════════════════════════════════════════════════════════════════════

    /// Queue a frame for transmission.
    ///
    /// On success the buffer belongs to the ring until `reclaim_tx` hands
    /// it back to the pool. On error it is returned and nothing changed.
    pub fn enqueue(&self, buffer: P::Buffer) -> core::result::Result<(), EnqueueError<P::Buffer>> {
        self.tx
            .enqueue(buffer, &self.regs, &self.cache, &self.clock, &self.stats)
    }

    /// Whether the link is considered up.
    pub fn link_up(&self) -> bool {
        self.link_up.load(Ordering::Acquire)
    }

    pub(crate) fn set_link_up(&self, up: bool) {
        self.link_up.store(up, Ordering::Release);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // INTERRUPT SIDE
    // ═══════════════════════════════════════════════════════════════════════

    /// Controller interrupt. Safe in interrupt context.
    #[inline]
    pub fn on_interrupt(&self) -> u32 {
        self.stats.inc_interrupts();
        self.bridge.on_interrupt(&self.regs)
    }

    /// Receive interrupt, for platforms that route it separately.
    #[inline]
    pub fn on_rx_interrupt(&self) -> u32 {
        self.stats.inc_interrupts();
        self.bridge.on_rx_interrupt(&self.regs)
    }

    /// Transmit interrupt, for platforms that route it separately.
    #[inline]
    pub fn on_tx_interrupt(&self) -> u32 {
        self.stats.inc_interrupts();
        self.bridge.on_tx_interrupt(&self.regs)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DEFERRED TASK SIDE
    // ═══════════════════════════════════════════════════════════════════════

    /// Drain the RX ring into `sink`. Returns what the pass did.
    ///
    /// The RX lock is released before `sink` runs, so the consumer may call
    /// back into this interface.
    pub fn drain_rx<S, Q>(&self, sink: &mut S, ports: &Q) -> DrainOutcome
    where
        S: FrameSink<P::Buffer> + ?Sized,
        Q: PortRegistry + ?Sized,
    {
        // Guard drops at the end of this statement.
        let (mut outcome, queued) = self.rx.lock().reap(
            &self.pool,
            &self.cache,
            ports,
            &self.config.filter,
            &self.stats,
        );
        rx::deliver(
            queued,
            self.config.linked_rx_delivery,
            &self.pool,
            sink,
            &self.stats,
            &mut outcome,
        );
        outcome
    }

    /// Return completed TX buffers to the pool. Returns slots freed.
    pub fn reclaim_tx(&self) -> usize {
        self.tx.reclaim(&self.pool, &self.stats)
    }

    /// Run one sample of the RX-stall watchdog.
    pub fn check_rx_stall(&self) -> bool {
        self.rx.lock().check_rx_stall(&self.regs, &self.stats)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // INSPECTION
    // ═══════════════════════════════════════════════════════════════════════

    /// Point-in-time copy of the counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn counters(&self) -> &NetifStats {
        &self.stats
    }

    /// TX descriptors currently lent to hardware.
    pub fn tx_in_flight(&self) -> usize {
        self.tx.in_flight()
    }

    /// TX slots an `enqueue` could take without waiting.
    pub fn tx_slots_available(&self) -> usize {
        self.tx.slots_available()
    }

    /// Next RX slot the drain will inspect.
    pub fn rx_head(&self) -> usize {
        self.rx.lock().head()
    }

    /// Whether every RX slot holds a buffer matching its descriptor.
    pub fn rx_fully_armed(&self) -> bool {
        self.rx.lock().is_fully_armed()
    }

    /// RX descriptors, for a DMA engine model or a debugger.
    pub fn rx_descriptors(&self) -> &'static [RxDescriptor] {
        self.rx.lock().descriptors()
    }

    /// TX descriptors, for a DMA engine model or a debugger.
    pub fn tx_descriptors(&self) -> &'static [TxDescriptor] {
        self.tx.descriptors()
    }

    /// Configuration the interface was brought up with.
    pub fn config(&self) -> &NetifConfig {
        &self.config
    }

    /// Interrupt-to-task bridge; the deferred task waits on it.
    pub fn bridge(&self) -> &InterruptBridge {
        &self.bridge
    }

    /// Controller registers.
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Buffer pool shared by both rings.
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Time base for the bounded waits.
    pub fn clock(&self) -> &K {
        &self.clock
    }
}
