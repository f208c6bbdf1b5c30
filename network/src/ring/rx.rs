//! GEM RX ring.
//!
//! Every slot holds a buffer at all times. A drained slot is re-armed with
//! either a fresh buffer from the pool or, when the pool is dry or the
//! frame was filtered, the buffer it already had. The ring is never left
//! with a hole the DMA engine could run into.
//!
//! # Reference
//! Zynq-7000 TRM, 16.3.7 (receive buffer list)

extern crate alloc;

use log::{debug, trace, warn};

use super::descriptor::{DescriptorTable, RxDescriptor};
use super::index;
use super::slots::SlotTable;
use super::FrameChain;
use crate::error::{NetifError, Result};
use crate::filter::{may_accept, FilterConfig};
use crate::hal::barriers::dma_rmb;
use crate::hal::regs::{NWCTRL, NWCTRL_RXEN, RXCNT};
use crate::hal::{BufferPool, CacheMaintenance, DmaBuffer, FrameSink, PortRegistry, Registers};
use crate::stats::NetifStats;

// ═══════════════════════════════════════════════════════════════════════════
// DRAIN RESULT
// ═══════════════════════════════════════════════════════════════════════════

/// What one drain pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Slots consumed and re-armed.
    pub scanned: usize,
    /// Frames the consumer accepted.
    pub delivered: usize,
    /// Frames dropped by the filter.
    pub filtered: usize,
    /// Accepted frames dropped for lack of a replacement buffer.
    pub no_buffer: usize,
    /// Frames released after the consumer refused them.
    pub lost: usize,
}

impl DrainOutcome {
    /// Whether the pass stopped because it went all the way round the ring.
    ///
    /// More filled slots may be waiting.
    pub fn ring_exhausted(&self, ring_len: usize) -> bool {
        self.scanned == ring_len
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RX RING
// ═══════════════════════════════════════════════════════════════════════════

/// Receive descriptor ring with its side buffer table.
pub struct RxRing<B> {
    descs: DescriptorTable<RxDescriptor>,
    slots: SlotTable<B>,
    /// Next slot to inspect.
    head: usize,
    /// Size requested from the pool for every buffer.
    buffer_size: usize,
    /// Bytes before the frame inside each buffer.
    data_offset: usize,
    /// Consecutive zero samples of the frame counter.
    idle_samples: u32,
}

impl<B: DmaBuffer> RxRing<B> {
    /// Populate every slot from `pool` and hand the whole ring to hardware.
    ///
    /// On failure every buffer already taken goes back to the pool.
    pub fn new<P, C>(
        descs: DescriptorTable<RxDescriptor>,
        pool: &P,
        cache: &C,
        buffer_size: usize,
        data_offset: usize,
    ) -> Result<Self>
    where
        P: BufferPool<Buffer = B> + ?Sized,
        C: CacheMaintenance + ?Sized,
    {
        let len = descs.len();
        let mut ring = Self {
            descs,
            slots: SlotTable::new(len),
            head: 0,
            buffer_size,
            data_offset,
            idle_samples: 0,
        };

        for idx in 0..len {
            let buffer = match pool.allocate(buffer_size, 0) {
                Some(buffer) => buffer,
                None => {
                    ring.release_all(pool);
                    return Err(NetifError::OutOfBuffers { missing: len - idx });
                }
            };
            if buffer.capacity() < buffer_size {
                let got = buffer.capacity();
                pool.release(buffer);
                ring.release_all(pool);
                return Err(NetifError::BufferTooSmall {
                    needed: buffer_size,
                    got,
                });
            }
            ring.arm_slot(idx, buffer, cache);
        }

        debug!("rx ring: {} descriptors at {:#010x}", len, ring.descs.bus_addr());
        Ok(ring)
    }

    /// Consume every filled slot from `head` and deliver accepted frames.
    ///
    /// [`Self::reap`] followed by [`deliver`]. Callers that keep the ring
    /// behind a lock should do the two steps separately and release the
    /// lock in between, so the consumer runs unlocked.
    #[allow(clippy::too_many_arguments)]
    pub fn drain<P, C, S, R>(
        &mut self,
        pool: &P,
        cache: &C,
        sink: &mut S,
        ports: &R,
        filter: &FilterConfig,
        linked: bool,
        stats: &NetifStats,
    ) -> DrainOutcome
    where
        P: BufferPool<Buffer = B> + ?Sized,
        C: CacheMaintenance + ?Sized,
        S: FrameSink<B> + ?Sized,
        R: PortRegistry + ?Sized,
    {
        let (mut outcome, queued) = self.reap(pool, cache, ports, filter, stats);
        deliver(queued, linked, pool, sink, stats, &mut outcome);
        outcome
    }

    /// Consume every filled slot from `head`, re-arm it, and return the
    /// accepted frames in arrival order.
    ///
    /// Never blocks: replacement buffers are requested with a zero timeout.
    /// At most one full turn of the ring is processed per call.
    pub fn reap<P, C, R>(
        &mut self,
        pool: &P,
        cache: &C,
        ports: &R,
        filter: &FilterConfig,
        stats: &NetifStats,
    ) -> (DrainOutcome, FrameChain<B>)
    where
        P: BufferPool<Buffer = B> + ?Sized,
        C: CacheMaintenance + ?Sized,
        R: PortRegistry + ?Sized,
    {
        let len = self.descs.len();
        let mut outcome = DrainOutcome::default();
        let mut queued = FrameChain::new();

        while outcome.scanned < len {
            let idx = self.head;
            let desc = self.descs.get(idx);
            if !desc.has_new_data() || !self.slots.is_populated(idx) {
                break;
            }
            // Status word and buffer bytes only after the new bit.
            dma_rmb();

            let frame_len = desc.frame_len();
            let mut filled = match self.slots.take(idx) {
                Some(buffer) => buffer,
                None => break,
            };

            let data_len = (self.data_offset + frame_len).min(filled.capacity());
            if cache.is_cached(filled.cpu_addr(), data_len) {
                cache.invalidate(filled.cpu_addr(), data_len);
            }
            filled.set_len(data_len);

            let accepted = {
                let frame = filled.as_slice().get(self.data_offset..).unwrap_or(&[]);
                may_accept(frame, ports, filter)
            };
            let fresh = pool.allocate(self.buffer_size, 0);

            let rearm_with = match (fresh, accepted) {
                (Some(fresh), true) => {
                    queued.push(filled);
                    fresh
                }
                (Some(fresh), false) => {
                    pool.release(fresh);
                    stats.inc_rx_filtered();
                    outcome.filtered += 1;
                    filled
                }
                (None, true) => {
                    stats.inc_rx_no_buffer();
                    outcome.no_buffer += 1;
                    trace!("rx: slot {} no buffer, frame of {} bytes dropped", idx, frame_len);
                    filled
                }
                (None, false) => {
                    stats.inc_rx_filtered();
                    outcome.filtered += 1;
                    filled
                }
            };
            self.arm_slot(idx, rearm_with, cache);

            self.head = index::next(idx, len);
            outcome.scanned += 1;
        }

        if outcome.no_buffer > 0 {
            warn!("rx: {} frame(s) dropped, buffer pool exhausted", outcome.no_buffer);
        }

        (outcome, queued)
    }

    /// Sample the frame counter and restart reception after two idle samples.
    ///
    /// The counter clears on read. Returns `true` when receive-enable was
    /// toggled.
    pub fn check_rx_stall<R: Registers + ?Sized>(&mut self, regs: &R, stats: &NetifStats) -> bool {
        let frames = regs.read(RXCNT);
        if frames != 0 {
            self.idle_samples = 0;
            return false;
        }

        self.idle_samples += 1;
        if self.idle_samples < 2 {
            return false;
        }

        self.idle_samples = 0;
        regs.modify(NWCTRL, NWCTRL_RXEN, 0);
        regs.modify(NWCTRL, 0, NWCTRL_RXEN);
        stats.inc_rx_stall_resets();
        debug!("rx: no frames for two samples, receive-enable toggled");
        true
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.descs.len()
    }

    /// Whether the ring has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// Next slot to inspect.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Descriptor table, in ring order.
    pub fn descriptors(&self) -> &'static [RxDescriptor] {
        self.descs.as_slice()
    }

    /// Bus address of the descriptor table.
    pub fn bus_addr(&self) -> u32 {
        self.descs.bus_addr()
    }

    /// Whether every slot has a buffer whose address matches its descriptor.
    pub fn is_fully_armed(&self) -> bool {
        (0..self.len()).all(|idx| match self.slots.get(idx) {
            Some(buffer) => self.descs.get(idx).buffer_addr() == buffer.dma_addr() & !0x3,
            None => false,
        })
    }

    /// Install `buffer` at `idx` and hand the slot to hardware.
    fn arm_slot<C: CacheMaintenance + ?Sized>(&mut self, idx: usize, buffer: B, cache: &C) {
        // Stale lines must not be written back over incoming DMA data.
        if cache.is_cached(buffer.cpu_addr(), buffer.capacity()) {
            cache.invalidate(buffer.cpu_addr(), buffer.capacity());
        }
        let mut buffer = buffer;
        buffer.set_len(0);
        let addr = buffer.dma_addr();
        let previous = self.slots.replace(idx, buffer);
        debug_assert!(previous.is_none(), "rx slot {} armed twice", idx);
        self.descs.get(idx).arm(addr, index::is_last(idx, self.descs.len()));
    }

    fn release_all<P: BufferPool<Buffer = B> + ?Sized>(&mut self, pool: &P) {
        for idx in 0..self.slots.len() {
            if let Some(buffer) = self.slots.take(idx) {
                pool.release(buffer);
            }
        }
    }
}

/// Hand frames reaped from the ring to `sink`.
///
/// One handoff for the whole chain when `linked`, otherwise one per frame.
/// A refused handoff releases its buffers to `pool` and counts one loss.
pub fn deliver<B, P, S>(
    queued: FrameChain<B>,
    linked: bool,
    pool: &P,
    sink: &mut S,
    stats: &NetifStats,
    outcome: &mut DrainOutcome,
) where
    P: BufferPool<Buffer = B> + ?Sized,
    S: FrameSink<B> + ?Sized,
{
    if queued.is_empty() {
        return;
    }
    if linked {
        hand_off(queued, pool, sink, stats, outcome);
    } else {
        for frame in queued {
            hand_off(FrameChain::single(frame), pool, sink, stats, outcome);
        }
    }
}

fn hand_off<B, P, S>(
    chain: FrameChain<B>,
    pool: &P,
    sink: &mut S,
    stats: &NetifStats,
    outcome: &mut DrainOutcome,
) where
    P: BufferPool<Buffer = B> + ?Sized,
    S: FrameSink<B> + ?Sized,
{
    let count = chain.len();
    match sink.deliver(chain) {
        Ok(()) => {
            stats.add_rx_delivered(count);
            outcome.delivered += count;
        }
        Err(refused) => {
            stats.inc_rx_handoff_lost();
            outcome.lost += count;
            for buffer in refused {
                pool.release(buffer);
            }
            debug!("rx: consumer refused {} frame(s), released", count);
        }
    }
}
