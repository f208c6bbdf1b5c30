//! GEM TX ring.
//!
//! Zero-copy: the caller's buffer itself is lent to hardware and comes
//! back to the pool on reclaim. Fire-and-forget; completion is collected
//! later by the deferred task.
//!
//! Two counts are kept. The semaphore bounds concurrent `enqueue` callers
//! and is what they block on. `in_flight`, under the ring lock, is the
//! exact number of installed frames and is what `reclaim` trusts: a caller
//! holding a semaphore unit may not have installed its buffer yet.
//!
//! # Reference
//! Zynq-7000 TRM, 16.3.8 (transmit buffer list)

use log::{debug, trace};
use spin::Mutex;

use super::descriptor::{DescriptorTable, TxDescriptor};
use super::index;
use super::slots::SlotTable;
use crate::error::{EnqueueError, RejectReason};
use crate::hal::barriers::{dma_wmb, dsb};
use crate::hal::regs::{NWCTRL, NWCTRL_STARTTX};
use crate::hal::{BufferPool, CacheMaintenance, Clock, DmaBuffer, Registers};
use crate::stats::NetifStats;
use crate::sync::CountingSemaphore;

struct TxState<B> {
    slots: SlotTable<B>,
    /// Next slot to hand to hardware.
    head: usize,
    /// Next slot to reclaim.
    tail: usize,
    /// Frames installed and not yet reclaimed.
    in_flight: usize,
}

impl<B> TxState<B> {
    /// `in_flight` must agree with the index pair; equal indices mean empty
    /// or full.
    #[inline]
    fn debug_check_occupancy(&self, ring_len: usize) {
        if self.head == self.tail {
            debug_assert!(
                self.in_flight == 0 || self.in_flight == ring_len,
                "tx: head == tail with {} in flight",
                self.in_flight
            );
        } else {
            debug_assert_eq!(
                self.in_flight,
                index::distance(self.tail, self.head, ring_len),
                "tx: in-flight count out of step with ring indices"
            );
        }
    }
}

/// Transmit descriptor ring.
pub struct TxRing<B> {
    descs: DescriptorTable<TxDescriptor>,
    state: Mutex<TxState<B>>,
    slots_free: CountingSemaphore,
    min_frame_len: usize,
    max_frame_len: usize,
    timeout_ms: u32,
}

impl<B: DmaBuffer> TxRing<B> {
    /// Build the ring with every slot software-owned.
    pub fn new(
        descs: DescriptorTable<TxDescriptor>,
        min_frame_len: usize,
        max_frame_len: usize,
        timeout_ms: u32,
    ) -> Self {
        let len = descs.len();
        for idx in 0..len {
            descs.get(idx).raw().store_word0(0);
            descs.get(idx).retire(index::is_last(idx, len));
        }
        debug!("tx ring: {} descriptors at {:#010x}", len, descs.bus_addr());

        Self {
            descs,
            state: Mutex::new(TxState {
                slots: SlotTable::new(len),
                head: 0,
                tail: 0,
                in_flight: 0,
            }),
            slots_free: CountingSemaphore::new(len, len),
            min_frame_len,
            max_frame_len,
            timeout_ms,
        }
    }

    /// Lend `buffer` to hardware for transmission of `buffer.len()` bytes.
    ///
    /// Blocks up to the configured timeout for a free slot. On any error
    /// the buffer is handed back untouched and the ring is unchanged.
    pub fn enqueue<R, C, K>(
        &self,
        buffer: B,
        regs: &R,
        cache: &C,
        clock: &K,
        stats: &NetifStats,
    ) -> Result<(), EnqueueError<B>>
    where
        R: Registers + ?Sized,
        C: CacheMaintenance + ?Sized,
        K: Clock + ?Sized,
    {
        let len = buffer.len();
        if len < self.min_frame_len {
            stats.inc_tx_rejected();
            return Err(EnqueueError::Rejected {
                buffer,
                reason: RejectReason::TooShort,
            });
        }
        if len > self.max_frame_len || len > buffer.capacity() {
            stats.inc_tx_rejected();
            return Err(EnqueueError::Rejected {
                buffer,
                reason: RejectReason::TooLong,
            });
        }

        // Never wait with the lock held.
        if !self.slots_free.take(self.timeout_ms, clock) {
            stats.inc_tx_backpressure();
            return Err(EnqueueError::Backpressure(buffer));
        }

        let ring_len = self.descs.len();
        let mut state = self.state.lock();
        let idx = state.head;
        let (cpu, addr) = (buffer.cpu_addr(), buffer.dma_addr());

        let installed = state.slots.install(idx, buffer);
        if let Err(buffer) = installed {
            // A semaphore unit always implies a free head slot.
            drop(state);
            self.slots_free.give();
            debug!("tx: slot {} unexpectedly occupied", idx);
            stats.inc_tx_backpressure();
            return Err(EnqueueError::Backpressure(buffer));
        }

        if cache.is_cached(cpu, len) {
            cache.flush(cpu, len);
        }
        dma_wmb();
        self.descs.get(idx).submit(addr, len, index::is_last(idx, ring_len));

        state.head = index::next(idx, ring_len);
        state.in_flight += 1;
        state.debug_check_occupancy(ring_len);

        dsb();
        regs.modify(NWCTRL, 0, NWCTRL_STARTTX);
        dsb();
        drop(state);

        stats.inc_tx_enqueued();
        trace!("tx: slot {} queued, {} bytes", idx, len);
        Ok(())
    }

    /// Return every transmitted buffer to `pool`, oldest first.
    ///
    /// Stops at the first slot hardware has not released. Returns the
    /// number of slots freed. Task context only.
    pub fn reclaim<P>(&self, pool: &P, stats: &NetifStats) -> usize
    where
        P: BufferPool<Buffer = B> + ?Sized,
    {
        let ring_len = self.descs.len();
        let mut state = self.state.lock();
        let mut freed = 0;

        while state.in_flight > 0 {
            let idx = state.tail;
            let desc = self.descs.get(idx);
            if !desc.is_used() {
                break;
            }
            if state.tail == state.head && state.in_flight != ring_len {
                break;
            }

            if let Some(buffer) = state.slots.take(idx) {
                pool.release(buffer);
            }
            desc.retire(index::is_last(idx, ring_len));

            state.tail = index::next(idx, ring_len);
            state.in_flight -= 1;
            freed += 1;
            self.slots_free.give();
        }
        state.debug_check_occupancy(ring_len);
        drop(state);

        if freed > 0 {
            stats.add_tx_reclaimed(freed);
            trace!("tx: reclaimed {} slot(s)", freed);
        }
        freed
    }

    /// Frames currently lent to hardware.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    /// Slots an `enqueue` could take right now.
    pub fn slots_available(&self) -> usize {
        self.slots_free.available()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.descs.len()
    }

    /// Whether the ring has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// `(head, tail)` indices.
    pub fn indices(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.head, state.tail)
    }

    /// Descriptor table, in ring order.
    pub fn descriptors(&self) -> &'static [TxDescriptor] {
        self.descs.as_slice()
    }

    /// Bus address of the descriptor table.
    pub fn bus_addr(&self) -> u32 {
        self.descs.bus_addr()
    }
}
