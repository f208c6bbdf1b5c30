//! Fixed-size packet buffer pool.
//!
//! One contiguous, cache-line aligned region carved into equal buffers.
//! A free list hands out indices; a per-buffer state table catches a
//! buffer being returned twice or to the wrong pool. Both live behind one
//! `spin::Mutex`, held only for the list operation itself.

extern crate alloc;

use alloc::alloc::{alloc_zeroed, Layout};
use alloc::vec::Vec;

use log::{debug, error};
use spin::Mutex;

use crate::error::{NetifError, Result};
use crate::hal::cache::CACHE_LINE;
use crate::hal::{BufferPool, DmaBuffer};

/// Per-buffer state as seen by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferState {
    /// On the free list.
    Free,
    /// Handed out; owned by a ring or the IP stack.
    Loaned,
}

struct PoolState {
    free_list: Vec<u16>,
    states: Vec<BufferState>,
    counters: PoolCounters,
}

/// Pool bookkeeping totals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolCounters {
    /// Successful allocations.
    pub allocations: u64,
    /// Allocation requests that found the pool empty or the size too large.
    pub failures: u64,
    /// Buffers returned.
    pub releases: u64,
    /// Returns of a buffer that was already free.
    pub double_releases: u64,
    /// Returns of a buffer that does not belong to this pool.
    pub foreign_releases: u64,
}

/// Buffer handle from a [`HeapBufferPool`].
///
/// Owning the handle is owning the memory; it is deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct PoolBuffer {
    cpu_addr: usize,
    bus_addr: u32,
    capacity: usize,
    len: usize,
    index: u16,
    pool_base: usize,
}

impl PoolBuffer {
    /// Slot index within the owning pool.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Copy `data` to the start of the buffer and set the length.
    ///
    /// Returns the number of bytes copied, clamped to capacity.
    pub fn copy_from(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.capacity);
        self.set_len(n);
        self.as_mut_slice().copy_from_slice(&data[..n]);
        n
    }
}

impl DmaBuffer for PoolBuffer {
    #[inline]
    fn dma_addr(&self) -> u32 {
        self.bus_addr
    }

    #[inline]
    fn cpu_addr(&self) -> usize {
        self.cpu_addr
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn set_len(&mut self, len: usize) {
        self.len = len.min(self.capacity);
    }

    fn as_slice(&self) -> &[u8] {
        // SAFETY: the handle is the unique owner of `capacity` bytes at
        // `cpu_addr` for as long as it lives.
        unsafe { core::slice::from_raw_parts(self.cpu_addr as *const u8, self.len) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` makes the borrow exclusive.
        unsafe { core::slice::from_raw_parts_mut(self.cpu_addr as *mut u8, self.len) }
    }
}

/// Pool of equal-sized DMA buffers in one region.
pub struct HeapBufferPool {
    cpu_base: usize,
    bus_base: u32,
    buffer_size: usize,
    count: usize,
    state: Mutex<PoolState>,
}

impl HeapBufferPool {
    /// Allocate `count` buffers of at least `buffer_size` bytes from the heap.
    ///
    /// Buffers are rounded up to whole cache lines and aligned to one, so
    /// maintenance on one buffer never touches a neighbour. The heap is
    /// taken as identity mapped: the bus address is the low 32 bits of the
    /// CPU address.
    pub fn new(buffer_size: usize, count: usize) -> Result<Self> {
        if buffer_size == 0 || count == 0 || count > u16::MAX as usize {
            return Err(NetifError::InvalidConfig("pool size out of range"));
        }
        let stride = align_up(buffer_size, CACHE_LINE);
        let layout = stride
            .checked_mul(count)
            .and_then(|total| Layout::from_size_align(total, CACHE_LINE).ok())
            .ok_or(NetifError::InvalidConfig("pool region too large"))?;

        // SAFETY: non-zero size checked above. The region is never freed.
        let base = unsafe { alloc_zeroed(layout) };
        if base.is_null() {
            return Err(NetifError::OutOfBuffers { missing: count });
        }
        // SAFETY: fresh allocation of `stride * count` bytes.
        Ok(unsafe { Self::from_region(base, base as usize as u32, stride, count) })
    }

    /// Carve an existing DMA region into `count` buffers of `buffer_size`.
    ///
    /// # Safety
    /// - `cpu_base` must point to `buffer_size * count` bytes of DMA-capable
    ///   memory valid for the program lifetime and used by nothing else
    /// - `bus_base` must be the device-visible address of `cpu_base`
    /// - `count` must fit in `u16`
    pub unsafe fn from_region(cpu_base: *mut u8, bus_base: u32, buffer_size: usize, count: usize) -> Self {
        let mut free_list = Vec::with_capacity(count);
        // Hand out low indices first.
        free_list.extend((0..count as u16).rev());
        let mut states = Vec::with_capacity(count);
        states.resize(count, BufferState::Free);

        debug!(
            "buffer pool: {} x {} bytes at {:#x} (bus {:#010x})",
            count, buffer_size, cpu_base as usize, bus_base
        );

        Self {
            cpu_base: cpu_base as usize,
            bus_base,
            buffer_size,
            count,
            state: Mutex::new(PoolState {
                free_list,
                states,
                counters: PoolCounters::default(),
            }),
        }
    }

    /// Size of every buffer.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers currently free.
    pub fn available(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Total number of buffers.
    pub fn total(&self) -> usize {
        self.count
    }

    /// Number of buffers currently handed out.
    pub fn in_use(&self) -> usize {
        self.count - self.available()
    }

    /// Bookkeeping totals.
    pub fn counters(&self) -> PoolCounters {
        self.state.lock().counters
    }

    /// CPU pointer for a device-visible address inside the pool.
    ///
    /// Used to follow a descriptor's address field back to memory.
    pub fn cpu_ptr_for_bus(&self, bus: u32) -> Option<*mut u8> {
        let offset = bus.wrapping_sub(self.bus_base) as usize;
        if offset < self.buffer_size * self.count {
            Some((self.cpu_base + offset) as *mut u8)
        } else {
            None
        }
    }

    fn handle(&self, index: u16) -> PoolBuffer {
        let offset = index as usize * self.buffer_size;
        PoolBuffer {
            cpu_addr: self.cpu_base + offset,
            bus_addr: self.bus_base.wrapping_add(offset as u32),
            capacity: self.buffer_size,
            len: 0,
            index,
            pool_base: self.cpu_base,
        }
    }
}

impl BufferPool for HeapBufferPool {
    type Buffer = PoolBuffer;

    /// Take a free buffer. Never blocks: `timeout_ms` is not honoured.
    fn allocate(&self, min_size: usize, _timeout_ms: u32) -> Option<PoolBuffer> {
        let mut state = self.state.lock();
        if min_size > self.buffer_size {
            state.counters.failures += 1;
            return None;
        }
        let index = match state.free_list.pop() {
            Some(index) => index,
            None => {
                state.counters.failures += 1;
                return None;
            }
        };
        state.states[index as usize] = BufferState::Loaned;
        state.counters.allocations += 1;
        drop(state);
        Some(self.handle(index))
    }

    fn release(&self, buffer: PoolBuffer) {
        let mut state = self.state.lock();
        let idx = buffer.index as usize;
        if buffer.pool_base != self.cpu_base || idx >= self.count {
            state.counters.foreign_releases += 1;
            drop(state);
            error!("buffer pool: release of foreign buffer at {:#x}", buffer.cpu_addr);
            return;
        }
        if state.states[idx] == BufferState::Free {
            state.counters.double_releases += 1;
            drop(state);
            error!("buffer pool: buffer {} released twice", idx);
            return;
        }
        state.states[idx] = BufferState::Free;
        state.free_list.push(buffer.index);
        state.counters.releases += 1;
    }
}

#[inline]
const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
