//! Collaborator trait definitions.
//!
//! Everything the ring core needs from the outside world is expressed as a
//! trait here: register access, cache maintenance, time, the buffer pool,
//! the consumer handoff and the link observer. Each `Netif` is generic over
//! the platform pieces and receives the rest per call.

use crate::ring::FrameChain;

// ═══════════════════════════════════════════════════════════════════════════
// HARDWARE
// ═══════════════════════════════════════════════════════════════════════════

/// Typed access to the controller's fixed-offset registers.
///
/// Implementations must perform a single, non-elided access per call.
/// Both methods are called from interrupt context, so they must not block.
pub trait Registers: Sync {
    /// Read the 32-bit register at `offset`.
    fn read(&self, offset: usize) -> u32;

    /// Write the 32-bit register at `offset`.
    fn write(&self, offset: usize, value: u32);

    /// Write, then read the same register back once.
    ///
    /// Forces a posted write to complete before returning. Required after
    /// status-clearing writes and doorbells.
    #[inline]
    fn write_flush(&self, offset: usize, value: u32) -> u32 {
        self.write(offset, value);
        self.read(offset)
    }

    /// Read-modify-write helper: `reg = (reg & !clear) | set`, with read-back.
    #[inline]
    fn modify(&self, offset: usize, clear: u32, set: u32) -> u32 {
        let value = (self.read(offset) & !clear) | set;
        self.write_flush(offset, value)
    }
}

/// Data cache maintenance over CPU address ranges.
pub trait CacheMaintenance: Sync {
    /// Whether the range is mapped cacheable. Uncached ranges skip maintenance.
    fn is_cached(&self, addr: usize, len: usize) -> bool;

    /// Discard cache lines so the CPU observes what the DMA engine wrote.
    fn invalidate(&self, addr: usize, len: usize);

    /// Write dirty lines back so the DMA engine observes what the CPU wrote.
    fn flush(&self, addr: usize, len: usize);
}

/// Millisecond time base for the two bounded waits.
pub trait Clock: Sync {
    /// Monotonic milliseconds.
    fn now_ms(&self) -> u64;

    /// Back off while waiting. Cooperative schedulers yield here.
    #[inline]
    fn relax(&self) {
        core::hint::spin_loop();
    }

    /// Milliseconds elapsed since `since`.
    #[inline]
    fn elapsed_ms(&self, since: u64) -> u64 {
        self.now_ms().saturating_sub(since)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BUFFERS
// ═══════════════════════════════════════════════════════════════════════════

/// An owned, DMA-capable packet buffer.
///
/// Not `Clone`: a handle is the ownership of the memory behind it, so moving
/// the handle is moving the ownership.
pub trait DmaBuffer: Send {
    /// Device-visible address of the first byte.
    fn dma_addr(&self) -> u32;

    /// CPU address of the first byte, used for cache maintenance.
    fn cpu_addr(&self) -> usize;

    /// Usable bytes.
    fn capacity(&self) -> usize;

    /// Bytes of valid frame data.
    fn len(&self) -> usize;

    /// Set the valid length. Clamped to `capacity()`.
    fn set_len(&mut self, len: usize);

    /// Valid frame bytes.
    fn as_slice(&self) -> &[u8];

    /// Valid frame bytes, mutable.
    fn as_mut_slice(&mut self) -> &mut [u8];

    /// Whether no valid data is present.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Supplier of fixed-size packet buffers.
pub trait BufferPool: Sync {
    /// Buffer handle type.
    type Buffer: DmaBuffer;

    /// Obtain a buffer of at least `min_size` bytes.
    ///
    /// Blocks at most `timeout_ms`; the ring core always passes 0 from
    /// the drain path.
    fn allocate(&self, min_size: usize, timeout_ms: u32) -> Option<Self::Buffer>;

    /// Return a buffer. Called exactly once per allocated buffer.
    fn release(&self, buffer: Self::Buffer);
}

// Shared collaborators: one pool or clock can serve several interfaces.

impl<T: Registers + ?Sized> Registers for &T {
    #[inline]
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    #[inline]
    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }
}

impl<T: CacheMaintenance + ?Sized> CacheMaintenance for &T {
    fn is_cached(&self, addr: usize, len: usize) -> bool {
        (**self).is_cached(addr, len)
    }

    fn invalidate(&self, addr: usize, len: usize) {
        (**self).invalidate(addr, len)
    }

    fn flush(&self, addr: usize, len: usize) {
        (**self).flush(addr, len)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn relax(&self) {
        (**self).relax()
    }
}

impl<T: BufferPool + ?Sized> BufferPool for &T {
    type Buffer = T::Buffer;

    fn allocate(&self, min_size: usize, timeout_ms: u32) -> Option<Self::Buffer> {
        (**self).allocate(min_size, timeout_ms)
    }

    fn release(&self, buffer: Self::Buffer) {
        (**self).release(buffer)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CONSUMERS
// ═══════════════════════════════════════════════════════════════════════════

/// Consumer handoff into the IP stack.
pub trait FrameSink<B> {
    /// Hand over a chain of received frames.
    ///
    /// On rejection the chain comes back so the ring can release it.
    /// Called with no ring lock held.
    fn deliver(&mut self, frames: FrameChain<B>) -> Result<(), FrameChain<B>>;
}

/// Notified when the physical link changes state. Never on steady state.
pub trait LinkObserver {
    /// The link went up (`true`) or down (`false`).
    fn on_link_change(&mut self, up: bool);
}

/// Physical link query, backed by the PHY driver.
pub trait PhyLink {
    /// Current link state as reported by the PHY.
    fn link_is_up(&mut self) -> bool;
}

/// Registry of UDP ports with a bound listener.
pub trait PortRegistry {
    /// Whether a socket is bound to `port` (host byte order).
    fn has_udp_listener(&self, port: u16) -> bool;
}

impl PortRegistry for [u16] {
    fn has_udp_listener(&self, port: u16) -> bool {
        self.contains(&port)
    }
}

impl<const N: usize> PortRegistry for [u16; N] {
    fn has_udp_listener(&self, port: u16) -> bool {
        self.contains(&port)
    }
}

impl<T: PortRegistry + ?Sized> PortRegistry for &T {
    fn has_udp_listener(&self, port: u16) -> bool {
        (**self).has_udp_listener(port)
    }
}
