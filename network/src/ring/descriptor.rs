//! GEM buffer descriptors.
//!
//! Descriptors live in memory the DMA engine reads and writes on its own.
//! Each word is therefore an atomic, and every access goes through an
//! accessor that names the direction of synchronisation it provides:
//!
//! - `load_*` (Acquire): pairs with the engine's write-back. Buffer data and
//!   the other word read afterwards are at least as new as the loaded value.
//! - `store_*` (Release): publication. Everything software wrote before
//!   (buffer contents, the other word) is visible to the engine no later
//!   than the stored value.
//!
//! # Layout
//! ```text
//!  RX  word0: [31:2] buffer address | [1] wrap | [0] new (hw sets)
//!      word1: [15] eof | [14] sof | [12:0] received length
//!  TX  word0: [31:0] buffer address
//!      word1: [31] used (hw sets) | [30] wrap | [15] last | [13:0] length
//! ```

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

// ═══════════════════════════════════════════════════════════════════════════
// BIT DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════════

/// RX word0: frame written, slot belongs to software.
pub const RXBUF_NEW: u32 = 1 << 0;
/// RX word0: last descriptor of the ring.
pub const RXBUF_WRAP: u32 = 1 << 1;
/// RX word0: buffer address bits.
pub const RXBUF_ADDR_MASK: u32 = 0xFFFF_FFFC;
/// RX word1: received length.
pub const RXBUF_LEN_MASK: u32 = 0x0000_1FFF;
/// RX word1: start of frame.
pub const RXBUF_SOF: u32 = 1 << 14;
/// RX word1: end of frame.
pub const RXBUF_EOF: u32 = 1 << 15;

/// TX word1: length to transmit.
pub const TXBUF_LEN_MASK: u32 = 0x0000_3FFF;
/// TX word1: last buffer of the frame.
pub const TXBUF_LAST: u32 = 1 << 15;
/// TX word1: last descriptor of the ring.
pub const TXBUF_WRAP: u32 = 1 << 30;
/// TX word1: slot belongs to software (set by hardware after transmit).
pub const TXBUF_USED: u32 = 1 << 31;

// ═══════════════════════════════════════════════════════════════════════════
// RAW WORD PAIR
// ═══════════════════════════════════════════════════════════════════════════

/// Two-word descriptor shared by the RX and TX formats.
#[repr(C, align(8))]
pub struct RawDescriptor {
    word0: AtomicU32,
    word1: AtomicU32,
}

impl RawDescriptor {
    /// Zeroed descriptor.
    pub const fn new() -> Self {
        Self {
            word0: AtomicU32::new(0),
            word1: AtomicU32::new(0),
        }
    }

    /// Acquire-load of word0.
    #[inline]
    pub fn load_word0(&self) -> u32 {
        self.word0.load(Ordering::Acquire)
    }

    /// Acquire-load of word1.
    #[inline]
    pub fn load_word1(&self) -> u32 {
        self.word1.load(Ordering::Acquire)
    }

    /// Release-store of word0.
    #[inline]
    pub fn store_word0(&self, value: u32) {
        self.word0.store(value, Ordering::Release)
    }

    /// Release-store of word1.
    #[inline]
    pub fn store_word1(&self, value: u32) {
        self.word1.store(value, Ordering::Release)
    }

    /// Atomically set bits in word0 (Release). Device side of the RX handoff.
    #[inline]
    pub fn set_word0_bits(&self, bits: u32) {
        self.word0.fetch_or(bits, Ordering::Release);
    }

    /// Atomically set bits in word1 (Release). Device side of the TX handoff.
    #[inline]
    pub fn set_word1_bits(&self, bits: u32) {
        self.word1.fetch_or(bits, Ordering::Release);
    }
}

impl Default for RawDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{w0: {:#010X}, w1: {:#010X}}}", self.load_word0(), self.load_word1())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RX DESCRIPTOR
// ═══════════════════════════════════════════════════════════════════════════

/// Receive descriptor.
#[repr(transparent)]
#[derive(Default, Debug)]
pub struct RxDescriptor(RawDescriptor);

impl RxDescriptor {
    /// Zeroed descriptor.
    pub const fn new() -> Self {
        Self(RawDescriptor::new())
    }

    /// Raw word access.
    pub fn raw(&self) -> &RawDescriptor {
        &self.0
    }

    /// Whether hardware has filled the slot (Acquire).
    ///
    /// When this returns `true` the status word and the buffer contents are
    /// visible to the caller.
    #[inline]
    pub fn has_new_data(&self) -> bool {
        self.0.load_word0() & RXBUF_NEW != 0
    }

    /// Received length from the status word.
    #[inline]
    pub fn frame_len(&self) -> usize {
        (self.0.load_word1() & RXBUF_LEN_MASK) as usize
    }

    /// Programmed buffer address, without control bits.
    #[inline]
    pub fn buffer_addr(&self) -> u32 {
        self.0.load_word0() & RXBUF_ADDR_MASK
    }

    /// Whether the wrap bit is set.
    #[inline]
    pub fn is_wrap(&self) -> bool {
        self.0.load_word0() & RXBUF_WRAP != 0
    }

    /// Hand the slot to hardware with `dma_addr` as its buffer.
    ///
    /// Clears the status word, then publishes the address with `new`
    /// cleared (Release), then reads the address back once so the write has
    /// reached the descriptor memory before the next slot is touched.
    #[inline]
    pub fn arm(&self, dma_addr: u32, wrap: bool) {
        let mut word0 = dma_addr & RXBUF_ADDR_MASK;
        if wrap {
            word0 |= RXBUF_WRAP;
        }
        self.0.store_word1(0);
        self.0.store_word0(word0);
        let _ = self.0.load_word0();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TX DESCRIPTOR
// ═══════════════════════════════════════════════════════════════════════════

/// Transmit descriptor.
#[repr(transparent)]
#[derive(Default, Debug)]
pub struct TxDescriptor(RawDescriptor);

impl TxDescriptor {
    /// Zeroed descriptor.
    pub const fn new() -> Self {
        Self(RawDescriptor::new())
    }

    /// Raw word access.
    pub fn raw(&self) -> &RawDescriptor {
        &self.0
    }

    /// Whether the slot belongs to software (Acquire).
    #[inline]
    pub fn is_used(&self) -> bool {
        self.0.load_word1() & TXBUF_USED != 0
    }

    /// Length field of the control word.
    #[inline]
    pub fn frame_len(&self) -> usize {
        (self.0.load_word1() & TXBUF_LEN_MASK) as usize
    }

    /// Programmed buffer address.
    #[inline]
    pub fn buffer_addr(&self) -> u32 {
        self.0.load_word0()
    }

    /// Whether the wrap bit is set.
    #[inline]
    pub fn is_wrap(&self) -> bool {
        self.0.load_word1() & TXBUF_WRAP != 0
    }

    /// Give one whole frame to hardware.
    ///
    /// The address is written first; the control word with `used` cleared
    /// is the ownership transfer and is published last (Release).
    #[inline]
    pub fn submit(&self, dma_addr: u32, len: usize, wrap: bool) {
        let mut control = TXBUF_LAST | (len as u32 & TXBUF_LEN_MASK);
        if wrap {
            control |= TXBUF_WRAP;
        }
        self.0.store_word0(dma_addr);
        self.0.store_word1(control);
    }

    /// Return the slot to its idle, software-owned state.
    ///
    /// Only `used` and, on the last slot, `wrap` remain set.
    #[inline]
    pub fn retire(&self, wrap: bool) {
        let mut control = TXBUF_USED;
        if wrap {
            control |= TXBUF_WRAP;
        }
        self.0.store_word1(control);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DESCRIPTOR TABLE
// ═══════════════════════════════════════════════════════════════════════════

/// Fixed array of descriptors in DMA-visible memory.
///
/// Rings are never torn down, so the table is `'static`.
pub struct DescriptorTable<D: 'static> {
    descs: &'static [D],
}

impl<D: Default + Sync + 'static> DescriptorTable<D> {
    /// Allocate `count` zeroed descriptors from the heap.
    ///
    /// Suitable when the heap is DMA-coherent (or uncached) on the target.
    pub fn allocate(count: usize) -> Self {
        let mut descs = Vec::with_capacity(count);
        descs.resize_with(count, D::default);
        Self {
            descs: Box::leak(descs.into_boxed_slice()),
        }
    }

    /// Use `count` descriptors at `base`, typically uncached memory.
    ///
    /// # Safety
    /// `base` must be 8-byte aligned, valid for `count` descriptors for the
    /// program lifetime and not used by anything else. Contents may be
    /// arbitrary; ring setup rewrites every word.
    pub unsafe fn from_raw(base: *mut D, count: usize) -> Self {
        Self {
            descs: core::slice::from_raw_parts(base, count),
        }
    }
}

impl<D: 'static> DescriptorTable<D> {
    /// Number of descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        self.descs.len()
    }

    /// Whether the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// Descriptor at `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> &'static D {
        &self.descs[idx]
    }

    /// All descriptors, in ring order.
    #[inline]
    pub fn as_slice(&self) -> &'static [D] {
        self.descs
    }

    /// Bus address of the first descriptor (identity mapped).
    #[inline]
    pub fn bus_addr(&self) -> u32 {
        self.descs.as_ptr() as usize as u32
    }
}
