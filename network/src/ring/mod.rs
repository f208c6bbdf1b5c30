//! Descriptor rings.
//!
//! # Ownership
//!
//! Every ring slot pairs a hardware descriptor with a side-table entry.
//! Buffers move between software and hardware only by moving the handle
//! into or out of the side table; the descriptor's ownership bit is written
//! after the move and after cache maintenance.
//!
//! ```text
//!            enqueue            used bit set          reclaim
//!  caller ──────────► TX slot ───────────────► TX slot ───────► pool
//!
//!            arm                new bit set           drain
//!  pool   ──────────► RX slot ───────────────► RX slot ───────► sink
//! ```

extern crate alloc;

pub mod descriptor;
pub mod index;
pub mod rx;
pub mod slots;
pub mod tx;

use alloc::vec::Vec;

pub use descriptor::{DescriptorTable, RxDescriptor, TxDescriptor};
pub use rx::{DrainOutcome, RxRing};
pub use slots::SlotTable;
pub use tx::TxRing;

// ═══════════════════════════════════════════════════════════════════════════
// FRAME CHAIN
// ═══════════════════════════════════════════════════════════════════════════

/// Received frames handed to the consumer in one step.
///
/// Holds one frame in per-frame delivery mode, or every frame from a drain
/// pass in linked mode.
pub struct FrameChain<B> {
    frames: Vec<B>,
}

impl<B> FrameChain<B> {
    /// Empty chain.
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Chain holding a single frame.
    pub fn single(frame: B) -> Self {
        let mut frames = Vec::with_capacity(1);
        frames.push(frame);
        Self { frames }
    }

    /// Append a frame.
    #[inline]
    pub fn push(&mut self, frame: B) {
        self.frames.push(frame);
    }

    /// Number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the chain is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate over the frames in arrival order.
    pub fn iter(&self) -> core::slice::Iter<'_, B> {
        self.frames.iter()
    }

    /// First frame.
    pub fn first(&self) -> Option<&B> {
        self.frames.first()
    }
}

impl<B> Default for FrameChain<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> IntoIterator for FrameChain<B> {
    type Item = B;
    type IntoIter = alloc::vec::IntoIter<B>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<B> core::fmt::Debug for FrameChain<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameChain").field("frames", &self.frames.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_preserves_order() {
        let mut chain = FrameChain::new();
        chain.push(1u8);
        chain.push(2);
        chain.push(3);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.first(), Some(&1));
        let collected: Vec<u8> = chain.into_iter().collect();
        assert_eq!(collected, [1, 2, 3]);
    }

    #[test]
    fn test_single() {
        let chain = FrameChain::single(9u8);
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
    }
}
