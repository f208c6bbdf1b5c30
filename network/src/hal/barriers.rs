//! Memory barriers for DMA ordering.
//!
//! The compiler fences keep the optimiser from moving descriptor accesses
//! across the barrier; the architecture instruction orders them for the
//! bus as well.
//!
//! # Reference
//! ARMv7-A ARM, A3.8.3 (memory barriers)

use core::sync::atomic::{fence, Ordering};

/// Data synchronisation barrier.
///
/// Every explicit memory access before it completes before any instruction
/// after it executes. Used around the TX doorbell.
#[inline]
pub fn dsb() {
    fence(Ordering::SeqCst);
    #[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
    unsafe {
        core::arch::asm!("dsb sy", options(nostack, preserves_flags));
    }
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::asm!("mfence", options(nostack, preserves_flags));
    }
}

/// Order descriptor reads after the ownership-bit read that precedes them.
#[inline]
pub fn dma_rmb() {
    fence(Ordering::Acquire);
}

/// Order buffer and address writes before the ownership-bit write after them.
#[inline]
pub fn dma_wmb() {
    fence(Ordering::Release);
}
