//! Data cache maintenance.
//!
//! The ring core asks `is_cached` before every maintenance call, so
//! platforms that place network buffers in uncached memory pay nothing.
//!
//! # Reference
//! ARMv7-A ARM, B2.2.7 (cache maintenance by MVA)

use super::traits::CacheMaintenance;

/// Cache line size of the Cortex-A9 L1 data cache.
pub const CACHE_LINE: usize = 32;

/// Platform where every DMA buffer lives in uncached memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct Uncached;

impl CacheMaintenance for Uncached {
    #[inline]
    fn is_cached(&self, _addr: usize, _len: usize) -> bool {
        false
    }

    #[inline]
    fn invalidate(&self, _addr: usize, _len: usize) {}

    #[inline]
    fn flush(&self, _addr: usize, _len: usize) {}
}

/// Cacheable window `[start, end)` maintained with by-MVA operations.
///
/// Addresses outside the window are treated as uncached.
#[derive(Debug, Clone, Copy)]
pub struct CachedWindow {
    start: usize,
    end: usize,
}

impl CachedWindow {
    /// Treat `[start, start + len)` as cacheable.
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, end: start + len }
    }
}

impl CacheMaintenance for CachedWindow {
    fn is_cached(&self, addr: usize, len: usize) -> bool {
        addr >= self.start && addr.saturating_add(len) <= self.end
    }

    fn invalidate(&self, addr: usize, len: usize) {
        for line in lines(addr, len) {
            dcache_invalidate_line(line);
        }
        super::barriers::dsb();
    }

    fn flush(&self, addr: usize, len: usize) {
        for line in lines(addr, len) {
            dcache_clean_line(line);
        }
        super::barriers::dsb();
    }
}

/// Line-aligned addresses covering `[addr, addr + len)`.
fn lines(addr: usize, len: usize) -> impl Iterator<Item = usize> {
    let first = addr & !(CACHE_LINE - 1);
    let end = addr + len;
    (first..end).step_by(CACHE_LINE)
}

#[cfg(target_arch = "arm")]
#[inline]
fn dcache_invalidate_line(addr: usize) {
    // DCIMVAC
    unsafe {
        core::arch::asm!("mcr p15, 0, {0}, c7, c6, 1", in(reg) addr, options(nostack, preserves_flags));
    }
}

#[cfg(target_arch = "arm")]
#[inline]
fn dcache_clean_line(addr: usize) {
    // DCCMVAC
    unsafe {
        core::arch::asm!("mcr p15, 0, {0}, c7, c10, 1", in(reg) addr, options(nostack, preserves_flags));
    }
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn dcache_invalidate_line(addr: usize) {
    unsafe {
        core::arch::asm!("dc ivac, {0}", in(reg) addr, options(nostack, preserves_flags));
    }
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn dcache_clean_line(addr: usize) {
    unsafe {
        core::arch::asm!("dc cvac, {0}", in(reg) addr, options(nostack, preserves_flags));
    }
}

// Coherent DMA on other targets: nothing to do per line.
#[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
#[inline]
fn dcache_invalidate_line(_addr: usize) {}

#[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
#[inline]
fn dcache_clean_line(_addr: usize) {}
