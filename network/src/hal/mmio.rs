//! Memory-mapped register access.
//!
//! # Safety
//! - Base address must be a valid MMIO mapping of the controller
//! - Mapping must be device (non-cacheable, non-reorderable) memory
//! - Offsets must be 4-byte aligned

use core::ptr::{read_volatile, write_volatile};

use super::traits::Registers;

/// Register block at a fixed MMIO base.
#[derive(Debug)]
pub struct MmioRegisters {
    base: usize,
}

impl MmioRegisters {
    /// Wrap the controller's register window.
    ///
    /// # Safety
    /// `base` must stay mapped as device memory for the program lifetime and
    /// must not be aliased by another owner that writes the same registers.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// MMIO base address.
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    fn reg(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % 4 == 0, "unaligned register offset {:#x}", offset);
        (self.base + offset) as *mut u32
    }
}

impl Registers for MmioRegisters {
    #[inline]
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `new` requires a valid, exclusive device mapping.
        unsafe { read_volatile(self.reg(offset)) }
    }

    #[inline]
    fn write(&self, offset: usize, value: u32) {
        // SAFETY: `new` requires a valid, exclusive device mapping.
        unsafe { write_volatile(self.reg(offset), value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmio_roundtrip_on_plain_memory() {
        let mut window = [0u32; 8];
        let regs = unsafe { MmioRegisters::new(window.as_mut_ptr() as usize) };

        regs.write(0x04, 0xDEAD_BEEF);
        assert_eq!(regs.read(0x04), 0xDEAD_BEEF);
        assert_eq!(regs.write_flush(0x08, 7), 7);

        regs.modify(0x04, 0xFFFF_0000, 0x1);
        assert_eq!(regs.read(0x04), 0x0000_BEEF);
    }
}
