//! Side buffer table.
//!
//! The descriptor format is fixed by hardware and has no room for an owning
//! handle, so slot ownership is tracked here, indexed the same way as the
//! descriptor table. A `Some` entry is a buffer lent to the ring.

extern crate alloc;

use alloc::vec::Vec;

/// Per-slot owned buffer handles.
pub struct SlotTable<B> {
    slots: Vec<Option<B>>,
}

impl<B> SlotTable<B> {
    /// Table of `count` empty slots.
    pub fn new(count: usize) -> Self {
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, || None);
        Self { slots }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `idx` currently holds a buffer.
    #[inline]
    pub fn is_populated(&self, idx: usize) -> bool {
        self.slots[idx].is_some()
    }

    /// Borrow the buffer at `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&B> {
        self.slots[idx].as_ref()
    }

    /// Move `buffer` into an empty slot.
    ///
    /// An occupied slot is left alone and the buffer comes back as `Err`.
    #[inline]
    pub fn install(&mut self, idx: usize, buffer: B) -> Result<(), B> {
        match self.slots[idx] {
            Some(_) => Err(buffer),
            None => {
                self.slots[idx] = Some(buffer);
                Ok(())
            }
        }
    }

    /// Move the buffer out, leaving the slot empty.
    #[inline]
    pub fn take(&mut self, idx: usize) -> Option<B> {
        self.slots[idx].take()
    }

    /// Swap in `buffer`, returning the previous occupant.
    #[inline]
    pub fn replace(&mut self, idx: usize, buffer: B) -> Option<B> {
        self.slots[idx].replace(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_refuses_occupied_slot() {
        let mut table = SlotTable::new(2);
        assert!(table.install(0, 10u32).is_ok());
        assert_eq!(table.install(0, 11), Err(11));
        assert_eq!(table.get(0), Some(&10));
    }

    #[test]
    fn test_take_and_replace() {
        let mut table = SlotTable::new(3);
        assert_eq!(table.replace(1, 7u32), None);
        assert_eq!(table.replace(1, 8), Some(7));
        assert!(table.is_populated(1));
        assert_eq!(table.take(1), Some(8));
        assert!(!table.is_populated(1));
        assert_eq!(table.take(1), None);
    }
}
