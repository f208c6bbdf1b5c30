//! Ring index arithmetic.
//!
//! Ring sizes are not required to be powers of two, so wrapping is done by
//! comparison rather than masking.

/// Index after `idx` in a ring of `len` slots.
#[inline]
pub const fn next(idx: usize, len: usize) -> usize {
    if idx + 1 == len {
        0
    } else {
        idx + 1
    }
}

/// Slots from `tail` forward to `head`, `(head - tail) mod len`.
///
/// Ambiguous when the result is 0: the ring is either empty or full.
#[inline]
pub const fn distance(tail: usize, head: usize, len: usize) -> usize {
    if head >= tail {
        head - tail
    } else {
        len - tail + head
    }
}

/// Whether `idx` is the last slot, the one carrying the wrap bit.
#[inline]
pub const fn is_last(idx: usize, len: usize) -> bool {
    idx + 1 == len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps_at_len() {
        assert_eq!(next(0, 3), 1);
        assert_eq!(next(2, 3), 0);
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(0, 0, 4), 0);
        assert_eq!(distance(1, 3, 4), 2);
        assert_eq!(distance(3, 1, 4), 2);
        assert_eq!(distance(3, 0, 4), 1);
    }

    #[test]
    fn test_is_last() {
        assert!(is_last(3, 4));
        assert!(!is_last(0, 4));
    }
}
