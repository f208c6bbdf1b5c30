//! Network interface error types.

use core::fmt;

pub type Result<T> = core::result::Result<T, NetifError>;

/// Interface bring-up errors.
///
/// Ring-internal failures are never surfaced here; they end up as a
/// dropped frame and a counter increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetifError {
    /// Configuration failed validation.
    InvalidConfig(&'static str),
    /// Pool could not supply a buffer while populating the RX ring.
    OutOfBuffers {
        /// Buffers still needed when the pool ran dry.
        missing: usize,
    },
    /// Pool buffer smaller than the configured buffer size.
    BufferTooSmall {
        /// Configured buffer size.
        needed: usize,
        /// Capacity the pool returned.
        got: usize,
    },
}

impl fmt::Display for NetifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(why) => write!(f, "Invalid configuration: {}", why),
            Self::OutOfBuffers { missing } => {
                write!(f, "Out of buffers populating RX ring ({} missing)", missing)
            }
            Self::BufferTooSmall { needed, got } => {
                write!(f, "Pool buffer too small: need {}, got {}", needed, got)
            }
        }
    }
}

/// Why `enqueue` refused a frame outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Shorter than the minimum frame length.
    TooShort,
    /// Longer than the ring's buffer capacity.
    TooLong,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "frame too short"),
            Self::TooLong => write!(f, "frame too long"),
        }
    }
}

/// TX enqueue failure.
///
/// Every variant hands the buffer back: a failed enqueue never transfers
/// ownership, so the caller decides whether to retry or release it.
#[derive(PartialEq, Eq)]
pub enum EnqueueError<B> {
    /// No TX slot freed up within the timeout.
    Backpressure(B),
    /// Length out of range.
    Rejected {
        /// The caller's buffer, untouched.
        buffer: B,
        /// Why it was refused.
        reason: RejectReason,
    },
}

impl<B> EnqueueError<B> {
    /// Recover the buffer.
    pub fn into_buffer(self) -> B {
        match self {
            Self::Backpressure(buffer) => buffer,
            Self::Rejected { buffer, .. } => buffer,
        }
    }

    /// Whether this was a timeout rather than a rejection.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::Backpressure(_))
    }

    /// Rejection reason, if rejected.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Backpressure(_) => None,
            Self::Rejected { reason, .. } => Some(*reason),
        }
    }
}

impl<B> fmt::Debug for EnqueueError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backpressure(_) => write!(f, "Backpressure"),
            Self::Rejected { reason, .. } => write!(f, "Rejected({:?})", reason),
        }
    }
}

impl<B> fmt::Display for EnqueueError<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backpressure(_) => write!(f, "TX ring full: timed out waiting for a slot"),
            Self::Rejected { reason, .. } => write!(f, "TX frame rejected: {}", reason),
        }
    }
}
