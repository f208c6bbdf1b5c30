//! DMA buffer memory.
//!
//! The ring core only needs a [`BufferPool`](crate::hal::BufferPool); this
//! module provides the reference pool used on bare metal and in tests.
//!
//! # Buffer lifecycle
//! ```text
//!     FREE ──allocate()──> LOANED ──(ring / IP stack)──┐
//!       ▲                                              │
//!       └────────────────release()─────────────────────┘
//! ```

pub mod pool;

pub use pool::{HeapBufferPool, PoolBuffer, PoolCounters};
