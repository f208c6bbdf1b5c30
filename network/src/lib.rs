//! MorpheusX network interface core
//!
//! Zero-copy DMA descriptor rings and interrupt deferral for a Cadence GEM
//! Ethernet MAC. Buffers from a pool are lent to the DMA engine and handed
//! on to the IP stack without copying; ownership moves exactly once per
//! handoff.
//!
//! # Architecture
//! - `hal` - register map, MMIO, cache maintenance, barriers, collaborator traits
//! - `ring` - descriptor formats, RX and TX ring managers
//! - `filter` - cheap accept/reject decision on received frames
//! - `irq` - interrupt-context acknowledge and wake-up
//! - `sync` - semaphore and task notification
//! - `mainloop` - deferred processing task and link monitor
//! - `netif` - per-interface context tying it together
//! - `dma` - reference buffer pool
//!
//! # Usage
//!
//! ```ignore
//! let pool = HeapBufferPool::new(1526, 64)?;
//! let regs = unsafe { MmioRegisters::new(0xE000_B000) };
//! let netif = Netif::new(regs, Uncached, &pool, clock, NetifConfig::default())?;
//!
//! // interrupt handler
//! netif.on_interrupt();
//!
//! // deferred task
//! let mut task = DeferredTask::new(&netif, TaskIo { sink, ports, observer, phy });
//! task.run();
//! ```

#![no_std]

extern crate alloc;

pub mod config;
pub mod dma;
pub mod error;
pub mod filter;
pub mod hal;
pub mod irq;
pub mod mainloop;
pub mod netif;
pub mod ring;
pub mod stats;
pub mod sync;

#[cfg(test)]
mod testutil;

pub use config::NetifConfig;
pub use dma::{HeapBufferPool, PoolBuffer};
pub use error::{EnqueueError, NetifError, RejectReason, Result};
pub use filter::{may_accept, FilterConfig};
pub use hal::{
    BufferPool, CacheMaintenance, CachedWindow, Clock, DmaBuffer, FrameSink, LinkObserver,
    MmioRegisters, PhyLink, PortRegistry, Registers, Uncached,
};
pub use irq::InterruptBridge;
pub use mainloop::{DeferredTask, LinkMonitor, PassReport, TaskIo};
pub use netif::Netif;
pub use ring::{DrainOutcome, FrameChain};
pub use stats::{NetifStats, StatsSnapshot};
