//! Hardware abstraction layer.
//!
//! Register map, register access, cache maintenance, barriers and the
//! collaborator traits the ring core is generic over.

pub mod barriers;
pub mod cache;
pub mod mmio;
pub mod regs;
pub mod traits;

pub use cache::{CachedWindow, Uncached};
pub use mmio::MmioRegisters;
pub use traits::{
    BufferPool, CacheMaintenance, Clock, DmaBuffer, FrameSink, LinkObserver, PhyLink,
    PortRegistry, Registers,
};
