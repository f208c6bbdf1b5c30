//! Deferred processing.
//!
//! - `runner` - the per-interface task loop
//! - `link` - PHY poll timers and link state

pub mod link;
pub mod runner;

pub use link::LinkMonitor;
pub use runner::{DeferredTask, PassReport, TaskIo};
