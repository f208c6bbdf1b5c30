//! Synchronisation primitives shared between interrupt and task context.

pub mod notify;
pub mod semaphore;

pub use notify::{EventFlags, TaskNotify, EVENT_RX, EVENT_RX_ERR, EVENT_TX, EVENT_TX_ERR};
pub use semaphore::CountingSemaphore;
