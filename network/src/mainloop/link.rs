//! Link state tracking for the deferred task.
//!
//! Two poll intervals: short while the link is down so it is noticed
//! coming up quickly, long while it is up. Received traffic counts as
//! proof of a live link and short-circuits the poll.

use log::info;

use crate::hal::{LinkObserver, PhyLink};

/// PHY poll scheduler and link state.
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    up: bool,
    down_check_ms: u64,
    up_check_ms: u64,
    last_check: u64,
}

impl LinkMonitor {
    /// Start in state `up`, with the active timer running from `now`.
    pub fn new(up: bool, down_check_ms: u32, up_check_ms: u32, now: u64) -> Self {
        Self {
            up,
            down_check_ms: u64::from(down_check_ms),
            up_check_ms: u64::from(up_check_ms),
            last_check: now,
        }
    }

    /// Current belief about the link.
    pub fn is_up(&self) -> bool {
        self.up
    }

    /// Poll interval for the current state.
    pub fn interval_ms(&self) -> u64 {
        if self.up {
            self.up_check_ms
        } else {
            self.down_check_ms
        }
    }

    /// Frames arrived: the link is up. Restarts the slow timer.
    ///
    /// Returns `true` if this was a transition.
    pub fn on_frames_received<O: LinkObserver + ?Sized>(&mut self, now: u64, observer: &mut O) -> bool {
        self.last_check = now;
        if self.up {
            return false;
        }
        self.up = true;
        info!("link: up (traffic received)");
        observer.on_link_change(true);
        true
    }

    /// Query the PHY if the active interval has elapsed.
    ///
    /// Returns the new state on a transition.
    pub fn poll<P, O>(&mut self, now: u64, phy: &mut P, observer: &mut O) -> Option<bool>
    where
        P: PhyLink + ?Sized,
        O: LinkObserver + ?Sized,
    {
        if now.saturating_sub(self.last_check) < self.interval_ms() {
            return None;
        }
        self.last_check = now;

        let up = phy.link_is_up();
        if up == self.up {
            return None;
        }
        self.up = up;
        info!("link: {}", if up { "up" } else { "down" });
        observer.on_link_change(up);
        Some(up)
    }
}
