//! Interface configuration.

use crate::error::{NetifError, Result};
use crate::filter::FilterConfig;
use crate::hal::regs::{DEFAULT_BUFFER_SIZE, DEFAULT_RX_DESC, DEFAULT_TX_DESC, MIN_FRAME_LEN};
use crate::ring::descriptor::{RXBUF_LEN_MASK, TXBUF_LEN_MASK};

/// Bytes the MAC skips at the start of an RX buffer when the offset is on.
pub const RX_BUFFER_OFFSET: usize = 2;

/// Configuration for one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetifConfig {
    /// RX descriptors (at least 2).
    pub rx_desc_count: usize,
    /// TX descriptors (at least 2).
    pub tx_desc_count: usize,
    /// Size requested from the pool for every RX buffer; also the TX
    /// length ceiling.
    pub buffer_size: usize,
    /// Smallest frame `enqueue` accepts.
    pub min_frame_len: usize,
    /// How long `enqueue` waits for a free TX slot.
    pub tx_timeout_ms: u32,
    /// Longest the deferred task sleeps between passes.
    pub max_block_ms: u32,
    /// PHY poll interval while the link is down.
    pub link_down_check_ms: u32,
    /// PHY poll interval while the link is up.
    pub link_up_check_ms: u32,
    /// RX-stall watchdog sampling interval.
    pub rx_stall_check_ms: u32,
    /// Deliver one chain per drain pass instead of one per frame.
    pub linked_rx_delivery: bool,
    /// Have the MAC start frames 2 bytes into RX buffers.
    pub rx_buffer_offset: bool,
    /// Verify IP/TCP/UDP checksums in hardware on receive.
    pub rx_checksum_offload: bool,
    /// Generate IP/TCP/UDP checksums in hardware on transmit.
    pub tx_checksum_offload: bool,
    /// Acceptance filter settings.
    pub filter: FilterConfig,
}

impl Default for NetifConfig {
    fn default() -> Self {
        Self {
            rx_desc_count: DEFAULT_RX_DESC,
            tx_desc_count: DEFAULT_TX_DESC,
            buffer_size: DEFAULT_BUFFER_SIZE,
            min_frame_len: MIN_FRAME_LEN,
            tx_timeout_ms: 5000,
            max_block_ms: 100,
            link_down_check_ms: 1000,
            link_up_check_ms: 15000,
            rx_stall_check_ms: 1000,
            linked_rx_delivery: true,
            rx_buffer_offset: false,
            rx_checksum_offload: true,
            tx_checksum_offload: true,
            filter: FilterConfig::default(),
        }
    }
}

impl NetifConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rx_desc_count(mut self, count: usize) -> Self {
        self.rx_desc_count = count;
        self
    }

    pub fn with_tx_desc_count(mut self, count: usize) -> Self {
        self.tx_desc_count = count;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn with_min_frame_len(mut self, len: usize) -> Self {
        self.min_frame_len = len;
        self
    }

    pub fn with_tx_timeout_ms(mut self, ms: u32) -> Self {
        self.tx_timeout_ms = ms;
        self
    }

    pub fn with_max_block_ms(mut self, ms: u32) -> Self {
        self.max_block_ms = ms;
        self
    }

    /// Set both PHY poll intervals.
    pub fn with_link_check_ms(mut self, down_ms: u32, up_ms: u32) -> Self {
        self.link_down_check_ms = down_ms;
        self.link_up_check_ms = up_ms;
        self
    }

    pub fn with_rx_stall_check_ms(mut self, ms: u32) -> Self {
        self.rx_stall_check_ms = ms;
        self
    }

    pub fn with_linked_rx_delivery(mut self, linked: bool) -> Self {
        self.linked_rx_delivery = linked;
        self
    }

    pub fn with_rx_buffer_offset(mut self, enabled: bool) -> Self {
        self.rx_buffer_offset = enabled;
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Bytes before the first frame byte in an RX buffer.
    #[inline]
    pub fn rx_data_offset(&self) -> usize {
        if self.rx_buffer_offset {
            RX_BUFFER_OFFSET
        } else {
            0
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.rx_desc_count < 2 {
            return Err(NetifError::InvalidConfig("rx_desc_count must be at least 2"));
        }
        if self.tx_desc_count < 2 {
            return Err(NetifError::InvalidConfig("tx_desc_count must be at least 2"));
        }
        if self.min_frame_len == 0 || self.min_frame_len > self.buffer_size {
            return Err(NetifError::InvalidConfig(
                "min_frame_len must be in 1..=buffer_size",
            ));
        }
        if self.buffer_size > TXBUF_LEN_MASK as usize
            || self.buffer_size > RXBUF_LEN_MASK as usize + self.rx_data_offset()
        {
            return Err(NetifError::InvalidConfig(
                "buffer_size exceeds descriptor length field",
            ));
        }
        if self.link_down_check_ms == 0 || self.link_up_check_ms == 0 {
            return Err(NetifError::InvalidConfig("link check intervals must be non-zero"));
        }
        if self.rx_stall_check_ms == 0 {
            return Err(NetifError::InvalidConfig("rx_stall_check_ms must be non-zero"));
        }
        Ok(())
    }
}
