//! GEM (Cadence Gigabit Ethernet MAC) register map.
//!
//! Only the registers touched by the ring core are listed. Offsets are
//! relative to the controller's MMIO base.
//!
//! # Reference
//! Zynq-7000 TRM, Appendix B.18 (gem)

// ═══════════════════════════════════════════════════════════════════════════
// REGISTER OFFSETS
// ═══════════════════════════════════════════════════════════════════════════

/// Network control.
pub const NWCTRL: usize = 0x000;
/// Network configuration.
pub const NWCFG: usize = 0x004;
/// DMA configuration.
pub const DMACR: usize = 0x010;
/// Transmit status.
pub const TXSR: usize = 0x014;
/// Receive queue base address.
pub const RXQBASE: usize = 0x018;
/// Transmit queue base address.
pub const TXQBASE: usize = 0x01C;
/// Receive status.
pub const RXSR: usize = 0x020;
/// Interrupt status.
pub const ISR: usize = 0x024;
/// Interrupt enable.
pub const IER: usize = 0x028;
/// Interrupt disable.
pub const IDR: usize = 0x02C;
/// Frames received counter (clear on read).
pub const RXCNT: usize = 0x158;

// ═══════════════════════════════════════════════════════════════════════════
// NWCTRL BITS
// ═══════════════════════════════════════════════════════════════════════════

/// Receive enable.
pub const NWCTRL_RXEN: u32 = 1 << 2;
/// Transmit enable.
pub const NWCTRL_TXEN: u32 = 1 << 3;
/// Start transmission (self-clearing doorbell).
pub const NWCTRL_STARTTX: u32 = 1 << 9;

// ═══════════════════════════════════════════════════════════════════════════
// NWCFG / DMACR BITS
// ═══════════════════════════════════════════════════════════════════════════

/// RX buffer offset field (bits 15:14).
pub const NWCFG_RXOFFS_MASK: u32 = 0x0000_C000;
/// RX buffer offset of 2 bytes, aligns the IP header on 4 bytes.
pub const NWCFG_RXOFFS_2: u32 = 0x0000_8000;
/// Receive checksum offload.
pub const NWCFG_RXCHKSUMEN: u32 = 1 << 24;

/// AHB burst length field.
pub const DMACR_BLENGTH_MASK: u32 = 0x0000_001F;
/// Attempt INCR16 AHB bursts.
pub const DMACR_INCR16_AHB_BURST: u32 = 0x0000_0010;
/// Transmit checksum generation offload.
pub const DMACR_TCPCKSUM: u32 = 1 << 11;

// ═══════════════════════════════════════════════════════════════════════════
// STATUS BITS (write 1 to clear)
// ═══════════════════════════════════════════════════════════════════════════

/// TX: a used bit was read in a descriptor.
pub const TXSR_USEDREAD: u32 = 1 << 0;
/// TX: collision.
pub const TXSR_COLLISION: u32 = 1 << 1;
/// TX: retry limit exceeded.
pub const TXSR_RETRY: u32 = 1 << 2;
/// TX: transmit in progress.
pub const TXSR_TXGO: u32 = 1 << 3;
/// TX: buffers exhausted mid frame.
pub const TXSR_BUFEXH: u32 = 1 << 4;
/// TX: frame transmitted.
pub const TXSR_TXCOMPL: u32 = 1 << 5;
/// TX: underrun.
pub const TXSR_URUN: u32 = 1 << 6;
/// TX: AHB bus error.
pub const TXSR_HRESPNOK: u32 = 1 << 8;
/// TX status bits that indicate a fault.
pub const TXSR_ERROR_MASK: u32 = TXSR_RETRY | TXSR_BUFEXH | TXSR_URUN | TXSR_HRESPNOK;
/// Every writable TX status bit.
pub const TXSR_ALL_MASK: u32 = TXSR_USEDREAD
    | TXSR_COLLISION
    | TXSR_RETRY
    | TXSR_BUFEXH
    | TXSR_TXCOMPL
    | TXSR_URUN
    | TXSR_HRESPNOK;

/// RX: buffer not available (used bit read).
pub const RXSR_BUFFNA: u32 = 1 << 0;
/// RX: frame received.
pub const RXSR_FRAMERX: u32 = 1 << 1;
/// RX: overrun.
pub const RXSR_RXOVR: u32 = 1 << 2;
/// RX: AHB bus error.
pub const RXSR_HRESPNOK: u32 = 1 << 3;
/// RX status bits that indicate a fault.
pub const RXSR_ERROR_MASK: u32 = RXSR_RXOVR | RXSR_HRESPNOK;
/// Every writable RX status bit.
pub const RXSR_ALL_MASK: u32 = RXSR_BUFFNA | RXSR_FRAMERX | RXSR_RXOVR | RXSR_HRESPNOK;

// ═══════════════════════════════════════════════════════════════════════════
// INTERRUPT BITS (ISR / IER / IDR)
// ═══════════════════════════════════════════════════════════════════════════

/// Frame received.
pub const IXR_FRAMERX: u32 = 1 << 1;
/// RX used bit read.
pub const IXR_RXUSED: u32 = 1 << 2;
/// TX used bit read.
pub const IXR_TXUSED: u32 = 1 << 3;
/// TX underrun.
pub const IXR_URUN: u32 = 1 << 4;
/// Retry limit exceeded.
pub const IXR_RETRY: u32 = 1 << 5;
/// TX frame corruption due to AHB error.
pub const IXR_TXEXH: u32 = 1 << 6;
/// Frame transmitted.
pub const IXR_TXCOMPL: u32 = 1 << 7;
/// RX overrun.
pub const IXR_RXOVR: u32 = 1 << 10;
/// AHB response not OK.
pub const IXR_HRESPNOK: u32 = 1 << 11;

/// Interrupt sources that concern the receive path.
pub const IXR_RX_MASK: u32 = IXR_FRAMERX | IXR_RXUSED | IXR_RXOVR | IXR_HRESPNOK;
/// Interrupt sources that concern the transmit path.
pub const IXR_TX_MASK: u32 = IXR_TXUSED | IXR_URUN | IXR_RETRY | IXR_TXEXH | IXR_TXCOMPL | IXR_HRESPNOK;
/// Every interrupt source the ring core services.
pub const IXR_ALL_MASK: u32 = IXR_RX_MASK | IXR_TX_MASK;

// ═══════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════

/// Default number of RX descriptors.
pub const DEFAULT_RX_DESC: usize = 32;
/// Default number of TX descriptors.
pub const DEFAULT_TX_DESC: usize = 32;
/// Bytes reserved in front of each network buffer by the IP stack.
pub const BUFFER_PADDING: usize = 10;
/// Default DMA buffer size (one MTU frame plus headroom).
pub const DEFAULT_BUFFER_SIZE: usize = 1536 - BUFFER_PADDING;
/// Smallest frame the TX path accepts (size of an ARP packet).
pub const MIN_FRAME_LEN: usize = 42;
