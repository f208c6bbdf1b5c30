//! Fakes shared by the unit tests.

extern crate alloc;

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;

use crate::dma::PoolBuffer;
use crate::hal::regs::{ISR, RXSR, TXSR};
use crate::hal::{Clock, FrameSink, Registers};
use crate::ring::FrameChain;

// ═══════════════════════════════════════════════════════════════════════════
// CLOCK
// ═══════════════════════════════════════════════════════════════════════════

/// Clock that only moves when someone waits on it.
pub struct StepClock {
    now: AtomicU64,
    step: u64,
}

impl StepClock {
    pub fn new(step: u64) -> Self {
        Self {
            now: AtomicU64::new(0),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn relax(&self) {
        self.now.fetch_add(self.step, Ordering::SeqCst);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// REGISTERS
// ═══════════════════════════════════════════════════════════════════════════

const SPAN: usize = 0x200 / 4;

struct RegState {
    values: [u32; SPAN],
    reads: [u32; SPAN],
    writes: Vec<(usize, u32)>,
}

/// Register file with write-1-to-clear status registers.
pub struct FakeRegisters {
    state: Mutex<RegState>,
}

impl FakeRegisters {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegState {
                values: [0; SPAN],
                reads: [0; SPAN],
                writes: Vec::new(),
            }),
        }
    }

    /// Set a register as hardware would, without recording a write.
    pub fn set(&self, offset: usize, value: u32) {
        self.state.lock().values[offset / 4] = value;
    }

    pub fn get(&self, offset: usize) -> u32 {
        self.state.lock().values[offset / 4]
    }

    /// Values written to `offset`, in order.
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn reads_of(&self, offset: usize) -> u32 {
        self.state.lock().reads[offset / 4]
    }
}

impl Registers for FakeRegisters {
    fn read(&self, offset: usize) -> u32 {
        let mut state = self.state.lock();
        state.reads[offset / 4] += 1;
        state.values[offset / 4]
    }

    fn write(&self, offset: usize, value: u32) {
        let mut state = self.state.lock();
        state.writes.push((offset, value));
        let slot = &mut state.values[offset / 4];
        match offset {
            ISR | RXSR | TXSR => *slot &= !value,
            _ => *slot = value,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SINK
// ═══════════════════════════════════════════════════════════════════════════

/// Consumer that keeps what it is given, or refuses everything.
#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<PoolBuffer>,
    pub chains: usize,
    pub refuse: bool,
}

impl RecordingSink {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

impl FrameSink<PoolBuffer> for RecordingSink {
    fn deliver(&mut self, chain: FrameChain<PoolBuffer>) -> Result<(), FrameChain<PoolBuffer>> {
        if self.refuse {
            return Err(chain);
        }
        self.chains += 1;
        self.frames.extend(chain);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FRAMES
// ═══════════════════════════════════════════════════════════════════════════

pub mod frames {
    use alloc::vec::Vec;

    pub fn ethernet(ethertype: u16, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(14 + payload.len());
        frame.extend_from_slice(&[0xFF; 6]);
        frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        frame.extend_from_slice(&ethertype.to_be_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    /// 42-byte ARP request.
    pub fn arp() -> Vec<u8> {
        let mut arp = [0u8; 28];
        arp[..8].copy_from_slice(&[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01]);
        ethernet(0x0806, &arp)
    }

    /// IPv4 packet with a 20-byte header.
    pub fn ipv4(protocol: u8, payload: &[u8]) -> Vec<u8> {
        let total = (20 + payload.len()) as u16;
        let mut ip = Vec::with_capacity(total as usize);
        ip.extend_from_slice(&[0x45, 0x00]);
        ip.extend_from_slice(&total.to_be_bytes());
        ip.extend_from_slice(&[0x00, 0x01, 0x40, 0x00, 0x40, protocol, 0x00, 0x00]);
        ip.extend_from_slice(&[192, 168, 1, 2, 192, 168, 1, 10]);
        ip.extend_from_slice(payload);
        ethernet(0x0800, &ip)
    }

    /// UDP datagram with a 4-byte payload.
    pub fn udp(src: u16, dst: u16) -> Vec<u8> {
        let mut udp = Vec::with_capacity(12);
        udp.extend_from_slice(&src.to_be_bytes());
        udp.extend_from_slice(&dst.to_be_bytes());
        udp.extend_from_slice(&12u16.to_be_bytes());
        udp.extend_from_slice(&[0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF]);
        ipv4(17, &udp)
    }
}
