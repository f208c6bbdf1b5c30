//! Shared harness: a register file and DMA engine model for the GEM.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use morpheus_netif::hal::regs::{
    ISR, IXR_FRAMERX, IXR_TXCOMPL, RXCNT, RXSR, RXSR_FRAMERX, TXSR, TXSR_TXCOMPL,
};
use morpheus_netif::ring::descriptor::{RXBUF_EOF, RXBUF_NEW, RXBUF_SOF, TXBUF_USED};
use morpheus_netif::{
    BufferPool, CacheMaintenance, Clock, DmaBuffer, FrameChain, FrameSink, HeapBufferPool,
    LinkObserver, Netif, NetifConfig, PhyLink, PoolBuffer, Registers, Uncached,
};

// ═══════════════════════════════════════════════════════════════════════════
// CLOCKS
// ═══════════════════════════════════════════════════════════════════════════

/// Simulated time that advances by `step` every time a waiter backs off.
pub struct ManualClock {
    now: AtomicU64,
    step: u64,
}

impl ManualClock {
    pub fn new(step: u64) -> Self {
        Self {
            now: AtomicU64::new(0),
            step,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn relax(&self) {
        self.now.fetch_add(self.step, Ordering::SeqCst);
    }
}

/// Wall-clock time, for tests with real threads.
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn relax(&self) {
        std::thread::sleep(Duration::from_millis(1));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// REGISTERS
// ═══════════════════════════════════════════════════════════════════════════

const SPAN: usize = 0x200 / 4;

struct RegFile {
    values: [u32; SPAN],
    writes: Vec<(usize, u32)>,
}

/// GEM register file: status registers are write-1-to-clear and the frame
/// counter clears on read.
pub struct SimRegisters {
    file: Mutex<RegFile>,
}

impl SimRegisters {
    pub fn new() -> Self {
        Self {
            file: Mutex::new(RegFile {
                values: [0; SPAN],
                writes: Vec::new(),
            }),
        }
    }

    /// Hardware-side update: OR bits into a register.
    pub fn assert_bits(&self, offset: usize, bits: u32) {
        self.file.lock().unwrap().values[offset / 4] |= bits;
    }

    pub fn set(&self, offset: usize, value: u32) {
        self.file.lock().unwrap().values[offset / 4] = value;
    }

    pub fn get(&self, offset: usize) -> u32 {
        self.file.lock().unwrap().values[offset / 4]
    }

    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.file
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl Registers for SimRegisters {
    fn read(&self, offset: usize) -> u32 {
        let mut file = self.file.lock().unwrap();
        let value = file.values[offset / 4];
        if offset == RXCNT {
            file.values[offset / 4] = 0;
        }
        value
    }

    fn write(&self, offset: usize, value: u32) {
        let mut file = self.file.lock().unwrap();
        file.writes.push((offset, value));
        let slot = &mut file.values[offset / 4];
        match offset {
            ISR | RXSR | TXSR => *slot &= !value,
            _ => *slot = value,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════

/// Cache maintenance log: every range reports cacheable.
#[derive(Default)]
pub struct RecordingCache {
    pub ops: Mutex<Vec<(&'static str, usize, usize)>>,
}

impl CacheMaintenance for RecordingCache {
    fn is_cached(&self, _addr: usize, _len: usize) -> bool {
        true
    }

    fn invalidate(&self, addr: usize, len: usize) {
        self.ops.lock().unwrap().push(("invalidate", addr, len));
    }

    fn flush(&self, addr: usize, len: usize) {
        self.ops.lock().unwrap().push(("flush", addr, len));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DMA ENGINE MODEL
// ═══════════════════════════════════════════════════════════════════════════

/// The hardware side of both rings.
///
/// Tracks its own RX and TX positions the way the controller does, and
/// writes frames into whatever buffer the descriptor points at.
pub struct Gem {
    rx_pos: AtomicUsize,
    tx_pos: AtomicUsize,
}

impl Gem {
    pub fn new() -> Self {
        Self {
            rx_pos: AtomicUsize::new(0),
            tx_pos: AtomicUsize::new(0),
        }
    }

    /// Receive `frame` into the next RX slot.
    ///
    /// Returns `false` when that slot is still owned by software, which is
    /// where the real controller would report "buffer not available".
    pub fn receive<C, K>(
        &self,
        netif: &Netif<SimRegisters, C, &HeapBufferPool, K>,
        frame: &[u8],
    ) -> bool
    where
        C: CacheMaintenance,
        K: Clock,
    {
        let descs = netif.rx_descriptors();
        let idx = self.rx_pos.load(Ordering::SeqCst);
        let desc = &descs[idx];
        if desc.has_new_data() {
            return false;
        }
        let offset = netif.config().rx_data_offset();
        let ptr = netif
            .pool()
            .cpu_ptr_for_bus(desc.buffer_addr())
            .expect("rx descriptor points outside the pool");
        unsafe {
            std::ptr::copy_nonoverlapping(frame.as_ptr(), ptr.add(offset), frame.len());
        }
        desc.raw()
            .store_word1(RXBUF_SOF | RXBUF_EOF | frame.len() as u32);
        desc.raw().set_word0_bits(RXBUF_NEW);

        self.rx_pos.store((idx + 1) % descs.len(), Ordering::SeqCst);
        let regs = netif.regs();
        regs.assert_bits(RXSR, RXSR_FRAMERX);
        regs.assert_bits(ISR, IXR_FRAMERX);
        let count = regs.get(RXCNT);
        regs.set(RXCNT, count + 1);
        true
    }

    /// Transmit up to `max` queued frames. Returns the frames sent.
    pub fn transmit<C, K>(&self, netif: &Netif<SimRegisters, C, &HeapBufferPool, K>, max: usize) -> usize
    where
        C: CacheMaintenance,
        K: Clock,
    {
        let descs = netif.tx_descriptors();
        let mut sent = 0;
        while sent < max {
            let idx = self.tx_pos.load(Ordering::SeqCst);
            let desc = &descs[idx];
            if desc.is_used() {
                break;
            }
            desc.raw().set_word1_bits(TXBUF_USED);
            self.tx_pos.store((idx + 1) % descs.len(), Ordering::SeqCst);
            sent += 1;
        }
        if sent > 0 {
            netif.regs().assert_bits(TXSR, TXSR_TXCOMPL);
            netif.regs().assert_bits(ISR, IXR_TXCOMPL);
        }
        sent
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// IP STACK SIDE
// ═══════════════════════════════════════════════════════════════════════════

/// Consumer that keeps delivered frames, or refuses everything.
#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<PoolBuffer>,
    pub chains: usize,
    pub refuse: bool,
}

impl RecordingSink {
    /// Hand every kept frame back to `pool`.
    pub fn release_all(&mut self, pool: &HeapBufferPool) {
        for frame in self.frames.drain(..) {
            pool.release(frame);
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

#[derive(Default, Clone)]
pub struct RecordingObserver {
    pub changes: Arc<Mutex<Vec<bool>>>,
}

impl RecordingObserver {
    pub fn seen(&self) -> Vec<bool> {
        self.changes.lock().unwrap().clone()
    }
}

impl LinkObserver for RecordingObserver {
    fn on_link_change(&mut self, up: bool) {
        self.changes.lock().unwrap().push(up);
    }
}

/// PHY whose link state the test flips.
#[derive(Default, Clone)]
pub struct SharedPhy {
    pub up: Arc<AtomicBool>,
}

impl SharedPhy {
    pub fn set(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }
}

impl PhyLink for SharedPhy {
    fn link_is_up(&mut self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Small rings, 256-byte buffers, no TX wait.
pub fn small_config(rx: usize, tx: usize) -> NetifConfig {
    NetifConfig::new()
        .with_rx_desc_count(rx)
        .with_tx_desc_count(tx)
        .with_buffer_size(256)
        .with_tx_timeout_ms(0)
}

pub fn netif_with<K: Clock>(
    pool: &HeapBufferPool,
    clock: K,
    config: NetifConfig,
) -> Netif<SimRegisters, Uncached, &HeapBufferPool, K> {
    Netif::new(SimRegisters::new(), Uncached, pool, clock, config).expect("bring-up")
}

/// Pool buffer holding `frame`.
pub fn tx_frame(pool: &HeapBufferPool, frame: &[u8]) -> PoolBuffer {
    let mut buf = pool.allocate(frame.len(), 0).expect("pool exhausted");
    buf.copy_from(frame);
    buf
}

/// Take every free buffer out of the pool.
pub fn exhaust(pool: &HeapBufferPool) -> Vec<PoolBuffer> {
    let mut held = Vec::new();
    while let Some(buf) = pool.allocate(1, 0) {
        held.push(buf);
    }
    held
}

pub fn dma_addrs(frames: &[PoolBuffer]) -> Vec<u32> {
    frames.iter().map(|f| f.dma_addr()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// FRAMES
// ═══════════════════════════════════════════════════════════════════════════

pub mod frames {
    pub fn ethernet(ethertype: u16, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0xFF; 6];
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

    pub fn ipv4(protocol: u8, frag_offset: u16, payload: &[u8]) -> Vec<u8> {
        let total = (20 + payload.len()) as u16;
        let mut ip = vec![0x45, 0x00];
        ip.extend_from_slice(&total.to_be_bytes());
        ip.extend_from_slice(&[0x00, 0x01]);
        ip.extend_from_slice(&(frag_offset & 0x1FFF).to_be_bytes());
        ip.extend_from_slice(&[0x40, protocol, 0x00, 0x00]);
        ip.extend_from_slice(&[10, 0, 0, 2, 10, 0, 0, 1]);
        ip.extend_from_slice(payload);
        ethernet(0x0800, &ip)
    }

    pub fn udp(src: u16, dst: u16) -> Vec<u8> {
        udp_fragment(src, dst, 0)
    }

    pub fn udp_fragment(src: u16, dst: u16, frag_offset: u16) -> Vec<u8> {
        let mut udp = Vec::new();
        udp.extend_from_slice(&src.to_be_bytes());
        udp.extend_from_slice(&dst.to_be_bytes());
        udp.extend_from_slice(&16u16.to_be_bytes());
        udp.extend_from_slice(&[0x00, 0x00]);
        udp.extend_from_slice(b"payload!");
        ipv4(17, frag_offset, &udp)
    }
}
