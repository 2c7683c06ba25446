//! Testing utilities and mock hardware
//!
//! Fakes for the capability traits so the sequencer, the framer and the
//! application API can be driven on the host. Each fake is a cheap handle
//! around shared state: the test keeps one clone for scripting and
//! inspection, the engine owns another.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec;
use std::vec::Vec;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use crate::driver::engine::{Engine, Peripherals};
use crate::hal::{DmaChannel, FifoMode, Timer, TxDescriptor, UartPort};
use crate::internal::register::uart::{
    IIR_IID_NONE, IIR_IID_RD, IIR_IID_TIME_OUT, LSR_BI, LSR_DR, LSR_TEMT, LSR_THRE, USR_BUSY,
    USR_RFNE, USR_TFE, USR_TFNF,
};
use crate::rdm;

// =============================================================================
// Fake UART
// =============================================================================

#[derive(Default)]
struct UartInner {
    rx: VecDeque<u8>,
    /// Break flag, cleared when LSR is read
    break_pending: bool,
    busy: bool,
    /// Reads left before `busy` drops
    busy_reads: usize,
    timeout: bool,
    line_break: bool,
    break_log: Vec<bool>,
    written: Vec<u8>,
    fifo_mode: FifoMode,
    fifo_mode_writes: usize,
}

/// Fake UART with a scripted receive FIFO.
///
/// The transmitter is always empty; written bytes are captured.
#[derive(Clone, Default)]
pub struct FakeUart {
    inner: Rc<RefCell<UartInner>>,
}

impl FakeUart {
    /// Flag a break and queue the break character
    pub fn push_break(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.break_pending = true;
        inner.rx.push_back(0x00);
    }

    pub fn push_bytes(&self, bytes: &[u8]) {
        self.inner.borrow_mut().rx.extend(bytes.iter().copied());
    }

    pub fn set_busy(&self, busy: bool) {
        self.inner.borrow_mut().busy = busy;
    }

    /// Stay busy for the next `reads` byte reads
    pub fn set_busy_reads(&self, reads: usize) {
        self.inner.borrow_mut().busy_reads = reads;
    }

    pub fn set_timeout(&self, timeout: bool) {
        self.inner.borrow_mut().timeout = timeout;
    }

    pub fn busy(&self) -> bool {
        let inner = self.inner.borrow();
        inner.busy || inner.busy_reads > 0
    }

    pub fn fifo_mode(&self) -> FifoMode {
        self.inner.borrow().fifo_mode
    }

    pub fn fifo_mode_writes(&self) -> usize {
        self.inner.borrow().fifo_mode_writes
    }

    pub fn line_break(&self) -> bool {
        self.inner.borrow().line_break
    }

    /// Every break on/off request, in order
    pub fn break_log(&self) -> Vec<bool> {
        self.inner.borrow().break_log.clone()
    }

    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    pub fn rx_pending(&self) -> usize {
        self.inner.borrow().rx.len()
    }
}

impl UartPort for FakeUart {
    fn set_line_break(&self, enable: bool) {
        let mut inner = self.inner.borrow_mut();
        inner.line_break = enable;
        inner.break_log.push(enable);
    }

    fn write_byte(&self, byte: u8) {
        self.inner.borrow_mut().written.push(byte);
    }

    fn read_byte(&self) -> u8 {
        let mut inner = self.inner.borrow_mut();
        inner.busy_reads = inner.busy_reads.saturating_sub(1);
        inner.rx.pop_front().unwrap_or(0)
    }

    fn line_status_raw(&self) -> u32 {
        let mut inner = self.inner.borrow_mut();
        let mut lsr = LSR_THRE | LSR_TEMT;
        if !inner.rx.is_empty() {
            lsr |= LSR_DR;
        }
        if core::mem::take(&mut inner.break_pending) {
            lsr |= LSR_BI;
        }
        lsr
    }

    fn uart_status_raw(&self) -> u32 {
        let inner = self.inner.borrow();
        let mut usr = USR_TFNF | USR_TFE;
        if inner.busy || inner.busy_reads > 0 {
            usr |= USR_BUSY;
        }
        if !inner.rx.is_empty() {
            usr |= USR_RFNE;
        }
        usr
    }

    fn interrupt_id_raw(&self) -> u32 {
        let inner = self.inner.borrow();
        match (inner.timeout, inner.rx.is_empty()) {
            (true, _) => IIR_IID_TIME_OUT,
            (false, false) => IIR_IID_RD,
            (false, true) => IIR_IID_NONE,
        }
    }

    fn rx_fifo_level(&self) -> usize {
        self.inner.borrow().rx.len()
    }

    fn set_fifo_mode(&self, mode: FifoMode) {
        let mut inner = self.inner.borrow_mut();
        inner.fifo_mode = mode;
        inner.fifo_mode_writes += 1;
    }
}

// =============================================================================
// Fake DMA
// =============================================================================

#[derive(Default)]
struct DmaInner {
    transfers: Vec<Vec<u8>>,
    completion: bool,
}

/// Fake DMA channel capturing every transferred frame.
#[derive(Clone, Default)]
pub struct FakeDma {
    inner: Rc<RefCell<DmaInner>>,
}

impl FakeDma {
    /// Raise the completion flag of the last transfer
    pub fn complete(&self) {
        self.inner.borrow_mut().completion = true;
    }

    pub fn transfers(&self) -> Vec<Vec<u8>> {
        self.inner.borrow().transfers.clone()
    }
}

impl DmaChannel for FakeDma {
    unsafe fn start(&self, descriptor: &TxDescriptor) {
        // SAFETY: the caller guarantees the source outlives the transfer.
        let bytes = unsafe { descriptor.as_slice() }.to_vec();
        self.inner.borrow_mut().transfers.push(bytes);
    }

    fn take_completion(&self) -> bool {
        core::mem::take(&mut self.inner.borrow_mut().completion)
    }
}

// =============================================================================
// Fake Timer
// =============================================================================

struct TimerInner {
    scheduled: RefCell<Vec<u32>>,
    now: Cell<u32>,
    step: Cell<u32>,
}

/// Fake timer recording scheduled intervals.
///
/// The microsecond counter advances by `step` on every read.
#[derive(Clone)]
pub struct FakeTimer {
    inner: Rc<TimerInner>,
}

impl Default for FakeTimer {
    fn default() -> Self {
        Self {
            inner: Rc::new(TimerInner {
                scheduled: RefCell::new(Vec::new()),
                now: Cell::new(0),
                step: Cell::new(1),
            }),
        }
    }
}

impl FakeTimer {
    pub fn scheduled(&self) -> Vec<u32> {
        self.inner.scheduled.borrow().clone()
    }

    pub fn set_step(&self, step: u32) {
        self.inner.step.set(step);
    }

    pub fn now(&self) -> u32 {
        self.inner.now.get()
    }
}

impl Timer for FakeTimer {
    fn schedule(&self, ticks: u32) {
        self.inner.scheduled.borrow_mut().push(ticks);
    }

    fn micros(&self) -> u32 {
        let now = self.inner.now.get();
        self.inner.now.set(now.wrapping_add(self.inner.step.get()));
        now
    }
}

// =============================================================================
// Fake Direction Pin
// =============================================================================

#[derive(Default)]
struct PinInner {
    high: Cell<bool>,
    fail: Cell<bool>,
    writes: Cell<usize>,
}

/// Fake direction GPIO.
#[derive(Clone, Default)]
pub struct FakePin {
    inner: Rc<PinInner>,
}

impl FakePin {
    /// Force the level without counting a write
    pub fn set_level(&self, high: bool) {
        self.inner.high.set(high);
    }

    pub fn is_high(&self) -> bool {
        self.inner.high.get()
    }

    /// Make every following write fail
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail.set(fail);
    }

    pub fn writes(&self) -> usize {
        self.inner.writes.get()
    }

    fn write(&self, high: bool) -> Result<(), ErrorKind> {
        if self.inner.fail.get() {
            return Err(ErrorKind::Other);
        }
        self.inner.writes.set(self.inner.writes.get() + 1);
        self.inner.high.set(high);
        Ok(())
    }
}

impl ErrorType for FakePin {
    type Error = ErrorKind;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay accumulating the requested time
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

// =============================================================================
// Hardware Bundle
// =============================================================================

/// One fake of every peripheral an engine needs.
pub struct FakeHardware<const PORTS: usize> {
    pub uarts: [FakeUart; PORTS],
    pub dmas: [FakeDma; PORTS],
    pub timer: FakeTimer,
    pub pins: [FakePin; PORTS],
}

impl<const PORTS: usize> FakeHardware<PORTS> {
    pub fn new() -> Self {
        Self {
            uarts: core::array::from_fn(|_| FakeUart::default()),
            dmas: core::array::from_fn(|_| FakeDma::default()),
            timer: FakeTimer::default(),
            pins: core::array::from_fn(|_| FakePin::default()),
        }
    }

    /// Engine-side handles sharing state with this bundle
    pub fn peripherals(&self) -> Peripherals<FakeUart, FakeDma, FakeTimer, FakePin, PORTS> {
        Peripherals {
            uarts: self.uarts.clone(),
            dmas: self.dmas.clone(),
            timer: self.timer.clone(),
            direction_pins: self.pins.clone(),
        }
    }
}

pub type FakeEngine<const PORTS: usize> = Engine<FakeUart, FakeDma, FakeTimer, FakePin, PORTS>;

// =============================================================================
// RDM Fixtures
// =============================================================================

/// GET DEVICE_INFO request with its checksum (26 bytes)
pub fn rdm_get_request() -> Vec<u8> {
    let mut message = vec![
        0xCC, 0x01, 0x18, // start code, sub-start code, message length
        0x7F, 0xF0, 0x00, 0x00, 0x00, 0x01, // destination UID
        0x7A, 0x70, 0x00, 0x00, 0x00, 0x02, // source UID
        0x00, 0x01, 0x00, // transaction, port, message count
        0x00, 0x00, // sub-device
        0x20, 0x00, 0x60, 0x00, // GET_COMMAND, DEVICE_INFO, no parameter data
        0x00, 0x00, // checksum
    ];
    let len = message.len() - 2;
    rdm::append_checksum(&mut message, len);
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{LineStatus, UartStatus};

    #[test]
    fn fake_uart_break_flag_clears_on_read() {
        let uart = FakeUart::default();
        uart.push_break();

        let first = LineStatus::from_raw(uart.line_status_raw());
        let second = LineStatus::from_raw(uart.line_status_raw());

        assert!(first.break_detected);
        assert!(first.data_ready);
        assert!(!second.break_detected);
        assert_eq!(uart.read_byte(), 0x00);
    }

    #[test]
    fn fake_uart_busy_reads_drain() {
        let uart = FakeUart::default();
        uart.set_busy_reads(2);

        assert!(UartStatus::from_raw(uart.uart_status_raw()).busy);
        uart.read_byte();
        uart.read_byte();
        assert!(!UartStatus::from_raw(uart.uart_status_raw()).busy);
    }

    #[test]
    fn fake_timer_advances_per_read() {
        let timer = FakeTimer::default();
        timer.set_step(5);
        assert_eq!(timer.micros(), 0);
        assert_eq!(timer.micros(), 5);
        assert_eq!(timer.now(), 10);
    }

    #[test]
    fn mock_delay_accumulates() {
        use embedded_hal::delay::DelayNs;

        let mut delay = MockDelay::new();
        delay.delay_us(176);
        delay.delay_ns(500);

        assert_eq!(delay.total_ns(), 176_500);
        assert_eq!(delay.total_us(), 176);
    }

    #[test]
    fn rdm_fixture_is_valid() {
        let request = rdm_get_request();
        assert_eq!(request.len(), 26);
        assert!(rdm::is_valid_message(&request));
    }
}
