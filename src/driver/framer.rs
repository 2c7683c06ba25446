//! Receive framer and DMA completion tracker
//!
//! Runs in the shared fast interrupt. Each call first collects finished DMA
//! transfers for the transmit sequencer, then drains the receive FIFO of every
//! UART in receive mode through a per-UART byte state machine:
//!
//! ```text
//! (break) PreBreak ─► Break ─┬─ 0x00 ─► DmxData ─(idle / 512 slots / break)─► commit
//!                            ├─ 0xCC ─► RdmData ─► ChecksumH ─► ChecksumL ─► commit if valid
//!                            └─ other ─► Idle
//! Idle ─ 0xFE ─► RdmDiscFe ─(0xAA)─► RdmDiscEuid (12) ─► RdmDiscEcs (4) ─► commit
//! ```
//!
//! Only this context advances the receive rings' write indices.

use core::ops::ControlFlow;
use core::sync::atomic::Ordering;

use crate::constants::{
    DMX_MAX_CHANNELS, DMX_START_CODE, RDM_BUFFER_SIZE, RDM_DISCOVERY_ECS_SIZE,
    RDM_DISCOVERY_EUID_SIZE, RDM_DISCOVERY_PREAMBLE, RDM_DISCOVERY_PREAMBLE_MAX,
    RDM_DISCOVERY_SEPARATOR, RDM_MESSAGE_LENGTH_OFFSET, RDM_START_CODE, RDM_SUB_START_CODE,
};
use crate::driver::engine::Shared;
use crate::driver::frame::{DmxFrame, RdmFrame};
use crate::driver::state::TxRxState;
use crate::hal::{DmaChannel, InterruptId, Timer, UartPort};

/// Preamble bytes kept before giving up on the separator
const DISCOVERY_HEADER_LIMIT: usize = RDM_DISCOVERY_PREAMBLE_MAX + 2;

/// Decode position within the frame being received on one UART.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    /// Next DMX byte index (start code at 0)
    dmx_index: usize,
    /// Next RDM byte index
    rdm_index: usize,
    /// Running RDM checksum
    checksum: u16,
    /// Byte count within the discovery EUID or ECS field
    disc_index: usize,
}

/// State owned by the fast-interrupt context.
pub(crate) struct FramerState<const PORTS: usize> {
    cursors: [Cursor; PORTS],
}

impl<const PORTS: usize> FramerState<PORTS> {
    pub(crate) fn new() -> Self {
        Self {
            cursors: [Cursor::default(); PORTS],
        }
    }
}

/// Fast-interrupt handle: DMA completion and UART receive.
pub struct RxFramer<'a, U, D, T, const PORTS: usize> {
    shared: &'a Shared<U, D, T, PORTS>,
    state: &'a mut FramerState<PORTS>,
}

impl<'a, U, D, T, const PORTS: usize> RxFramer<'a, U, D, T, PORTS>
where
    U: UartPort,
    D: DmaChannel,
    T: Timer,
{
    pub(crate) fn new(shared: &'a Shared<U, D, T, PORTS>, state: &'a mut FramerState<PORTS>) -> Self {
        Self { shared, state }
    }

    /// Service DMA completions and receive FIFOs.
    ///
    /// Call from the interrupt shared by the DMA controller and the UARTs.
    /// Acknowledging the interrupt controller is left to the caller.
    pub fn on_rx_or_dma_event(&mut self) {
        self.collect_completions();

        for uart in 0..PORTS {
            if !self.shared.is_receiving(uart) {
                continue;
            }
            let iid = self.shared.uarts[uart].interrupt_id();
            if iid.is_receive() {
                self.receive(uart, iid);
            }
        }
    }

    /// Clear finished transfers from the active mask; the last one ends the
    /// data phase.
    fn collect_completions(&mut self) {
        let shared = self.shared;
        for uart in 0..PORTS {
            if !shared.dmas[uart].take_completion() {
                continue;
            }
            let bit = 1u32 << uart;
            let previous = shared.sending.fetch_and(!bit, Ordering::AcqRel);
            if previous & bit != 0 && previous & !bit == 0 {
                shared
                    .send_state
                    .transition(TxRxState::DmxData, TxRxState::DmxInter);
            }
        }
    }

    /// Drain one UART's receive FIFO
    fn receive(&mut self, uart: usize, iid: InterruptId) {
        let shared = self.shared;
        let port = &shared.uarts[uart];

        if port.line_status().break_detected {
            self.close_dmx_frame(uart);
            shared.receive_state[uart].store(TxRxState::PreBreak);
        }

        for _ in 0..port.rx_fifo_level() {
            while !port.line_status().data_ready {
                core::hint::spin_loop();
            }
            let byte = port.read_byte();
            if self.decode(uart, byte).is_break() {
                return;
            }
        }

        if !port.uart_status().busy || iid.is_timeout() {
            self.close_dmx_frame(uart);
            shared.receive_state[uart].store(TxRxState::Idle);
        }
    }

    /// Commit an open DMX frame at the length reached so far
    fn close_dmx_frame(&mut self, uart: usize) {
        if self.shared.receive_state[uart].load() == TxRxState::DmxData {
            let slots = self.state.cursors[uart].dmx_index.saturating_sub(1);
            self.commit_dmx(uart, slots);
        }
    }

    fn commit_dmx(&mut self, uart: usize, slots: usize) {
        self.dmx_fill(uart).set_slots_in_packet(slots);
        // A full ring keeps the slot for the next frame
        let _ = self.shared.dmx_rx[uart].commit();
    }

    fn commit_rdm(&mut self, uart: usize) {
        let len = self.state.cursors[uart].rdm_index;
        self.rdm_fill(uart).set_len(len);
        let _ = self.shared.rdm_rx[uart].commit();
    }

    #[inline]
    fn dmx_fill(&mut self, uart: usize) -> &mut DmxFrame {
        // SAFETY: the fill slot belongs to this context until committed.
        unsafe { &mut *self.shared.dmx_rx[uart].fill_ptr() }
    }

    #[inline]
    fn rdm_fill(&mut self, uart: usize) -> &mut RdmFrame {
        // SAFETY: the fill slot belongs to this context until committed.
        unsafe { &mut *self.shared.rdm_rx[uart].fill_ptr() }
    }

    /// Store an RDM byte at the cursor and advance it
    fn push_rdm(&mut self, uart: usize, byte: u8) {
        let index = self.state.cursors[uart].rdm_index;
        self.rdm_fill(uart).set_byte(index, byte);
        self.state.cursors[uart].rdm_index = index + 1;
    }

    /// Feed one byte through the state machine.
    ///
    /// Breaks out when a full universe forced the frame closed.
    fn decode(&mut self, uart: usize, byte: u8) -> ControlFlow<()> {
        let shared = self.shared;
        let state = &shared.receive_state[uart];

        match state.load() {
            TxRxState::Idle => {
                if byte == RDM_DISCOVERY_PREAMBLE {
                    self.state.cursors[uart].rdm_index = 0;
                    self.push_rdm(uart, byte);
                    state.store(TxRxState::RdmDiscFe);
                }
            }
            TxRxState::PreBreak => state.store(TxRxState::Break),
            TxRxState::Break => match byte {
                DMX_START_CODE => {
                    self.dmx_fill(uart).set_byte(0, DMX_START_CODE);
                    self.state.cursors[uart].dmx_index = 1;
                    shared.dmx_packets[uart].fetch_add(1, Ordering::Relaxed);
                    state.store(TxRxState::DmxData);
                }
                RDM_START_CODE => {
                    let cursor = &mut self.state.cursors[uart];
                    cursor.rdm_index = 0;
                    cursor.checksum = u16::from(RDM_START_CODE);
                    self.push_rdm(uart, byte);
                    state.store(TxRxState::RdmData);
                }
                _ => state.store(TxRxState::Idle),
            },
            TxRxState::DmxData => {
                let index = self.state.cursors[uart].dmx_index;
                self.dmx_fill(uart).set_byte(index, byte);
                self.state.cursors[uart].dmx_index = index + 1;

                if index + 1 > DMX_MAX_CHANNELS {
                    state.store(TxRxState::Idle);
                    self.commit_dmx(uart, DMX_MAX_CHANNELS);
                    return ControlFlow::Break(());
                }
            }
            TxRxState::RdmData => {
                let index = self.state.cursors[uart].rdm_index;
                if index >= RDM_BUFFER_SIZE - 2 {
                    state.store(TxRxState::Idle);
                    return ControlFlow::Continue(());
                }
                self.push_rdm(uart, byte);
                let cursor = &mut self.state.cursors[uart];
                cursor.checksum = cursor.checksum.wrapping_add(u16::from(byte));

                let next = index + 1;
                if next > RDM_MESSAGE_LENGTH_OFFSET
                    && next == self.rdm_fill(uart).byte(RDM_MESSAGE_LENGTH_OFFSET) as usize
                {
                    state.store(TxRxState::ChecksumH);
                }
            }
            TxRxState::ChecksumH => {
                self.push_rdm(uart, byte);
                let cursor = &mut self.state.cursors[uart];
                cursor.checksum = cursor.checksum.wrapping_sub(u16::from(byte) << 8);
                state.store(TxRxState::ChecksumL);
            }
            TxRxState::ChecksumL => {
                self.push_rdm(uart, byte);
                let cursor = &mut self.state.cursors[uart];
                cursor.checksum = cursor.checksum.wrapping_sub(u16::from(byte));
                let residual = cursor.checksum;

                if residual == 0 && self.rdm_fill(uart).byte(1) == RDM_SUB_START_CODE {
                    self.commit_rdm(uart);
                }
                state.store(TxRxState::Idle);
            }
            TxRxState::RdmDiscFe => {
                self.push_rdm(uart, byte);
                if byte == RDM_DISCOVERY_SEPARATOR
                    || self.state.cursors[uart].rdm_index == DISCOVERY_HEADER_LIMIT
                {
                    self.state.cursors[uart].disc_index = 0;
                    state.store(TxRxState::RdmDiscEuid);
                }
            }
            TxRxState::RdmDiscEuid => {
                self.push_rdm(uart, byte);
                let cursor = &mut self.state.cursors[uart];
                cursor.disc_index += 1;
                if cursor.disc_index == RDM_DISCOVERY_EUID_SIZE {
                    cursor.disc_index = 0;
                    state.store(TxRxState::RdmDiscEcs);
                }
            }
            TxRxState::RdmDiscEcs => {
                self.push_rdm(uart, byte);
                self.state.cursors[uart].disc_index += 1;
                if self.state.cursors[uart].disc_index == RDM_DISCOVERY_ECS_SIZE {
                    self.commit_rdm(uart);
                    state.store(TxRxState::Idle);
                }
            }
            TxRxState::Mab | TxRxState::DmxInter => state.store(TxRxState::Idle),
        }

        ControlFlow::Continue(())
    }
}

// =============================================================================
// Tests
// =============================================================================
