//! Application-facing data plane and port direction control
//!
//! [`DmxPorts`] is the handle the application context uses to drive the
//! engine: buffered DMX send and receive, synchronous raw RDM, direction
//! switching and the shared transmit timing.
//!
//! Port indices are logical; each maps to a UART through the configured
//! port map. An out-of-range port is a programming error and panics.

use core::sync::atomic::Ordering;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::constants::{
    DMX_MAX_CHANNELS, DMX_START_CODE, RDM_BUFFER_SIZE, RDM_TRANSMIT_BREAK_TIME_US,
    RDM_TRANSMIT_MAB_TIME_US,
};
use crate::driver::config::{EngineConfig, PortDirection, PortRole, TransmitTiming};
use crate::driver::engine::Shared;
use crate::driver::frame::{DmxFrame, RdmFrame};
use crate::driver::state::{TxRxState, UartState};
use crate::error::{ConfigError, ConfigResult, IoError, IoResult};
use crate::hal::{DmaChannel, FifoMode, Timer, UartPort};

/// State owned by the application context.
pub(crate) struct PortsState<P, const PORTS: usize> {
    pins: [P; PORTS],
    port_map: [u8; PORTS],
    port_count: usize,
    directions: [PortDirection; PORTS],
    /// Channels last sent per port, for period computation
    lengths: [usize; PORTS],
    timing: TransmitTiming,
    /// Receive slots handed out and not yet released, per UART
    dmx_claimed: [bool; PORTS],
    rdm_claimed: [bool; PORTS],
}

impl<P: OutputPin, const PORTS: usize> PortsState<P, PORTS> {
    pub(crate) fn new(pins: [P; PORTS], config: &EngineConfig<PORTS>) -> Self {
        Self {
            pins,
            port_map: config.port_map,
            port_count: config.port_count,
            directions: [PortDirection::Input; PORTS],
            lengths: [DMX_MAX_CHANNELS; PORTS],
            timing: TransmitTiming::from_config(config),
            dmx_claimed: [false; PORTS],
            rdm_claimed: [false; PORTS],
        }
    }

    pub(crate) fn port_count(&self) -> usize {
        self.port_count
    }

    pub(crate) fn timing(&self) -> &TransmitTiming {
        &self.timing
    }

    /// Longest payload among output ports
    fn max_output_channels(&self) -> usize {
        (0..self.port_count)
            .filter(|&port| self.directions[port] == PortDirection::Output)
            .map(|port| self.lengths[port])
            .max()
            .unwrap_or(0)
    }

    /// Recompute the shared period and publish the phase intervals
    pub(crate) fn update_period<U, D, T>(&mut self, shared: &Shared<U, D, T, PORTS>) {
        let max_channels = self.max_output_channels();
        self.timing.recompute(max_channels);
        shared.store_timing(&self.timing);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "DMX period {=u32} us (longest output {=usize} channels)",
            self.timing.period_us(),
            max_channels
        );
    }
}

/// Application handle.
pub struct DmxPorts<'a, U, D, T, P, const PORTS: usize> {
    shared: &'a Shared<U, D, T, PORTS>,
    state: &'a mut PortsState<P, PORTS>,
}

impl<'a, U, D, T, P, const PORTS: usize> DmxPorts<'a, U, D, T, P, PORTS>
where
    U: UartPort,
    D: DmaChannel,
    T: Timer,
    P: OutputPin,
{
    pub(crate) fn new(shared: &'a Shared<U, D, T, PORTS>, state: &'a mut PortsState<P, PORTS>) -> Self {
        Self { shared, state }
    }

    #[inline]
    fn check_port(&self, port: usize) {
        assert!(
            port < self.state.port_count,
            "port {port} out of range (port count {})",
            self.state.port_count
        );
    }

    /// UART index behind a logical port
    #[inline]
    fn uart(&self, port: usize) -> usize {
        self.check_port(port);
        self.state.port_map[port] as usize
    }

    // =========================================================================
    // Port Queries
    // =========================================================================

    /// Number of logical ports in use
    pub fn port_count(&self) -> usize {
        self.state.port_count
    }

    /// Configured direction of a port
    pub fn port_direction(&self, port: usize) -> PortDirection {
        self.check_port(port);
        self.state.directions[port]
    }

    /// What a port is currently doing
    pub fn port_role(&self, port: usize) -> PortRole {
        match self.shared.uart_state[self.uart(port)].load() {
            UartState::Tx => PortRole::Output,
            UartState::Rx => PortRole::Input,
            UartState::Idle => PortRole::Disabled,
        }
    }

    /// Number of ports currently transmitting
    pub fn active_output_ports(&self) -> usize {
        (0..self.state.port_count)
            .filter(|&port| self.port_role(port) == PortRole::Output)
            .count()
    }

    /// Number of ports currently receiving
    pub fn active_input_ports(&self) -> usize {
        (0..self.state.port_count)
            .filter(|&port| self.port_role(port) == PortRole::Input)
            .count()
    }

    // =========================================================================
    // Direction Control
    // =========================================================================

    /// Switch a port's direction and optionally start data on it.
    ///
    /// - A new direction stops the port, drives the transceiver pin (high for
    ///   output) and recomputes the shared period.
    /// - The same direction with `enable_data == false` stops the port.
    /// - `enable_data == true` starts the port; already running ports are
    ///   left untouched, so repeated calls are harmless.
    ///
    /// Stopping a transmitting port blocks until the current data phase has
    /// ended.
    ///
    /// # Errors
    ///
    /// [`ConfigError::GpioError`] if the direction pin cannot be driven. The
    /// port is left stopped.
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn set_port_direction(
        &mut self,
        port: usize,
        direction: PortDirection,
        enable_data: bool,
    ) -> ConfigResult<()> {
        self.check_port(port);

        if direction != self.state.directions[port] {
            self.stop_data(port);

            let pin = &mut self.state.pins[port];
            let driven = match direction {
                PortDirection::Output => pin.set_high(),
                PortDirection::Input => pin.set_low(),
            };
            driven.map_err(|_| ConfigError::GpioError)?;

            self.state.directions[port] = direction;
            self.state.update_period(self.shared);

            #[cfg(feature = "defmt")]
            defmt::debug!("DMX port {=usize} direction {}", port, direction);
        } else if !enable_data {
            self.stop_data(port);
        }

        if enable_data {
            self.start_data(port);
        }

        Ok(())
    }

    /// Hand the port's UART to the sequencer or the framer
    fn start_data(&mut self, port: usize) {
        let uart = self.uart(port);
        let shared = self.shared;
        let target = match self.state.directions[port] {
            PortDirection::Output => UartState::Tx,
            PortDirection::Input => UartState::Rx,
        };

        if shared.uart_state[uart].load() == target {
            return;
        }

        match target {
            UartState::Tx => {
                shared.uarts[uart].set_fifo_mode(FifoMode::Transmit);
            }
            _ => {
                while !shared.uarts[uart].uart_status().tx_fifo_empty {
                    core::hint::spin_loop();
                }
                shared.receive_state[uart].store(TxRxState::Idle);
                shared.uarts[uart].set_fifo_mode(FifoMode::Receive);
            }
        }

        shared.uart_state[uart].store(target);
    }

    /// Take the port's UART away from both interrupt contexts
    fn stop_data(&mut self, port: usize) {
        let uart = self.uart(port);
        let shared = self.shared;
        let previous = shared.uart_state[uart].load();
        shared.uart_state[uart].store(UartState::Idle);

        match previous {
            UartState::Idle => {}
            UartState::Tx => {
                while shared.send_state.load().is_transmitting() {
                    core::hint::spin_loop();
                }
                self.release_output(uart);
            }
            UartState::Rx => {
                shared.uarts[uart].set_fifo_mode(FifoMode::Disabled);
                shared.receive_state[uart].store(TxRxState::Idle);
            }
        }
    }

    /// Drain a UART the sequencer has let go of and drop any break it left
    fn release_output(&self, uart: usize) {
        let uart = &self.shared.uarts[uart];
        while !uart.uart_status().tx_fifo_empty {
            core::hint::spin_loop();
        }
        uart.set_line_break(false);
    }

    // =========================================================================
    // DMX Transmit
    // =========================================================================

    /// Queue DMX channel data for transmission on an output port.
    ///
    /// A zero start code is prepended. The newest payload wins: a producer
    /// faster than the refresh rate overwrites payloads not yet sent. A
    /// change in length recomputes the shared period.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidLength`] for empty data or more than 512 channels.
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn set_port_send_data_without_sc(&mut self, port: usize, data: &[u8]) -> IoResult<()> {
        let uart = self.uart(port);
        if data.is_empty() || data.len() > DMX_MAX_CHANNELS {
            return Err(IoError::InvalidLength);
        }

        let ring = &self.shared.tx[uart];
        let index = ring.next_write_index();
        // SAFETY: the write index never equals the sequencer's slot.
        let slot = unsafe { &mut *ring.slot_ptr(index) };
        slot.fill(DMX_START_CODE, data);
        ring.publish(index);

        if self.state.lengths[port] != data.len() {
            self.state.lengths[port] = data.len();
            self.state.update_period(self.shared);
        }

        Ok(())
    }

    /// Reset a port's output to a full universe of zeros.
    ///
    /// A stopped port has every slot cleared; a transmitting port gets a zero
    /// frame queued like any other payload.
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn clear_data(&mut self, port: usize) {
        let uart = self.uart(port);
        let shared = self.shared;
        let ring = &shared.tx[uart];

        if shared.is_transmitting(uart) {
            let index = ring.next_write_index();
            // SAFETY: the write index never equals the sequencer's slot.
            unsafe { (*ring.slot_ptr(index)).clear() };
            ring.publish(index);
        } else {
            for slot in ring.slot_ptrs() {
                // SAFETY: the sequencer only touches rings of transmitting UARTs.
                unsafe { (*slot).clear() };
            }
            ring.skip_to_latest();
        }

        if self.state.lengths[port] != DMX_MAX_CHANNELS {
            self.state.lengths[port] = DMX_MAX_CHANNELS;
            self.state.update_period(shared);
        }
    }

    // =========================================================================
    // DMX Receive
    // =========================================================================

    /// Oldest unread DMX frame received on a port.
    ///
    /// The frame stays valid until the next call for the same port, which
    /// returns its slot to the framer.
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn get_dmx_available(&mut self, port: usize) -> Option<&DmxFrame> {
        let uart = self.uart(port);
        let ring = &self.shared.dmx_rx[uart];

        if core::mem::take(&mut self.state.dmx_claimed[uart]) {
            ring.release();
        }

        let frame = ring.peek_ptr()?;
        self.state.dmx_claimed[uart] = true;
        // SAFETY: a committed slot is not refilled until released.
        Some(unsafe { &*frame })
    }

    /// DMX frames received per second on a port, refreshed by the rate tick
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn get_updates_per_second(&self, port: usize) -> u32 {
        self.shared.updates_per_second[self.uart(port)].load(Ordering::Relaxed)
    }

    // =========================================================================
    // RDM
    // =========================================================================

    /// Transmit a raw RDM frame synchronously.
    ///
    /// Waits for the transmitter to drain, sends a 176 us break and 12 us
    /// mark-after-break, writes `data` byte by byte and discards the echo
    /// until the UART is idle.
    ///
    /// Put the port in output direction with data stopped first,
    /// `set_port_direction(port, PortDirection::Output, false)`, so the
    /// transceiver drives the line while neither interrupt context uses the
    /// UART.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidLength`] for empty or oversized data.
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn rdm_send_raw<DL: DelayNs>(
        &mut self,
        port: usize,
        data: &[u8],
        delay: &mut DL,
    ) -> IoResult<()> {
        let uart = &self.shared.uarts[self.uart(port)];
        if data.is_empty() || data.len() > RDM_BUFFER_SIZE {
            return Err(IoError::InvalidLength);
        }

        while !uart.line_status().transmitter_empty {
            core::hint::spin_loop();
        }

        uart.set_line_break(true);
        delay.delay_us(RDM_TRANSMIT_BREAK_TIME_US);
        uart.set_line_break(false);
        delay.delay_us(RDM_TRANSMIT_MAB_TIME_US);

        for &byte in data {
            while !uart.line_status().thr_empty {
                core::hint::spin_loop();
            }
            uart.write_byte(byte);
        }

        while uart.uart_status().busy {
            let _ = uart.read_byte();
        }

        Ok(())
    }

    /// Oldest valid RDM frame received on a port.
    ///
    /// The frame stays valid until the next RDM receive call for the same
    /// port, which returns its slot to the framer.
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn rdm_receive(&mut self, port: usize) -> Option<&RdmFrame> {
        let uart = self.uart(port);
        let ring = &self.shared.rdm_rx[uart];

        if core::mem::take(&mut self.state.rdm_claimed[uart]) {
            ring.release();
        }

        let frame = ring.peek_ptr()?;
        self.state.rdm_claimed[uart] = true;
        // SAFETY: a committed slot is not refilled until released.
        Some(unsafe { &*frame })
    }

    /// Wait up to `timeout_us` for an RDM frame.
    ///
    /// # Errors
    ///
    /// [`IoError::Timeout`] when nothing arrived in time.
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn rdm_receive_timeout(&mut self, port: usize, timeout_us: u32) -> IoResult<&RdmFrame> {
        let uart = self.uart(port);
        let start = self.shared.timer.micros();

        while !self.rdm_pending(uart) {
            if self.shared.timer.micros().wrapping_sub(start) >= timeout_us {
                return Err(IoError::Timeout);
            }
            core::hint::spin_loop();
        }

        self.rdm_receive(port).ok_or(IoError::Timeout)
    }

    /// True when a receive call would return a new frame
    fn rdm_pending(&self, uart: usize) -> bool {
        let pending = self.shared.rdm_rx[uart].pending();
        let claimed = usize::from(self.state.rdm_claimed[uart]);
        pending > claimed
    }

    // =========================================================================
    // Transmit Timing
    // =========================================================================

    /// Set the transmitted break time (raised to the 92 us minimum)
    pub fn set_break_time(&mut self, break_time_us: u32) {
        self.state.timing.set_break_us(break_time_us);
        self.state.update_period(self.shared);
    }

    /// Transmitted break time in microseconds
    pub fn break_time(&self) -> u32 {
        self.state.timing.break_us()
    }

    /// Set the transmitted mark-after-break time (clamped to 12 us ..= 1 s)
    pub fn set_mab_time(&mut self, mab_time_us: u32) {
        self.state.timing.set_mab_us(mab_time_us);
        self.state.update_period(self.shared);
    }

    /// Transmitted mark-after-break time in microseconds
    pub fn mab_time(&self) -> u32 {
        self.state.timing.mab_us()
    }

    /// Request a break-to-break period; 0 transmits as fast as the longest
    /// output allows
    pub fn set_period_time(&mut self, period_us: u32) {
        self.state.timing.set_period_requested_us(period_us);
        self.state.update_period(self.shared);
    }

    /// Effective break-to-break period in microseconds
    pub fn period_time(&self) -> u32 {
        self.state.timing.period_us()
    }

    /// Period last requested with [`set_period_time`](Self::set_period_time)
    pub fn period_requested(&self) -> u32 {
        self.state.timing.period_requested_us()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Current transmit sequencer phase
    pub fn transmit_state(&self) -> TxRxState {
        self.shared.send_state.load()
    }

    /// Current receive decoder phase of a port
    ///
    /// # Panics
    ///
    /// If `port` is not below [`port_count`](Self::port_count).
    pub fn receive_state(&self, port: usize) -> TxRxState {
        self.shared.receive_state[self.uart(port)].load()
    }

    /// Data phases that outlived their period since start-up
    pub fn timing_faults(&self) -> u32 {
        self.shared.timing_faults.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================
