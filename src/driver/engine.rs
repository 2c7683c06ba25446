//! Engine ownership and context split
//!
//! [`Engine`] owns every buffer, counter and peripheral handle. All storage
//! is allocated once at construction and sized by the `PORTS` const generic.
//!
//! # Contexts
//!
//! The engine is driven from three execution contexts:
//!
//! | Handle          | Context                        | Entry points                          |
//! |-----------------|--------------------------------|---------------------------------------|
//! | [`DmxPorts`]    | application                    | send/receive API, direction control   |
//! | [`TxSequencer`] | timer interrupt                | `start`, `on_tx_tick`, `on_rate_tick` |
//! | [`RxFramer`]    | shared DMA/UART fast interrupt | `on_rx_or_dma_event`                  |
//!
//! [`Engine::split`] hands out exactly one of each. Fields written from more
//! than one context are atomics; ring slots follow a single-producer,
//! single-consumer protocol.
//!
//! # Memory Placement
//!
//! DMA reads transmit slots straight out of the engine, so the engine must
//! stay in place while the sequencer runs. Place it in a `static` (or leak
//! it) before calling [`Engine::split`].

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::digital::OutputPin;

use crate::constants::{DEFAULT_PORTS, DMX_RX_RING_DEPTH, RDM_RX_RING_DEPTH, TX_RING_DEPTH};
use crate::driver::config::{EngineConfig, TransmitTiming};
use crate::driver::frame::{DmxFrame, RdmFrame, TxSlot};
use crate::driver::framer::{FramerState, RxFramer};
use crate::driver::ports::{DmxPorts, PortsState};
use crate::driver::sequencer::{SequencerState, TxSequencer};
use crate::driver::state::{TxRxState, UartState};
use crate::error::{ConfigError, ConfigResult};
use crate::hal::{DmaChannel, FifoMode, Timer, UartPort};
use crate::internal::ring::SlotRing;
use crate::internal::state::{AtomicTxRxState, AtomicUartState};

// =============================================================================
// Peripherals
// =============================================================================

/// Hardware handed to the engine at construction.
///
/// `uarts` and `dmas` are indexed by UART number, `direction_pins` by
/// logical port.
pub struct Peripherals<U, D, T, P, const PORTS: usize> {
    /// One UART per index
    pub uarts: [U; PORTS],
    /// DMA channel feeding the UART with the same index
    pub dmas: [D; PORTS],
    /// Sequencer timer and microsecond counter
    pub timer: T,
    /// Transceiver direction pin of each logical port (high = output)
    pub direction_pins: [P; PORTS],
}

// =============================================================================
// Shared State
// =============================================================================

/// State reachable from every context.
pub(crate) struct Shared<U, D, T, const PORTS: usize> {
    pub(crate) uarts: [U; PORTS],
    pub(crate) dmas: [D; PORTS],
    pub(crate) timer: T,

    /// What each UART is doing; written by the application only
    pub(crate) uart_state: [AtomicUartState; PORTS],
    /// Transmit sequencer phase
    pub(crate) send_state: AtomicTxRxState,
    /// Receive decoder phase per UART
    pub(crate) receive_state: [AtomicTxRxState; PORTS],
    /// Bit per UART with a DMA transfer outstanding
    pub(crate) sending: AtomicU32,

    pub(crate) break_ticks: AtomicU32,
    pub(crate) mab_ticks: AtomicU32,
    pub(crate) data_ticks: AtomicU32,

    pub(crate) tx: [SlotRing<TxSlot, TX_RING_DEPTH>; PORTS],
    pub(crate) dmx_rx: [SlotRing<DmxFrame, DMX_RX_RING_DEPTH>; PORTS],
    pub(crate) rdm_rx: [SlotRing<RdmFrame, RDM_RX_RING_DEPTH>; PORTS],

    /// DMX packets started per UART, counted by the framer
    pub(crate) dmx_packets: [AtomicU32; PORTS],
    /// Packets counted over the last rate tick
    pub(crate) updates_per_second: [AtomicU32; PORTS],
    /// Data phases that outlived their slot
    pub(crate) timing_faults: AtomicU32,
}

impl<U, D, T, const PORTS: usize> Shared<U, D, T, PORTS> {
    const PORTS_FIT_MASK: () = assert!(
        PORTS > 0 && PORTS <= u32::BITS as usize,
        "PORTS must be between 1 and 32"
    );

    fn new(uarts: [U; PORTS], dmas: [D; PORTS], timer: T) -> Self {
        let () = Self::PORTS_FIT_MASK;
        Self {
            uarts,
            dmas,
            timer,
            uart_state: core::array::from_fn(|_| AtomicUartState::new(UartState::Idle)),
            send_state: AtomicTxRxState::new(TxRxState::Idle),
            receive_state: core::array::from_fn(|_| AtomicTxRxState::new(TxRxState::Idle)),
            sending: AtomicU32::new(0),
            break_ticks: AtomicU32::new(0),
            mab_ticks: AtomicU32::new(0),
            data_ticks: AtomicU32::new(0),
            tx: core::array::from_fn(|_| SlotRing::new(TxSlot::new)),
            dmx_rx: core::array::from_fn(|_| SlotRing::new(DmxFrame::new)),
            rdm_rx: core::array::from_fn(|_| SlotRing::new(RdmFrame::new)),
            dmx_packets: core::array::from_fn(|_| AtomicU32::new(0)),
            updates_per_second: core::array::from_fn(|_| AtomicU32::new(0)),
            timing_faults: AtomicU32::new(0),
        }
    }

    /// Publish new phase intervals to the sequencer
    pub(crate) fn store_timing(&self, timing: &TransmitTiming) {
        self.break_ticks
            .store(timing.break_ticks(), Ordering::Relaxed);
        self.mab_ticks.store(timing.mab_ticks(), Ordering::Relaxed);
        self.data_ticks
            .store(timing.data_ticks(), Ordering::Release);
    }

    /// True when the UART is handed to the transmit sequencer
    #[inline]
    pub(crate) fn is_transmitting(&self, uart: usize) -> bool {
        self.uart_state[uart].load() == UartState::Tx
    }

    /// True when the UART is handed to the receive framer
    #[inline]
    pub(crate) fn is_receiving(&self, uart: usize) -> bool {
        self.uart_state[uart].load() == UartState::Rx
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Multi-port DMX-512/RDM transceiver engine.
///
/// # Type Parameters
///
/// * `U` - UART implementation
/// * `D` - DMA channel implementation
/// * `T` - sequencer timer
/// * `P` - direction GPIO
/// * `PORTS` - number of UARTs (and maximum number of logical ports)
pub struct Engine<U, D, T, P, const PORTS: usize = DEFAULT_PORTS> {
    shared: Shared<U, D, T, PORTS>,
    ports: PortsState<P, PORTS>,
    sequencer: SequencerState<PORTS>,
    framer: FramerState<PORTS>,
}

impl<U, D, T, P, const PORTS: usize> Engine<U, D, T, P, PORTS>
where
    U: UartPort,
    D: DmaChannel,
    T: Timer,
    P: OutputPin,
{
    /// Build an engine from its hardware and configuration.
    ///
    /// Validates the port map, drives every direction pin low (input) and
    /// enables the transmit FIFO of each mapped UART. No port transmits or
    /// receives until [`DmxPorts::set_port_direction`] enables it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPortCount`] / [`ConfigError::InvalidPortMap`]
    ///   for a bad configuration
    /// - [`ConfigError::GpioError`] if a direction pin cannot be driven
    pub fn new(
        peripherals: Peripherals<U, D, T, P, PORTS>,
        config: EngineConfig<PORTS>,
    ) -> ConfigResult<Self> {
        config.validate()?;

        let Peripherals {
            uarts,
            dmas,
            timer,
            mut direction_pins,
        } = peripherals;

        for pin in &mut direction_pins {
            pin.set_low().map_err(|_| ConfigError::GpioError)?;
        }

        let shared = Shared::new(uarts, dmas, timer);
        for &uart in &config.port_map[..config.port_count] {
            shared.uarts[uart as usize].set_fifo_mode(FifoMode::Transmit);
        }

        let mut ports = PortsState::new(direction_pins, &config);
        ports.update_period(&shared);
        let sequencer = SequencerState::new(ports.timing().ticks_per_us());

        Ok(Self {
            shared,
            ports,
            sequencer,
            framer: FramerState::new(),
        })
    }

    /// Hand out one handle per execution context.
    pub fn split(
        &mut self,
    ) -> (
        DmxPorts<'_, U, D, T, P, PORTS>,
        TxSequencer<'_, U, D, T, PORTS>,
        RxFramer<'_, U, D, T, PORTS>,
    ) {
        let shared = &self.shared;
        (
            DmxPorts::new(shared, &mut self.ports),
            TxSequencer::new(shared, &mut self.sequencer),
            RxFramer::new(shared, &mut self.framer),
        )
    }

    /// Number of logical ports in use
    pub fn port_count(&self) -> usize {
        self.ports.port_count()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BREAK_TIME_TYPICAL_US, MAB_TIME_MIN_US, PERIOD_DEFAULT_US};
    use crate::driver::config::PortDirection;
    use crate::testing::FakeHardware;

    #[test]
    fn new_drives_direction_pins_low() {
        let hw = FakeHardware::<4>::new();
        for pin in &hw.pins {
            pin.set_level(true);
        }

        let engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();

        assert_eq!(engine.port_count(), 4);
        assert!(hw.pins.iter().all(|pin| !pin.is_high()));
    }

    #[test]
    fn new_enables_tx_fifo_on_mapped_uarts() {
        let hw = FakeHardware::<4>::new();
        let config = EngineConfig::new()
            .with_port_map([2, 0, 0, 0])
            .with_port_count(2);

        let _engine = Engine::new(hw.peripherals(), config).unwrap();

        assert_eq!(hw.uarts[0].fifo_mode(), FifoMode::Transmit);
        assert_eq!(hw.uarts[1].fifo_mode(), FifoMode::Disabled);
        assert_eq!(hw.uarts[2].fifo_mode(), FifoMode::Transmit);
    }

    #[test]
    fn new_rejects_bad_port_map() {
        let hw = FakeHardware::<4>::new();
        let config = EngineConfig::new().with_port_map([0, 0, 1, 2]);

        let result = Engine::new(hw.peripherals(), config);
        assert!(matches!(result, Err(ConfigError::InvalidPortMap)));
    }

    #[test]
    fn new_reports_gpio_failure() {
        let hw = FakeHardware::<2>::new();
        hw.pins[1].fail_writes(true);

        let result = Engine::new(hw.peripherals(), EngineConfig::new());
        assert!(matches!(result, Err(ConfigError::GpioError)));
    }

    #[test]
    fn new_engine_is_idle_with_default_timing() {
        let hw = FakeHardware::<4>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (ports, _, _) = engine.split();

        assert_eq!(ports.transmit_state(), TxRxState::Idle);
        assert_eq!(ports.break_time(), BREAK_TIME_TYPICAL_US);
        assert_eq!(ports.mab_time(), MAB_TIME_MIN_US);
        assert_eq!(ports.period_requested(), PERIOD_DEFAULT_US);
        assert_eq!(ports.period_time(), PERIOD_DEFAULT_US);
        for port in 0..4 {
            assert_eq!(ports.port_direction(port), PortDirection::Input);
        }
    }
}
