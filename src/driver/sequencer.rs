//! Transmit timing sequencer
//!
//! One timer-driven state machine generates break, mark-after-break and the
//! data phase for every output UART at once:
//!
//! ```text
//! Idle/DmxInter ──► Break ──► Mab ──► DmxData ──(all DMA done)──► DmxInter
//!       ▲                                 │
//!       └───────(timer expiry: fault)─────┘
//! ```
//!
//! The DMA completion half of the cycle runs in [`RxFramer`](crate::RxFramer).

use core::sync::atomic::Ordering;

use crate::constants::{STARTUP_DELAY_US, TIMING_FAULT_RECOVERY_TICKS};
use crate::driver::engine::Shared;
use crate::driver::state::TxRxState;
use crate::hal::{DmaChannel, Timer, TxDescriptor, UartPort};

/// State owned by the timer context.
pub(crate) struct SequencerState<const PORTS: usize> {
    descriptors: [TxDescriptor; PORTS],
    /// UARTs that entered break this cycle with a freshly pointed descriptor
    in_cycle: u32,
    packets_previous: [u32; PORTS],
    startup_ticks: u32,
}

impl<const PORTS: usize> SequencerState<PORTS> {
    pub(crate) fn new(ticks_per_us: u32) -> Self {
        Self {
            descriptors: [TxDescriptor::empty(); PORTS],
            in_cycle: 0,
            packets_previous: [0; PORTS],
            startup_ticks: STARTUP_DELAY_US.saturating_mul(ticks_per_us),
        }
    }
}

/// Timer interrupt handle.
pub struct TxSequencer<'a, U, D, T, const PORTS: usize> {
    shared: &'a Shared<U, D, T, PORTS>,
    state: &'a mut SequencerState<PORTS>,
}

impl<'a, U, D, T, const PORTS: usize> TxSequencer<'a, U, D, T, PORTS>
where
    U: UartPort,
    D: DmaChannel,
    T: Timer,
{
    pub(crate) fn new(
        shared: &'a Shared<U, D, T, PORTS>,
        state: &'a mut SequencerState<PORTS>,
    ) -> Self {
        Self { shared, state }
    }

    /// Arm the timer for the first cycle, 1 ms from now.
    pub fn start(&mut self) {
        self.shared.timer.schedule(self.state.startup_ticks);
    }

    /// Advance the transmit cycle. Call from the sequencer timer interrupt.
    pub fn on_tx_tick(&mut self) {
        match self.shared.send_state.load() {
            TxRxState::Break => self.end_break(),
            TxRxState::Mab => self.start_data(),
            TxRxState::DmxData => self.recover_timing_fault(),
            _ => self.start_break(),
        }
    }

    /// Refresh the per-port frame rate. Call once per second.
    pub fn on_rate_tick(&mut self) {
        let shared = self.shared;
        for uart in 0..PORTS {
            let packets = shared.dmx_packets[uart].load(Ordering::Relaxed);
            let previous = core::mem::replace(&mut self.state.packets_previous[uart], packets);
            shared.updates_per_second[uart].store(packets.wrapping_sub(previous), Ordering::Relaxed);
        }
    }

    /// `Idle/DmxInter -> Break`
    fn start_break(&mut self) {
        let shared = self.shared;
        shared
            .timer
            .schedule(shared.break_ticks.load(Ordering::Relaxed));

        // A UART enabled after this point waits for the next break
        self.state.in_cycle = 0;
        for uart in 0..PORTS {
            if !shared.is_transmitting(uart) {
                self.state.descriptors[uart] = TxDescriptor::empty();
                continue;
            }
            shared.uarts[uart].set_line_break(true);

            let index = shared.tx[uart].advance_to_latest();
            // SAFETY: the consumer slot is never written by the producer.
            let slot = unsafe { &*shared.tx[uart].slot_ptr(index) };
            self.state.descriptors[uart].point_at(slot.as_bytes());
            self.state.in_cycle |= 1 << uart;
        }

        shared.send_state.store(TxRxState::Break);
    }

    /// `Break -> Mab`
    fn end_break(&mut self) {
        let shared = self.shared;
        shared
            .timer
            .schedule(shared.mab_ticks.load(Ordering::Relaxed));

        for uart in 0..PORTS {
            if self.in_cycle(uart) && shared.is_transmitting(uart) {
                shared.uarts[uart].set_line_break(false);
            }
        }

        shared.send_state.store(TxRxState::Mab);
    }

    /// `Mab -> DmxData`, or straight to `DmxInter` when no UART transmits
    fn start_data(&mut self) {
        let shared = self.shared;
        shared
            .timer
            .schedule(shared.data_ticks.load(Ordering::Acquire));

        let mask = (0..PORTS)
            .filter(|&uart| {
                self.in_cycle(uart)
                    && shared.is_transmitting(uart)
                    && !self.state.descriptors[uart].is_empty()
            })
            .fold(0u32, |mask, uart| mask | (1 << uart));

        if mask == 0 {
            shared.send_state.store(TxRxState::DmxInter);
            return;
        }

        // Completions may arrive as soon as the first channel starts
        shared.sending.fetch_or(mask, Ordering::AcqRel);
        shared.send_state.store(TxRxState::DmxData);

        for uart in 0..PORTS {
            if mask & (1 << uart) != 0 {
                // SAFETY: the descriptor points at a TX slot owned by the
                // engine, which outlives every transfer it starts.
                unsafe { shared.dmas[uart].start(&self.state.descriptors[uart]) };
            }
        }
    }

    #[inline]
    fn in_cycle(&self, uart: usize) -> bool {
        self.state.in_cycle & (1 << uart) != 0
    }

    /// Timer fired while DMA was still running: the period was too short.
    fn recover_timing_fault(&mut self) {
        let shared = self.shared;
        shared.timer.schedule(TIMING_FAULT_RECOVERY_TICKS);
        shared.sending.store(0, Ordering::Release);
        let faults = shared.timing_faults.fetch_add(1, Ordering::Relaxed) + 1;

        #[cfg(feature = "defmt")]
        defmt::warn!("DMX data phase overran its slot ({=u32} faults)", faults);
        #[cfg(not(feature = "defmt"))]
        let _ = faults;

        shared.send_state.store(TxRxState::DmxInter);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec;

    use crate::constants::{DMX_MAX_FRAME_SIZE, TIMING_FAULT_RECOVERY_TICKS};
    use crate::driver::config::{EngineConfig, PortDirection};
    use crate::driver::engine::Engine;
    use crate::driver::state::TxRxState;
    use crate::testing::FakeHardware;

    #[test]
    fn start_schedules_one_millisecond() {
        let hw = FakeHardware::<2>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (_, mut sequencer, _) = engine.split();

        sequencer.start();
        assert_eq!(hw.timer.scheduled(), [12_000]);
    }

    #[test]
    fn full_cycle_for_one_output() {
        let hw = FakeHardware::<2>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (mut ports, mut sequencer, mut framer) = engine.split();

        ports.set_port_direction(0, PortDirection::Output, true).unwrap();
        ports.set_port_send_data_without_sc(0, &[1, 2, 3]).unwrap();

        sequencer.on_tx_tick();
        assert_eq!(ports.transmit_state(), TxRxState::Break);
        assert!(hw.uarts[0].line_break());
        assert!(!hw.uarts[1].line_break());

        sequencer.on_tx_tick();
        assert_eq!(ports.transmit_state(), TxRxState::Mab);
        assert!(!hw.uarts[0].line_break());

        sequencer.on_tx_tick();
        assert_eq!(ports.transmit_state(), TxRxState::DmxData);
        assert_eq!(hw.dmas[0].transfers(), [vec![0, 1, 2, 3]]);
        assert!(hw.dmas[1].transfers().is_empty());

        hw.dmas[0].complete();
        framer.on_rx_or_dma_event();
        assert_eq!(ports.transmit_state(), TxRxState::DmxInter);

        let period = ports.period_time();
        let scheduled = hw.timer.scheduled();
        assert_eq!(scheduled.len(), 3);
        assert_eq!(scheduled.iter().sum::<u32>(), period * 12);
        assert_eq!(scheduled[0], ports.break_time() * 12);
        assert_eq!(scheduled[1], ports.mab_time() * 12);
    }

    #[test]
    fn no_outputs_skips_data_phase() {
        let hw = FakeHardware::<2>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (ports, mut sequencer, _) = engine.split();

        sequencer.on_tx_tick();
        sequencer.on_tx_tick();
        sequencer.on_tx_tick();

        assert_eq!(ports.transmit_state(), TxRxState::DmxInter);
        assert!(hw.dmas[0].transfers().is_empty());
    }

    #[test]
    fn retransmits_previous_frame_without_new_data() {
        let hw = FakeHardware::<1>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (mut ports, mut sequencer, mut framer) = engine.split();

        ports.set_port_direction(0, PortDirection::Output, true).unwrap();
        ports.set_port_send_data_without_sc(0, &[9, 9]).unwrap();

        for _ in 0..2 {
            for _ in 0..3 {
                sequencer.on_tx_tick();
            }
            hw.dmas[0].complete();
            framer.on_rx_or_dma_event();
        }

        assert_eq!(hw.dmas[0].transfers(), [vec![0, 9, 9], vec![0, 9, 9]]);
    }

    #[test]
    fn default_frame_is_full_zero_universe() {
        let hw = FakeHardware::<1>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (mut ports, mut sequencer, _) = engine.split();

        ports.set_port_direction(0, PortDirection::Output, true).unwrap();
        for _ in 0..3 {
            sequencer.on_tx_tick();
        }

        let transfers = hw.dmas[0].transfers();
        assert_eq!(transfers[0].len(), DMX_MAX_FRAME_SIZE);
        assert!(transfers[0].iter().all(|&b| b == 0));
    }

    #[test]
    fn timer_expiry_in_data_phase_is_a_timing_fault() {
        let hw = FakeHardware::<1>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (mut ports, mut sequencer, _) = engine.split();

        ports.set_port_direction(0, PortDirection::Output, true).unwrap();
        for _ in 0..3 {
            sequencer.on_tx_tick();
        }
        assert_eq!(ports.transmit_state(), TxRxState::DmxData);

        // DMA never completes
        sequencer.on_tx_tick();

        assert_eq!(ports.timing_faults(), 1);
        assert_eq!(ports.transmit_state(), TxRxState::DmxInter);
        assert_eq!(
            hw.timer.scheduled().last().copied(),
            Some(TIMING_FAULT_RECOVERY_TICKS)
        );

        // Next tick starts a fresh cycle
        sequencer.on_tx_tick();
        assert_eq!(ports.transmit_state(), TxRxState::Break);
    }

    #[test]
    fn two_outputs_share_one_cadence() {
        let hw = FakeHardware::<4>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (mut ports, mut sequencer, mut framer) = engine.split();

        ports.set_period_time(0);
        ports.set_port_direction(0, PortDirection::Output, true).unwrap();
        ports.set_port_direction(1, PortDirection::Output, true).unwrap();
        ports.set_port_send_data_without_sc(0, &[1; 100]).unwrap();
        ports.set_port_send_data_without_sc(1, &[2; 400]).unwrap();

        let expected = 176 + 12 + 400 * 44 + 44;
        assert_eq!(ports.period_time(), expected);

        for _ in 0..3 {
            sequencer.on_tx_tick();
        }
        assert_eq!(hw.dmas[0].transfers()[0].len(), 101);
        assert_eq!(hw.dmas[1].transfers()[0].len(), 401);

        hw.dmas[0].complete();
        framer.on_rx_or_dma_event();
        assert_eq!(ports.transmit_state(), TxRxState::DmxData);

        hw.dmas[1].complete();
        framer.on_rx_or_dma_event();
        assert_eq!(ports.transmit_state(), TxRxState::DmxInter);

        let cycle: u32 = hw.timer.scheduled().iter().sum();
        assert_eq!(cycle, expected * 12);
    }

    #[test]
    fn port_enabled_mid_cycle_waits_for_next_break() {
        let hw = FakeHardware::<1>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (mut ports, mut sequencer, mut framer) = engine.split();

        ports.set_port_direction(0, PortDirection::Output, true).unwrap();
        ports.set_port_send_data_without_sc(0, &[7; 16]).unwrap();
        for _ in 0..3 {
            sequencer.on_tx_tick();
        }
        hw.dmas[0].complete();
        framer.on_rx_or_dma_event();

        ports.set_port_direction(0, PortDirection::Output, false).unwrap();
        ports.clear_data(0);
        let breaks = hw.uarts[0].break_log().len();

        // Restarted while the other ports are already in break
        sequencer.on_tx_tick();
        assert_eq!(ports.transmit_state(), TxRxState::Break);
        ports.set_port_direction(0, PortDirection::Output, true).unwrap();
        sequencer.on_tx_tick();
        sequencer.on_tx_tick();

        assert_eq!(ports.transmit_state(), TxRxState::DmxInter);
        assert_eq!(hw.dmas[0].transfers().len(), 1);
        assert_eq!(hw.uarts[0].break_log().len(), breaks);

        for _ in 0..3 {
            sequencer.on_tx_tick();
        }
        let transfers = hw.dmas[0].transfers();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[1].len(), DMX_MAX_FRAME_SIZE);
        assert!(transfers[1].iter().all(|&b| b == 0));
        assert_eq!(hw.uarts[0].break_log()[breaks..], [true, false]);
    }

    #[test]
    fn rate_tick_reports_packets_per_interval() {
        let hw = FakeHardware::<1>::new();
        let mut engine = Engine::new(hw.peripherals(), EngineConfig::new()).unwrap();
        let (mut ports, mut sequencer, mut framer) = engine.split();

        ports.set_port_direction(0, PortDirection::Input, true).unwrap();
        for _ in 0..3 {
            hw.uarts[0].push_break();
            hw.uarts[0].push_bytes(&[0x00, 1, 2, 3]);
            framer.on_rx_or_dma_event();
        }

        sequencer.on_rate_tick();
        assert_eq!(ports.get_updates_per_second(0), 3);

        sequencer.on_rate_tick();
        assert_eq!(ports.get_updates_per_second(0), 0);
    }
}
