//! Configuration types for the DMX engine

use crate::constants::{
    BREAK_TIME_MIN_US, BREAK_TIME_TYPICAL_US, BREAK_TO_BREAK_TIME_MIN_US, DMX_SLOT_TIME_US,
    MAB_TIME_MAX_US, MAB_TIME_MIN_US, PERIOD_DEFAULT_US, TIMER_TICKS_PER_US,
};
use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Port Direction
// =============================================================================

/// Transceiver direction of a logical port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortDirection {
    /// Port transmits DMX (direction pin high)
    Output,
    /// Port receives DMX/RDM (direction pin low)
    #[default]
    Input,
}

/// What a logical port is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortRole {
    /// Transmitting on the shared cadence
    Output,
    /// Receiving and decoding frames
    Input,
    /// Direction set but data stopped
    #[default]
    Disabled,
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration for an engine sized for `PORTS` UARTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig<const PORTS: usize> {
    /// UART index driving each logical port
    pub port_map: [u8; PORTS],
    /// Number of logical ports in use (`1..=PORTS`)
    pub port_count: usize,
    /// Transmitted break time in microseconds
    pub break_time_us: u32,
    /// Transmitted mark-after-break time in microseconds
    pub mab_time_us: u32,
    /// Requested break-to-break period in microseconds (0 = as fast as allowed)
    pub period_us: u32,
    /// Sequencer timer ticks per microsecond
    pub ticks_per_us: u32,
}

impl<const PORTS: usize> Default for EngineConfig<PORTS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const PORTS: usize> EngineConfig<PORTS> {
    /// Create a configuration with an identity port map and default timing
    #[must_use]
    pub const fn new() -> Self {
        let mut port_map = [0u8; PORTS];
        let mut port = 0;
        while port < PORTS {
            port_map[port] = port as u8;
            port += 1;
        }
        Self {
            port_map,
            port_count: PORTS,
            break_time_us: BREAK_TIME_TYPICAL_US,
            mab_time_us: MAB_TIME_MIN_US,
            period_us: PERIOD_DEFAULT_US,
            ticks_per_us: TIMER_TICKS_PER_US,
        }
    }

    /// Set the port to UART map
    #[must_use]
    pub const fn with_port_map(mut self, port_map: [u8; PORTS]) -> Self {
        self.port_map = port_map;
        self
    }

    /// Set the number of logical ports
    #[must_use]
    pub const fn with_port_count(mut self, port_count: usize) -> Self {
        self.port_count = port_count;
        self
    }

    /// Set the break time (raised to the 92 us minimum)
    #[must_use]
    pub const fn with_break_time(mut self, break_time_us: u32) -> Self {
        self.break_time_us = clamp_break_time(break_time_us);
        self
    }

    /// Set the mark-after-break time (clamped to 12 us ..= 1 s)
    #[must_use]
    pub const fn with_mab_time(mut self, mab_time_us: u32) -> Self {
        self.mab_time_us = clamp_mab_time(mab_time_us);
        self
    }

    /// Set the requested period (0 = automatic)
    #[must_use]
    pub const fn with_period_time(mut self, period_us: u32) -> Self {
        self.period_us = period_us;
        self
    }

    /// Set the sequencer timer resolution
    #[must_use]
    pub const fn with_ticks_per_us(mut self, ticks_per_us: u32) -> Self {
        self.ticks_per_us = if ticks_per_us == 0 { 1 } else { ticks_per_us };
        self
    }

    /// Check port count and port map.
    ///
    /// Every used port must map to a distinct UART below `PORTS`.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port_count == 0 || self.port_count > PORTS {
            return Err(ConfigError::InvalidPortCount);
        }

        let mut seen = 0u32;
        for &uart in &self.port_map[..self.port_count] {
            let uart = uart as usize;
            if uart >= PORTS || uart >= u32::BITS as usize {
                return Err(ConfigError::InvalidPortMap);
            }
            if seen & (1 << uart) != 0 {
                return Err(ConfigError::InvalidPortMap);
            }
            seen |= 1 << uart;
        }

        Ok(())
    }
}

const fn clamp_break_time(us: u32) -> u32 {
    if us < BREAK_TIME_MIN_US {
        BREAK_TIME_MIN_US
    } else {
        us
    }
}

const fn clamp_mab_time(us: u32) -> u32 {
    if us < MAB_TIME_MIN_US {
        MAB_TIME_MIN_US
    } else if us > MAB_TIME_MAX_US {
        MAB_TIME_MAX_US
    } else {
        us
    }
}

// =============================================================================
// Transmit Timing
// =============================================================================

/// Break, MAB and period shared by all output ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransmitTiming {
    break_us: u32,
    mab_us: u32,
    period_requested_us: u32,
    period_us: u32,
    ticks_per_us: u32,
}

impl TransmitTiming {
    pub(crate) fn from_config<const PORTS: usize>(config: &EngineConfig<PORTS>) -> Self {
        Self {
            break_us: clamp_break_time(config.break_time_us),
            mab_us: clamp_mab_time(config.mab_time_us),
            period_requested_us: config.period_us,
            period_us: config.period_us,
            ticks_per_us: config.ticks_per_us.max(1),
        }
    }

    pub(crate) fn set_break_us(&mut self, us: u32) {
        self.break_us = clamp_break_time(us);
    }

    pub(crate) fn set_mab_us(&mut self, us: u32) {
        self.mab_us = clamp_mab_time(us);
    }

    pub(crate) fn set_period_requested_us(&mut self, us: u32) {
        self.period_requested_us = us;
    }

    pub(crate) fn break_us(&self) -> u32 {
        self.break_us
    }

    pub(crate) fn mab_us(&self) -> u32 {
        self.mab_us
    }

    pub(crate) fn period_requested_us(&self) -> u32 {
        self.period_requested_us
    }

    pub(crate) fn period_us(&self) -> u32 {
        self.period_us
    }

    pub(crate) fn ticks_per_us(&self) -> u32 {
        self.ticks_per_us
    }

    /// Wire time of a frame whose longest output carries `max_channels`
    pub(crate) fn package_us(&self, max_channels: usize) -> u32 {
        let slots = (max_channels as u32).saturating_mul(DMX_SLOT_TIME_US);
        self.break_us
            .saturating_add(self.mab_us)
            .saturating_add(slots)
            .saturating_add(DMX_SLOT_TIME_US)
    }

    /// Recompute the effective period for the longest output port.
    ///
    /// Returns the new period in microseconds.
    pub(crate) fn recompute(&mut self, max_channels: usize) -> u32 {
        self.period_us = self
            .period_requested_us
            .max(BREAK_TO_BREAK_TIME_MIN_US)
            .max(self.package_us(max_channels));
        self.period_us
    }

    pub(crate) fn break_ticks(&self) -> u32 {
        self.break_us.saturating_mul(self.ticks_per_us)
    }

    pub(crate) fn mab_ticks(&self) -> u32 {
        self.mab_us.saturating_mul(self.ticks_per_us)
    }

    /// Ticks from the end of MAB to the next break
    pub(crate) fn data_ticks(&self) -> u32 {
        self.period_us
            .saturating_mul(self.ticks_per_us)
            .saturating_sub(self.break_ticks())
            .saturating_sub(self.mab_ticks())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Default Value Tests
    // =========================================================================

    #[test]
    fn config_default_values() {
        let config = EngineConfig::<4>::new();

        assert_eq!(config.port_map, [0, 1, 2, 3]);
        assert_eq!(config.port_count, 4);
        assert_eq!(config.break_time_us, BREAK_TIME_TYPICAL_US);
        assert_eq!(config.mab_time_us, MAB_TIME_MIN_US);
        assert_eq!(config.period_us, PERIOD_DEFAULT_US);
        assert_eq!(config.ticks_per_us, TIMER_TICKS_PER_US);
    }

    #[test]
    fn config_default_trait_matches_new() {
        assert_eq!(EngineConfig::<2>::default(), EngineConfig::<2>::new());
    }

    #[test]
    fn port_direction_default_is_input() {
        assert_eq!(PortDirection::default(), PortDirection::Input);
        assert_eq!(PortRole::default(), PortRole::Disabled);
    }

    // =========================================================================
    // Builder Pattern Tests
    // =========================================================================

    #[test]
    fn config_builder_clamps_timing() {
        let config = EngineConfig::<4>::new()
            .with_break_time(50)
            .with_mab_time(2)
            .with_ticks_per_us(0);

        assert_eq!(config.break_time_us, BREAK_TIME_MIN_US);
        assert_eq!(config.mab_time_us, MAB_TIME_MIN_US);
        assert_eq!(config.ticks_per_us, 1);

        let config = EngineConfig::<4>::new().with_mab_time(2_000_000);
        assert_eq!(config.mab_time_us, MAB_TIME_MAX_US);
    }

    #[test]
    fn config_builder_chaining() {
        let config = EngineConfig::<4>::new()
            .with_port_map([1, 2, 3, 0])
            .with_port_count(3)
            .with_break_time(200)
            .with_mab_time(20)
            .with_period_time(0);

        assert_eq!(config.port_map, [1, 2, 3, 0]);
        assert_eq!(config.port_count, 3);
        assert_eq!(config.break_time_us, 200);
        assert_eq!(config.mab_time_us, 20);
        assert_eq!(config.period_us, 0);
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn validate_accepts_permutation() {
        let config = EngineConfig::<4>::new().with_port_map([1, 2, 3, 0]);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_out_of_range_uart() {
        let config = EngineConfig::<4>::new().with_port_map([0, 1, 2, 4]);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPortMap));
    }

    #[test]
    fn validate_rejects_duplicate_uart() {
        let config = EngineConfig::<4>::new().with_port_map([0, 1, 1, 3]);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPortMap));
    }

    #[test]
    fn validate_ignores_unused_map_entries() {
        let config = EngineConfig::<4>::new()
            .with_port_map([2, 1, 1, 1])
            .with_port_count(2);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_bad_port_count() {
        let config = EngineConfig::<4>::new().with_port_count(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPortCount));

        let config = EngineConfig::<4>::new().with_port_count(5);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPortCount));
    }

    // =========================================================================
    // Timing Tests
    // =========================================================================

    #[test]
    fn period_follows_longest_output() {
        let mut timing = TransmitTiming::from_config(&EngineConfig::<4>::new().with_period_time(0));
        let period = timing.recompute(400);
        assert_eq!(period, 176 + 12 + 400 * 44 + 44);
    }

    #[test]
    fn period_respects_break_to_break_minimum() {
        let mut timing = TransmitTiming::from_config(&EngineConfig::<4>::new().with_period_time(0));
        assert_eq!(timing.recompute(0), BREAK_TO_BREAK_TIME_MIN_US);
    }

    #[test]
    fn period_keeps_longer_request() {
        let mut timing = TransmitTiming::from_config(&EngineConfig::<4>::new());
        assert_eq!(timing.recompute(24), PERIOD_DEFAULT_US);

        // A full universe needs more than a requested 20 ms
        timing.set_period_requested_us(20_000);
        assert_eq!(timing.recompute(512), 176 + 12 + 512 * 44 + 44);
    }

    #[test]
    fn tick_conversion() {
        let mut timing = TransmitTiming::from_config(&EngineConfig::<4>::new().with_period_time(0));
        timing.recompute(100);

        assert_eq!(timing.break_ticks(), 176 * 12);
        assert_eq!(timing.mab_ticks(), 12 * 12);
        assert_eq!(
            timing.data_ticks(),
            timing.period_us() * 12 - 176 * 12 - 12 * 12
        );
    }

    #[test]
    fn timing_setters_clamp() {
        let mut timing = TransmitTiming::from_config(&EngineConfig::<4>::new());
        timing.set_break_us(10);
        timing.set_mab_us(0);
        assert_eq!(timing.break_us(), BREAK_TIME_MIN_US);
        assert_eq!(timing.mab_us(), MAB_TIME_MIN_US);
    }
}
