//! Centralized Constants
//!
//! Single source of truth for DMX-512 (ANSI E1.11) and RDM (ANSI E1.20)
//! framing values, transmit timing limits and engine buffer dimensions.
//!
//! # Organization
//!
//! - **Protocol**: start codes and frame sizes
//! - **Transmit timing**: break, MAB and period limits in microseconds
//! - **Timer**: tick conversion and fixed intervals
//! - **Buffers**: ring depths and slot sizes
//!
//! UART register bit definitions live in `internal::register::uart`.

// =============================================================================
// DMX Protocol
// =============================================================================

/// Null start code of a DMX data packet
pub const DMX_START_CODE: u8 = 0x00;

/// Maximum number of channels in a DMX packet
pub const DMX_MAX_CHANNELS: usize = 512;

/// Start code plus a full universe
pub const DMX_MAX_FRAME_SIZE: usize = DMX_MAX_CHANNELS + 1;

/// Transmission time of a single slot at 250 kbaud, 8N2 (11 bits)
pub const DMX_SLOT_TIME_US: u32 = 44;

// =============================================================================
// RDM Protocol
// =============================================================================

/// RDM start code
pub const RDM_START_CODE: u8 = 0xCC;

/// RDM sub-start-code (second byte of every RDM message)
pub const RDM_SUB_START_CODE: u8 = 0x01;

/// Offset of the message length field (counts start code, excludes checksum)
pub const RDM_MESSAGE_LENGTH_OFFSET: usize = 2;

/// Smallest legal RDM message length (header without parameter data)
pub const RDM_MIN_MESSAGE_LENGTH: usize = 24;

/// Size of the trailing checksum
pub const RDM_CHECKSUM_SIZE: usize = 2;

/// Size of a UID
pub const RDM_UID_SIZE: usize = 6;

/// Discovery response preamble byte
pub const RDM_DISCOVERY_PREAMBLE: u8 = 0xFE;

/// Discovery response preamble separator
pub const RDM_DISCOVERY_SEPARATOR: u8 = 0xAA;

/// Maximum number of preamble bytes before the separator
pub const RDM_DISCOVERY_PREAMBLE_MAX: usize = 7;

/// Encoded UID length in a discovery response (each byte sent twice)
pub const RDM_DISCOVERY_EUID_SIZE: usize = 2 * RDM_UID_SIZE;

/// Encoded checksum length in a discovery response
pub const RDM_DISCOVERY_ECS_SIZE: usize = 4;

/// Full discovery response: preamble, separator, EUID and encoded checksum
pub const RDM_DISCOVERY_RESPONSE_SIZE: usize =
    RDM_DISCOVERY_PREAMBLE_MAX + 1 + RDM_DISCOVERY_EUID_SIZE + RDM_DISCOVERY_ECS_SIZE;

/// Break time for synchronous RDM transmission
pub const RDM_TRANSMIT_BREAK_TIME_US: u32 = 176;

/// Mark-after-break time for synchronous RDM transmission
pub const RDM_TRANSMIT_MAB_TIME_US: u32 = 12;

// =============================================================================
// Transmit Timing
// =============================================================================

/// Minimum transmitted break time
pub const BREAK_TIME_MIN_US: u32 = 92;

/// Typical transmitted break time (engine default)
pub const BREAK_TIME_TYPICAL_US: u32 = 176;

/// Minimum transmitted mark-after-break time
pub const MAB_TIME_MIN_US: u32 = 12;

/// Maximum transmitted mark-after-break time
pub const MAB_TIME_MAX_US: u32 = 1_000_000;

/// Default refresh rate in Hz
pub const REFRESH_RATE_DEFAULT_HZ: u32 = 40;

/// Default requested break-to-break period
pub const PERIOD_DEFAULT_US: u32 = 1_000_000 / REFRESH_RATE_DEFAULT_HZ;

/// Minimum break-to-break time allowed on the wire
pub const BREAK_TO_BREAK_TIME_MIN_US: u32 = 1204;

// =============================================================================
// Timer
// =============================================================================

/// Default timer ticks per microsecond (24 MHz oscillator, prescaler 2)
pub const TIMER_TICKS_PER_US: u32 = 12;

/// Delay before the first sequencer tick after start
pub const STARTUP_DELAY_US: u32 = 1000;

/// Delay before resuming the cycle after a timing fault
pub const TIMING_FAULT_RECOVERY_TICKS: u32 = 12;

// =============================================================================
// Buffers
// =============================================================================

/// Default number of ports (and UARTs) an engine is sized for
pub const DEFAULT_PORTS: usize = 4;

/// Bytes per DMX slot buffer (start code + 512 channels, multiple of 4)
pub const DMX_BUFFER_SIZE: usize = 516;

/// Bytes per RDM slot buffer
pub const RDM_BUFFER_SIZE: usize = 512;

/// TX payload ring depth per UART
pub const TX_RING_DEPTH: usize = 4;

/// RX DMX frame ring depth per UART
pub const DMX_RX_RING_DEPTH: usize = 4;

/// RX RDM frame ring depth per UART
pub const RDM_RX_RING_DEPTH: usize = 4;
