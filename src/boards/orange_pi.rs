//! Orange Pi (Allwinner H3) DMX node boards.
//!
//! Both boards carry RS-485 transceivers whose driver-enable inputs are wired
//! to the lines labelled A to D on the DMX add-on board.
//!
//! | Port | Orange Pi One | Orange Pi Zero |
//! |------|---------------|----------------|
//! | 0    | UART1, line A | UART2, line B  |
//! | 1    | UART2, line B | UART1, line C  |
//! | 2    | UART3, line C | -              |
//! | 3    | UART0, line D | -              |

use crate::driver::config::EngineConfig;

/// Transceiver direction line on the DMX add-on board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DirectionLine {
    /// Output A
    A,
    /// Output B
    B,
    /// Output C
    C,
    /// Output D
    D,
}

/// Orange Pi One: four DMX ports.
///
/// UART indices are the H3 UART numbers, so the platform glue hands the
/// engine `[UART0, UART1, UART2, UART3]`.
pub struct OrangePiOne;

impl OrangePiOne {
    /// Number of UARTs the engine must be sized for
    pub const PORTS: usize = 4;

    /// Logical port to UART index
    pub const PORT_MAP: [u8; OrangePiOne::PORTS] = [1, 2, 3, 0];

    /// H3 UART placed at each UART index
    pub const UARTS: [u8; OrangePiOne::PORTS] = [0, 1, 2, 3];

    /// Direction line of each logical port
    pub const DIRECTION_LINES: [DirectionLine; OrangePiOne::PORTS] = [
        DirectionLine::A,
        DirectionLine::B,
        DirectionLine::C,
        DirectionLine::D,
    ];

    /// Engine configuration with the board's port map and default timing
    pub const fn config() -> EngineConfig<{ OrangePiOne::PORTS }> {
        EngineConfig::new()
            .with_port_map(Self::PORT_MAP)
            .with_port_count(Self::PORTS)
    }
}

/// Orange Pi Zero: two DMX ports.
///
/// UART0 is the console on this board. The platform glue hands the engine
/// `[UART2, UART1]`.
pub struct OrangePiZero;

impl OrangePiZero {
    /// Number of UARTs the engine must be sized for
    pub const PORTS: usize = 2;

    /// Logical port to UART index
    pub const PORT_MAP: [u8; OrangePiZero::PORTS] = [0, 1];

    /// H3 UART placed at each UART index
    pub const UARTS: [u8; OrangePiZero::PORTS] = [2, 1];

    /// Direction line of each logical port
    pub const DIRECTION_LINES: [DirectionLine; OrangePiZero::PORTS] = [DirectionLine::B, DirectionLine::C];

    /// Engine configuration with the board's port map and default timing
    pub const fn config() -> EngineConfig<{ OrangePiZero::PORTS }> {
        EngineConfig::new()
            .with_port_map(Self::PORT_MAP)
            .with_port_count(Self::PORTS)
    }
}
