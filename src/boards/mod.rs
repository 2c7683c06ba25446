//! Board-specific port maps.
//!
//! Ready-made configurations for the DMX node boards the engine ships on.
//! Each board describes, as data:
//!
//! - how logical ports map to UART indices ([`EngineConfig::port_map`])
//! - which hardware UART the platform glue places at each UART index
//! - which transceiver direction line belongs to each logical port
//!
//! # Supported Boards
//!
//! - [`OrangePiOne`]: four ports on UART1, UART2, UART3 and UART0
//! - [`OrangePiZero`]: two ports on UART2 and UART1
//!
//! [`EngineConfig::port_map`]: crate::EngineConfig::port_map

mod orange_pi;

pub use orange_pi::{DirectionLine, OrangePiOne, OrangePiZero};
