//! Core engine components.
//!
//! - [`config`] - Configuration builder and port direction types
//! - [`engine`] - Engine ownership and the context split
//! - [`ports`] - Application API: send, receive, direction, timing
//! - [`sequencer`] - Transmit timing sequencer (timer interrupt)
//! - [`framer`] - Receive framer and DMA completion tracker (fast interrupt)
//! - [`frame`] - Received DMX and RDM frames
//! - [`state`] - Sequencer and decoder state vocabulary
//!
//! # Example
//!
//! ```ignore
//! use dmx_multiport::driver::{Engine, EngineConfig, PortDirection};
//!
//! let engine = ENGINE.init(Engine::new(peripherals, EngineConfig::new())?);
//! let (mut ports, mut sequencer, framer) = engine.split();
//!
//! ports.set_port_direction(0, PortDirection::Output, true)?;
//! ports.set_port_send_data_without_sc(0, &levels)?;
//! sequencer.start();
//! ```

// Submodules
pub mod config;
pub mod engine;
pub mod frame;
pub mod framer;
pub mod ports;
pub mod sequencer;
pub mod state;

// Re-exports for convenience
pub use config::{EngineConfig, PortDirection, PortRole};
pub use engine::{Engine, Peripherals};
pub use frame::{DmxFrame, RdmFrame};
pub use framer::RxFramer;
pub use ports::DmxPorts;
pub use sequencer::TxSequencer;
pub use state::{TxRxState, UartState};
