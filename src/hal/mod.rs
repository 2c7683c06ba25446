//! Hardware Abstraction Layer
//!
//! Minimal capability interfaces the engine is written against. A platform
//! crate implements them with register access; host tests implement them
//! with fakes.
//!
//! # Modules
//!
//! - [`uart`]: [`UartPort`] plus parsed status words
//! - [`dma`]: [`DmaChannel`] and the [`TxDescriptor`] it consumes
//! - [`timer`]: [`Timer`] for the sequencer and the microsecond counter
//!
//! # embedded-hal Integration
//!
//! Transceiver direction pins use `embedded_hal::digital::OutputPin` and the
//! synchronous RDM path takes any `embedded_hal::delay::DelayNs`, so pins and
//! delays from the target HAL plug in directly.

pub mod dma;
pub mod timer;
pub mod uart;

pub use dma::{DmaChannel, TxDescriptor};
pub use timer::Timer;
pub use uart::{FifoMode, InterruptId, LineStatus, UartPort, UartStatus, line_control};
