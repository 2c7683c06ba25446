//! Multi-port DMX-512/RDM Transceiver Engine
//!
//! A `no_std`, `no_alloc` engine that drives several DMX-512 ports from one
//! timer and one shared UART/DMA interrupt.
//!
//! Every output port shares one break, mark-after-break and data cadence, so
//! all universes start their frames together. Input ports decode DMX packets,
//! RDM messages and RDM discovery responses byte by byte in interrupt context
//! and queue them for the application.
//!
//! # Architecture
//!
//! The engine is split into three handles, one per execution context:
//!
//! 1. **Application** ([`DmxPorts`]): buffered send/receive, direction
//!    control, transmit timing and synchronous raw RDM
//! 2. **Timer interrupt** ([`TxSequencer`]): walks break, MAB and data phases
//!    for every output port at once
//! 3. **UART/DMA interrupt** ([`RxFramer`]): tracks DMA completion and
//!    decodes received bytes
//!
//! Hardware is reached through the capability traits in [`hal`]; direction
//! pins and delays come from `embedded-hal`.
//!
//! ## Standard Compliance
//!
//! - **ANSI E1.11 (DMX-512A)**: 250 kbaud 8N2, break/MAB timing, 512 slots
//! - **ANSI E1.20 (RDM)**: message framing, checksum, discovery responses
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting and log output
//! - `critical-section`: Enable [`sync::SharedHandle`] for reaching the
//!   context handles from interrupt handlers
//!
//! # Example
//!
//! ```ignore
//! use dmx_multiport::boards::OrangePiOne;
//! use dmx_multiport::{Engine, Peripherals, PortDirection};
//!
//! let peripherals = Peripherals { uarts, dmas, timer, direction_pins };
//! let engine = ENGINE.init(Engine::new(peripherals, OrangePiOne::config())?);
//! let (mut ports, mut sequencer, framer) = engine.split();
//!
//! ports.set_port_direction(0, PortDirection::Output, true)?;
//! ports.set_port_direction(1, PortDirection::Input, true)?;
//! sequencer.start();
//!
//! loop {
//!     ports.set_port_send_data_without_sc(0, &levels)?;
//!     if let Some(frame) = ports.get_dmx_available(1) {
//!         process(frame.slots());
//!     }
//! }
//! ```
//!
//! # Memory Requirements
//!
//! Per UART: four 516-byte transmit slots, four receive DMX frames and four
//! receive RDM frames, about 6 KB. DMA reads transmit slots in place, so the
//! engine must live in a `static` while the sequencer runs.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]
// =============================================================================
// Modules
// =============================================================================

pub mod boards;
pub mod constants;
pub mod driver;
pub mod error;
pub mod hal;
pub mod rdm;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{EngineConfig, PortDirection, PortRole};
pub use driver::engine::{Engine, Peripherals};
pub use driver::frame::{DmxFrame, RdmFrame};
pub use driver::framer::RxFramer;
pub use driver::ports::DmxPorts;
pub use driver::sequencer::TxSequencer;
pub use driver::state::{TxRxState, UartState};
pub use error::{ConfigError, ConfigResult, Error, IoError, IoResult, Result};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::{CriticalSectionCell, SharedHandle};
