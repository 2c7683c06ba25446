//! Synchronization Support
//!
//! Critical-section protected storage for handing the engine's context
//! handles to interrupt handlers:
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`], ISR-safe
//!   interior mutability
//! - **Shared slots** (`shared`): [`SharedHandle`], a static slot holding a
//!   [`TxSequencer`](crate::TxSequencer), [`RxFramer`](crate::RxFramer) or
//!   [`DmxPorts`](crate::DmxPorts)
//!
//! The engine itself is lock-free; these types only cover getting a handle
//! from `main` into an interrupt handler.
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables this module. The target HAL provides the
//!   critical-section implementation.

mod primitives;

pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::SharedHandle;
