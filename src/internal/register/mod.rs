//! Register bit definitions
//!
//! The engine never touches memory-mapped registers itself; platform code
//! behind the [`crate::hal`] traits does. These definitions let the HAL layer
//! interpret the raw values those implementations hand back.

pub mod uart;
