//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`register`]: 16550 UART register bit definitions
//! - [`ring`]: single-producer/single-consumer slot ring behind every port buffer
//! - [`state`]: atomic cells for the state machines shared between contexts
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod register;
pub(crate) mod ring;
pub(crate) mod state;
