//! Atomic cells holding state machine values shared between contexts.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::driver::state::{TxRxState, UartState};

/// [`TxRxState`] stored in an `AtomicU8`.
pub(crate) struct AtomicTxRxState(AtomicU8);

impl AtomicTxRxState {
    pub(crate) const fn new(state: TxRxState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub(crate) fn load(&self) -> TxRxState {
        TxRxState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn store(&self, state: TxRxState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move from `current` to `new`; returns whether the swap happened
    #[inline]
    pub(crate) fn transition(&self, current: TxRxState, new: TxRxState) -> bool {
        self.0
            .compare_exchange(
                current as u8,
                new as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// [`UartState`] stored in an `AtomicU8`.
pub(crate) struct AtomicUartState(AtomicU8);

impl AtomicUartState {
    pub(crate) const fn new(state: UartState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub(crate) fn load(&self) -> UartState {
        UartState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn store(&self, state: UartState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
