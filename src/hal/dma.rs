//! DMA capability interface
//!
//! Each output-capable UART owns one DMA channel that streams a TX slot into
//! the UART transmit FIFO. The sequencer programs a [`TxDescriptor`] during
//! the break phase and starts the channel after mark-after-break; the fast
//! interrupt collects completions.

use core::ptr;

/// Source and length of one memory-to-UART transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxDescriptor {
    src: *const u8,
    len: usize,
}

impl TxDescriptor {
    /// Descriptor pointing nowhere
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            src: ptr::null(),
            len: 0,
        }
    }

    /// Point the descriptor at `bytes`
    #[inline]
    pub(crate) fn point_at(&mut self, bytes: &[u8]) {
        self.src = bytes.as_ptr();
        self.len = bytes.len();
    }

    /// Source address
    #[inline]
    pub fn source(&self) -> *const u8 {
        self.src
    }

    /// Transfer length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no source has been programmed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.src.is_null() || self.len == 0
    }

    /// View the described bytes.
    ///
    /// # Safety
    ///
    /// The slot the descriptor was pointed at must still be alive and not be
    /// rewritten for the lifetime `'a`.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.is_empty() {
            return &[];
        }
        // SAFETY: the caller guarantees the source slot outlives `'a`.
        unsafe { core::slice::from_raw_parts(self.src, self.len) }
    }
}

impl Default for TxDescriptor {
    fn default() -> Self {
        Self::empty()
    }
}

// SAFETY: a descriptor only carries an address; reading through it is unsafe
// and covered by `as_slice` and `DmaChannel::start`.
unsafe impl Send for TxDescriptor {}

/// One DMA channel feeding one UART transmitter.
pub trait DmaChannel {
    /// Start streaming the described bytes to the UART.
    ///
    /// # Safety
    ///
    /// The descriptor's source must stay valid until completion is reported
    /// through [`DmaChannel::take_completion`]. The engine guarantees this by
    /// pointing only at its own TX slots, which live as long as the engine.
    unsafe fn start(&self, descriptor: &TxDescriptor);

    /// Return `true` once per finished transfer and acknowledge it.
    fn take_completion(&self) -> bool;
}
