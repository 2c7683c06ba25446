//! Frame buffers held in the per-UART rings.

use crate::constants::{
    DMX_BUFFER_SIZE, DMX_MAX_CHANNELS, DMX_MAX_FRAME_SIZE, RDM_BUFFER_SIZE,
    RDM_DISCOVERY_PREAMBLE, RDM_MESSAGE_LENGTH_OFFSET, RDM_START_CODE,
};

// =============================================================================
// Transmit Slot
// =============================================================================

/// One outgoing DMX frame: start code plus channel data.
#[derive(Clone)]
pub(crate) struct TxSlot {
    data: [u8; DMX_BUFFER_SIZE],
    len: usize,
}

impl TxSlot {
    /// Zeroed frame of full length
    pub(crate) const fn new() -> Self {
        Self {
            data: [0; DMX_BUFFER_SIZE],
            len: DMX_MAX_FRAME_SIZE,
        }
    }

    /// Store `start_code` followed by `channels`
    pub(crate) fn fill(&mut self, start_code: u8, channels: &[u8]) {
        let len = channels.len().min(DMX_MAX_CHANNELS);
        self.data[0] = start_code;
        self.data[1..=len].copy_from_slice(&channels[..len]);
        self.len = len + 1;
    }

    /// Zero the frame and restore full length
    pub(crate) fn clear(&mut self) {
        self.data.fill(0);
        self.len = DMX_MAX_FRAME_SIZE;
    }

    /// Bytes handed to DMA
    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

// =============================================================================
// Received DMX Frame
// =============================================================================

/// A DMX packet decoded by the receive framer.
pub struct DmxFrame {
    data: [u8; DMX_BUFFER_SIZE],
    slots_in_packet: usize,
}

impl DmxFrame {
    pub(crate) const fn new() -> Self {
        Self {
            data: [0; DMX_BUFFER_SIZE],
            slots_in_packet: 0,
        }
    }

    #[inline]
    pub(crate) fn set_byte(&mut self, index: usize, byte: u8) {
        self.data[index] = byte;
    }

    #[inline]
    pub(crate) fn set_slots_in_packet(&mut self, slots: usize) {
        self.slots_in_packet = slots.min(DMX_MAX_CHANNELS);
    }

    /// Start code of the packet (always `0x00` for frames queued by the framer)
    #[inline]
    pub fn start_code(&self) -> u8 {
        self.data[0]
    }

    /// Number of channel slots received after the start code
    #[inline]
    pub fn slots_in_packet(&self) -> usize {
        self.slots_in_packet
    }

    /// Channel values, without the start code
    #[inline]
    pub fn slots(&self) -> &[u8] {
        &self.data[1..=self.slots_in_packet]
    }

    /// Start code followed by the channel values
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..=self.slots_in_packet]
    }
}

impl core::fmt::Debug for DmxFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DmxFrame")
            .field("start_code", &self.start_code())
            .field("slots_in_packet", &self.slots_in_packet)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Received RDM Frame
// =============================================================================

/// An RDM message or discovery response accepted by the receive framer.
pub struct RdmFrame {
    data: [u8; RDM_BUFFER_SIZE],
    len: usize,
}

impl RdmFrame {
    pub(crate) const fn new() -> Self {
        Self {
            data: [0; RDM_BUFFER_SIZE],
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn set_byte(&mut self, index: usize, byte: u8) {
        self.data[index] = byte;
    }

    #[inline]
    pub(crate) fn byte(&self, index: usize) -> u8 {
        self.data[index]
    }

    #[inline]
    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len.min(RDM_BUFFER_SIZE);
    }

    /// Raw bytes as received, checksum or encoded checksum included
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Number of bytes received
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length frame
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the frame is a discovery response rather than a message
    #[inline]
    pub fn is_discovery_response(&self) -> bool {
        self.len > 0 && self.data[0] == RDM_DISCOVERY_PREAMBLE
    }

    /// Message length field of an RDM message (`None` for discovery responses)
    pub fn message_length(&self) -> Option<usize> {
        if self.len > RDM_MESSAGE_LENGTH_OFFSET && self.data[0] == RDM_START_CODE {
            Some(self.data[RDM_MESSAGE_LENGTH_OFFSET] as usize)
        } else {
            None
        }
    }
}

impl core::fmt::Debug for RdmFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RdmFrame")
            .field("len", &self.len)
            .field("discovery", &self.is_discovery_response())
            .finish_non_exhaustive()
    }
}
