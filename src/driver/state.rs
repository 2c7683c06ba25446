//! State machine vocabulary shared by the sequencer, the framer and the API.

/// Phase of a transmit or receive state machine.
///
/// The transmit sequencer walks `Idle/DmxInter -> Break -> Mab -> DmxData`.
/// Each receiving UART walks the remaining states while decoding bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TxRxState {
    /// Nothing in progress
    #[default]
    Idle = 0,
    /// Break flagged on the line; the break character is next
    PreBreak,
    /// Break phase (TX) or break character consumed (RX)
    Break,
    /// Mark-after-break phase
    Mab,
    /// DMX slots on the wire
    DmxData,
    /// RDM message body
    RdmData,
    /// RDM checksum high byte expected
    ChecksumH,
    /// RDM checksum low byte expected
    ChecksumL,
    /// RDM discovery response preamble
    RdmDiscFe,
    /// RDM discovery response encoded UID
    RdmDiscEuid,
    /// RDM discovery response encoded checksum
    RdmDiscEcs,
    /// Gap between the end of one frame and the next break
    DmxInter,
}

impl TxRxState {
    /// Decode a raw discriminant; unknown values decode as `Idle`
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => TxRxState::PreBreak,
            2 => TxRxState::Break,
            3 => TxRxState::Mab,
            4 => TxRxState::DmxData,
            5 => TxRxState::RdmData,
            6 => TxRxState::ChecksumH,
            7 => TxRxState::ChecksumL,
            8 => TxRxState::RdmDiscFe,
            9 => TxRxState::RdmDiscEuid,
            10 => TxRxState::RdmDiscEcs,
            11 => TxRxState::DmxInter,
            _ => TxRxState::Idle,
        }
    }

    /// True while the transmit sequencer may be driving the line
    #[inline]
    pub const fn is_transmitting(&self) -> bool {
        !matches!(self, TxRxState::Idle | TxRxState::DmxInter)
    }
}

/// What a UART is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UartState {
    /// Neither transmitting nor receiving
    #[default]
    Idle = 0,
    /// Driven by the transmit sequencer
    Tx,
    /// Decoded by the receive framer
    Rx,
}

impl UartState {
    /// Decode a raw discriminant; unknown values decode as `Idle`
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => UartState::Tx,
            2 => UartState::Rx,
            _ => UartState::Idle,
        }
    }
}
