//! UART capability interface
//!
//! The engine drives each DMX port through a 16550-style UART. Platform code
//! implements [`UartPort`] with volatile register access; the engine only
//! ever sees parsed status words.
//!
//! All methods take `&self`: a UART is touched from the timer interrupt
//! (break control), the fast interrupt (receive) and the application
//! (direction switches, raw RDM), exactly like the memory-mapped registers
//! behind it.

use crate::internal::register::uart::{
    FCR_EFIFO, FCR_RRESET, FCR_TRESET, FCR_TRIG1, IER_ERBFI, IIR_IID_MASK, IIR_IID_NONE,
    IIR_IID_RD, IIR_IID_TIME_OUT, LCR_8_N_2, LCR_BC, LSR_BI, LSR_DR, LSR_FE, LSR_OE, LSR_PE,
    LSR_TEMT, LSR_THRE, USR_BUSY, USR_RFNE, USR_TFE, USR_TFNF,
};

// =============================================================================
// UART Trait
// =============================================================================

/// Register-level access to one UART.
pub trait UartPort {
    /// Assert (`true`) or release (`false`) the line break condition.
    ///
    /// Implementations write [`line_control`] to LCR.
    fn set_line_break(&self, enable: bool);

    /// Write one byte to the transmit holding register.
    fn write_byte(&self, byte: u8);

    /// Read one byte from the receive buffer register.
    fn read_byte(&self) -> u8;

    /// Raw line status register (LSR).
    fn line_status_raw(&self) -> u32;

    /// Raw UART status register (USR).
    fn uart_status_raw(&self) -> u32;

    /// Raw interrupt identification register (IIR).
    fn interrupt_id_raw(&self) -> u32;

    /// Number of characters waiting in the receive FIFO.
    fn rx_fifo_level(&self) -> usize;

    /// Program FIFO control and interrupt enable for the given mode.
    fn set_fifo_mode(&self, mode: FifoMode);

    /// Parsed line status.
    #[inline]
    fn line_status(&self) -> LineStatus {
        LineStatus::from_raw(self.line_status_raw())
    }

    /// Parsed UART status.
    #[inline]
    fn uart_status(&self) -> UartStatus {
        UartStatus::from_raw(self.uart_status_raw())
    }

    /// Parsed interrupt identification.
    #[inline]
    fn interrupt_id(&self) -> InterruptId {
        InterruptId::from_raw(self.interrupt_id_raw())
    }
}

/// LCR value for DMX framing (8N2) with the break bit set or cleared.
#[must_use]
pub const fn line_control(break_enabled: bool) -> u32 {
    if break_enabled {
        LCR_8_N_2 | LCR_BC
    } else {
        LCR_8_N_2
    }
}

// =============================================================================
// FIFO Mode
// =============================================================================

/// FIFO and interrupt configuration of a UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoMode {
    /// FIFOs and receive interrupt off
    #[default]
    Disabled,
    /// Transmit FIFO reset and enabled, no interrupts (DMA feeds it)
    Transmit,
    /// Receive FIFO reset and enabled, interrupt on every character
    Receive,
}

impl FifoMode {
    /// FIFO control register value for this mode
    #[must_use]
    pub const fn fcr(self) -> u32 {
        match self {
            FifoMode::Disabled => 0,
            FifoMode::Transmit => FCR_EFIFO | FCR_TRESET,
            FifoMode::Receive => FCR_EFIFO | FCR_RRESET | FCR_TRIG1,
        }
    }

    /// Interrupt enable register value for this mode
    #[must_use]
    pub const fn ier(self) -> u32 {
        match self {
            FifoMode::Receive => IER_ERBFI,
            FifoMode::Disabled | FifoMode::Transmit => 0,
        }
    }
}

// =============================================================================
// Status Words
// =============================================================================

/// Line status flags parsed from LSR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStatus {
    /// Receive data ready
    pub data_ready: bool,
    /// Receive overrun
    pub overrun: bool,
    /// Parity error
    pub parity_error: bool,
    /// Framing error
    pub framing_error: bool,
    /// Break detected on the line
    pub break_detected: bool,
    /// Transmit holding register empty
    pub thr_empty: bool,
    /// Transmitter completely idle
    pub transmitter_empty: bool,
}

impl LineStatus {
    /// Create from raw LSR value
    #[inline]
    pub fn from_raw(lsr: u32) -> Self {
        Self {
            data_ready: (lsr & LSR_DR) != 0,
            overrun: (lsr & LSR_OE) != 0,
            parity_error: (lsr & LSR_PE) != 0,
            framing_error: (lsr & LSR_FE) != 0,
            break_detected: (lsr & LSR_BI) != 0,
            thr_empty: (lsr & LSR_THRE) != 0,
            transmitter_empty: (lsr & LSR_TEMT) != 0,
        }
    }

    /// Convert back to a raw LSR value
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let mut val = 0u32;
        if self.data_ready {
            val |= LSR_DR;
        }
        if self.overrun {
            val |= LSR_OE;
        }
        if self.parity_error {
            val |= LSR_PE;
        }
        if self.framing_error {
            val |= LSR_FE;
        }
        if self.break_detected {
            val |= LSR_BI;
        }
        if self.thr_empty {
            val |= LSR_THRE;
        }
        if self.transmitter_empty {
            val |= LSR_TEMT;
        }
        val
    }
}

/// UART status flags parsed from USR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UartStatus {
    /// Serial transfer in progress
    pub busy: bool,
    /// Transmit FIFO not full
    pub tx_fifo_not_full: bool,
    /// Transmit FIFO empty
    pub tx_fifo_empty: bool,
    /// Receive FIFO not empty
    pub rx_fifo_not_empty: bool,
}

impl UartStatus {
    /// Create from raw USR value
    #[inline]
    pub fn from_raw(usr: u32) -> Self {
        Self {
            busy: (usr & USR_BUSY) != 0,
            tx_fifo_not_full: (usr & USR_TFNF) != 0,
            tx_fifo_empty: (usr & USR_TFE) != 0,
            rx_fifo_not_empty: (usr & USR_RFNE) != 0,
        }
    }
}

/// Interrupt identification parsed from IIR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptId(u32);

impl InterruptId {
    /// Create from raw IIR value
    #[inline]
    pub const fn from_raw(iir: u32) -> Self {
        Self(iir & IIR_IID_MASK)
    }

    /// Receive data available or character timeout
    #[inline]
    pub const fn is_receive(&self) -> bool {
        self.0 != IIR_IID_NONE && (self.0 & IIR_IID_RD) != 0
    }

    /// Character timeout: the receive line went idle
    #[inline]
    pub const fn is_timeout(&self) -> bool {
        self.0 == IIR_IID_TIME_OUT
    }

    /// No interrupt pending
    #[inline]
    pub const fn is_none(&self) -> bool {
        self.0 == IIR_IID_NONE
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
