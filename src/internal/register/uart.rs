//! 16550-compatible UART register bit definitions
//!
//! Bit layouts of the status and control registers the engine interprets.
//! Platform implementations of [`crate::hal::UartPort`] return raw register
//! values; the HAL layer parses them with these masks.
//!
//! | Register | Meaning                          |
//! |----------|----------------------------------|
//! | LSR      | Line status                      |
//! | USR      | UART status (DesignWare variant) |
//! | IIR      | Interrupt identification         |
//! | LCR      | Line control                     |
//! | FCR      | FIFO control                     |
//! | IER      | Interrupt enable                 |

// =============================================================================
// LSR - Line Status Register
// =============================================================================

/// Data ready: at least one character in the receive FIFO
pub const LSR_DR: u32 = 1 << 0;
/// Overrun error
pub const LSR_OE: u32 = 1 << 1;
/// Parity error
pub const LSR_PE: u32 = 1 << 2;
/// Framing error
pub const LSR_FE: u32 = 1 << 3;
/// Break interrupt: line held low longer than a character
pub const LSR_BI: u32 = 1 << 4;
/// Transmit holding register empty
pub const LSR_THRE: u32 = 1 << 5;
/// Transmitter empty (holding and shift register)
pub const LSR_TEMT: u32 = 1 << 6;

// =============================================================================
// USR - UART Status Register
// =============================================================================

/// UART busy (serial transfer in progress)
pub const USR_BUSY: u32 = 1 << 0;
/// Transmit FIFO not full
pub const USR_TFNF: u32 = 1 << 1;
/// Transmit FIFO empty
pub const USR_TFE: u32 = 1 << 2;
/// Receive FIFO not empty
pub const USR_RFNE: u32 = 1 << 3;

// =============================================================================
// IIR - Interrupt Identification Register
// =============================================================================

/// Interrupt ID field mask
pub const IIR_IID_MASK: u32 = 0x0F;
/// No interrupt pending
pub const IIR_IID_NONE: u32 = 0x01;
/// Received data available (bit shared with the timeout ID)
pub const IIR_IID_RD: u32 = 0x04;
/// Character timeout: receive FIFO idle with data
pub const IIR_IID_TIME_OUT: u32 = 0x0C;

// =============================================================================
// LCR - Line Control Register
// =============================================================================

/// 8 data bits, no parity, 2 stop bits
pub const LCR_8_N_2: u32 = 0x07;
/// Break control: force the line low
pub const LCR_BC: u32 = 1 << 6;

// =============================================================================
// FCR / IER
// =============================================================================

/// Enable FIFOs
pub const FCR_EFIFO: u32 = 1 << 0;
/// Reset receive FIFO
pub const FCR_RRESET: u32 = 1 << 1;
/// Reset transmit FIFO
pub const FCR_TRESET: u32 = 1 << 2;
/// Receive trigger: one character
pub const FCR_TRIG1: u32 = 0;
/// Enable received data available interrupt
pub const IER_ERBFI: u32 = 1 << 0;
