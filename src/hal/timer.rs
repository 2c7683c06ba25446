//! Timer capability interface

/// Hardware timer driving the TX sequencer plus a free-running microsecond
/// counter.
pub trait Timer {
    /// Fire the sequencer interrupt once after `ticks` timer ticks.
    ///
    /// Each call replaces the previously scheduled interval.
    fn schedule(&self, ticks: u32);

    /// Free-running microsecond counter; wraps at `u32::MAX`.
    fn micros(&self) -> u32;
}
