//! ISR-reachable handle slots using critical sections.
//!
//! Provides [`SharedHandle`], a static slot an interrupt handler borrows a
//! context handle from after the application installed it.

use super::primitives::CriticalSectionCell;

/// Static slot for one engine context handle.
///
/// Starts empty. The application installs a handle once the engine is split;
/// interrupt handlers then run it through [`with`](Self::with). Until a
/// handle is installed the closure is skipped.
///
/// # Example
///
/// ```ignore
/// type Uart = my_hal::DmxUart;
/// type Dma = my_hal::DmxDma;
/// type Tim = my_hal::SequencerTimer;
///
/// static SEQUENCER: SharedHandle<TxSequencer<'static, Uart, Dma, Tim, 4>> = SharedHandle::new();
/// static FRAMER: SharedHandle<RxFramer<'static, Uart, Dma, Tim, 4>> = SharedHandle::new();
///
/// let engine = ENGINE.init(Engine::new(peripherals, OrangePiOne::config())?);
/// let (ports, mut sequencer, framer) = engine.split();
/// sequencer.start();
/// SEQUENCER.install(sequencer);
/// FRAMER.install(framer);
///
/// #[interrupt]
/// fn TIMER0() {
///     SEQUENCER.with(|sequencer| sequencer.on_tx_tick());
/// }
///
/// #[interrupt]
/// fn DMX_FIQ() {
///     FRAMER.with(|framer| framer.on_rx_or_dma_event());
/// }
/// ```
pub struct SharedHandle<T> {
    inner: CriticalSectionCell<Option<T>>,
}

impl<T> SharedHandle<T> {
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(None),
        }
    }

    /// Install a handle, returning the one it replaces.
    pub fn install(&self, handle: T) -> Option<T> {
        self.inner.replace(Some(handle))
    }

    /// Remove the installed handle.
    pub fn take(&self) -> Option<T> {
        self.inner.replace(None)
    }

    /// True once a handle is installed.
    pub fn is_installed(&self) -> bool {
        self.inner.with(|slot| slot.is_some())
    }

    /// Execute a closure with the installed handle.
    ///
    /// Interrupts are disabled for the duration of the closure. Returns
    /// `None` without calling `f` when the slot is empty.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.with(|slot| slot.as_mut().map(f))
    }

    /// Like [`with`](Self::with), but also returns `None` if the slot is
    /// already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner
            .try_with(|slot| slot.as_mut().map(f))
            .flatten()
    }
}

impl<T> Default for SharedHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}
