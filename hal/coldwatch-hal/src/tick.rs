//! Periodic tick source
//!
//! Waits in the transport are measured in ticks from an external periodic
//! source rather than wall-clock time. On the firmware the source is a
//! 1 kHz millisecond counter; in tests it is fully scripted, which makes
//! timeout expiry deterministic.

/// Source of periodic ticks
pub trait TickSource {
    /// Number of whole ticks elapsed since the previous call
    ///
    /// The first call after construction reports ticks since construction.
    /// Implementations must never report the same tick twice.
    fn elapsed_ticks(&mut self) -> u32;

    /// Start a fresh measurement
    ///
    /// Forgets every tick accumulated since the previous call, so the next
    /// [`elapsed_ticks`](Self::elapsed_ticks) only counts from here. Every
    /// bounded wait calls this first; idle time between waits is never
    /// charged to the next one.
    fn restart(&mut self) {
        let _ = self.elapsed_ticks();
    }
}

impl<T: TickSource + ?Sized> TickSource for &mut T {
    fn elapsed_ticks(&mut self) -> u32 {
        (**self).elapsed_ticks()
    }

    fn restart(&mut self) {
        (**self).restart()
    }
}

/// Tick source that never advances
///
/// Useful for fire-and-forget links where no wait is ever performed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frozen;

impl TickSource for Frozen {
    fn elapsed_ticks(&mut self) -> u32 {
        0
    }
}
