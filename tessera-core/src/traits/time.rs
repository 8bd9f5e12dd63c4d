//! Timing capability traits
//!
//! Settle delays and timestamps are injected so the scan controller's
//! timing behavior is testable without real hardware: a test double can
//! record the requested durations instead of blocking.

/// Blocking microsecond-scale delay
///
/// Used for analog settling after addressing changes. Implementations
/// busy-wait or poll a hardware counter; there is no other work to yield
/// to in this single-threaded design.
pub trait SettleDelay {
    /// Block for at least `us` microseconds
    fn delay_us(&mut self, us: u32);
}

/// Millisecond uptime source for frame timestamps
pub trait MonotonicClock {
    /// Milliseconds since an arbitrary (boot-time) epoch
    fn now_ms(&mut self) -> u32;
}
