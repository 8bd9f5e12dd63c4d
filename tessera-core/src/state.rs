//! Engine state tracking
//!
//! The engine is single-threaded and cooperative: exactly one state is
//! active at a time and transitions are strictly sequential. `Idle` is
//! both the initial state and the resting state between operations.

/// Engine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// Resting between operations
    #[default]
    Idle,
    /// Full grid sweep in progress
    Scanning,
    /// Baseline capture in progress
    Calibrating,
    /// Packet write to the transport in progress
    Transmitting,
}

impl EngineState {
    /// Check if an operation is in progress
    pub fn is_busy(&self) -> bool {
        !matches!(self, EngineState::Idle)
    }
}
