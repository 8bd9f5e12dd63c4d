//! Engine configuration type definitions
//!
//! All values are supplied at construction and never re-read at runtime;
//! the engine does not persist configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid dimensions descriptor
///
/// The engine itself is parameterized by const generics; this runtime
/// descriptor exists for reporting and for sizing host-side consumers.
/// Invariant: `rows > 0` and `cols > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridDimensions {
    /// Number of driven rows
    pub rows: u32,
    /// Number of sensed columns
    pub cols: u32,
}

impl GridDimensions {
    /// Total number of sensing cells
    pub const fn total_cells(&self) -> u32 {
        self.rows * self.cols
    }
}

/// Acquisition and correction parameters
///
/// Contract: `full_scale >> scale_shift` must fit in 16 bits, so every
/// corrected value fits the wire format without clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AcquireConfig {
    /// Converter full-scale value (the "no touch" reading ceiling)
    pub full_scale: u32,
    /// Corrected values below this collapse to zero
    pub noise_threshold: u32,
    /// Right-shift applied after correction to fit the 16-bit wire width
    pub scale_shift: u8,
    /// Settle delay after row selection, microseconds
    pub row_settle_us: u32,
    /// Settle delay after column/channel selection, microseconds
    pub col_settle_us: u32,
}

impl AcquireConfig {
    /// 24-bit delta-sigma converter bank (ADS1220-class columns)
    pub const fn delta_sigma_24bit() -> Self {
        Self {
            full_scale: 0xFF_FFFF,
            noise_threshold: 5000,
            scale_shift: 8,
            row_settle_us: 1000,
            col_settle_us: 100,
        }
    }

    /// 12-bit internal SAR converter through analog multiplexers
    pub const fn sar_12bit() -> Self {
        Self {
            full_scale: 4095,
            noise_threshold: 50,
            scale_shift: 0,
            row_settle_us: 1000,
            col_settle_us: 50,
        }
    }
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self::sar_12bit()
    }
}
