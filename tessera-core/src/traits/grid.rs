//! Grid addressing and acquisition traits

/// One uncorrected acquisition reading, right-justified.
///
/// The native width depends on the acquisition source: 12 bits for
/// internal SAR converters, 24 bits for external delta-sigma converters.
/// Readings are inverse-proportional to pressure: high resistance (no
/// touch) gives a high raw value.
pub type RawSample = u32;

/// Row/column addressing for one grid intersection
///
/// Implementations make exactly one intersection electrically addressable
/// and guarantee that no other row is simultaneously driven (overlapping
/// drive produces ghost readings through parallel resistive paths).
///
/// Out-of-range indices are silently ignored: the scan loop produces
/// in-range indices by construction, and external callers (diagnostics)
/// must never be able to fault the engine with a bad index.
pub trait ChannelSelector {
    /// Activate row `row`'s drive line, deactivating any other row
    fn select_row(&mut self, row: usize);

    /// Route column `col`'s sense line to the acquisition input
    fn select_column(&mut self, col: usize);

    /// De-energize every row and tri-state every column path
    ///
    /// Called at initialization and at the end of every row iteration.
    /// Must be idempotent.
    fn deselect_all(&mut self);
}

/// Acquisition of one raw reading for the currently addressed cell
///
/// Reads are blocking: the caller suspends until the conversion
/// completes. Conversion latency is bounded and short relative to the
/// frame period, so no cancellation is supported. Noise suppression
/// (oversampling) is the implementation's responsibility.
pub trait SampleSource {
    /// Trigger a conversion and return the (averaged) result
    fn read_raw(&mut self) -> RawSample;
}
