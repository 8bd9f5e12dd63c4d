//! Direct GPIO row drive
//!
//! One output pin per row, driven exclusively high to energize that
//! row's copper strip. Used by grids small enough to afford a dedicated
//! pin per row (the converter-bank build).

use embedded_hal::digital::OutputPin;

/// Bank of row drive pins with exclusive-high selection
pub struct RowBank<P, const N: usize> {
    pins: [P; N],
    selected: Option<usize>,
}

impl<P: OutputPin, const N: usize> RowBank<P, N> {
    /// Create a row bank and drive every pin low
    pub fn new(pins: [P; N]) -> Self {
        let mut bank = Self {
            pins,
            selected: None,
        };
        bank.deselect_all();
        bank
    }

    /// Drive row `row` high, all others low
    ///
    /// Out-of-range rows are ignored.
    pub fn select(&mut self, row: usize) {
        if row >= N {
            return;
        }

        self.deselect_all();
        self.pins[row].set_high().ok();
        self.selected = Some(row);
    }

    /// Drive every row pin low
    pub fn deselect_all(&mut self) {
        for pin in self.pins.iter_mut() {
            pin.set_low().ok();
        }
        self.selected = None;
    }

    /// The currently driven row, if any
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Number of rows in the bank
    pub const fn len(&self) -> usize {
        N
    }

    /// True if the bank has no pins
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}
