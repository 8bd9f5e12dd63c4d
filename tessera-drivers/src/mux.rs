//! Analog multiplexer fan-out addressing
//!
//! CD4051-class 8-channel analog multiplexers, grouped per axis: each
//! group shares one 3-bit select bus (S0/S1/S2) wired to every chip,
//! with one active-LOW enable pin per chip. Addressing a line is
//! two-step: present the sub-channel code on the shared bus, then enable
//! exactly one chip's output stage.
//!
//! ```text
//!   line index ──► chip = index / 8      (which mux)
//!                  code = index % 8      (which channel Y0-Y7)
//! ```

use embedded_hal::digital::OutputPin;

use tessera_core::traits::ChannelSelector;

/// Channels per multiplexer chip (3-bit select)
pub const CHANNELS_PER_CHIP: usize = 8;

/// One group of multiplexers fanning a single analog line out to
/// `CHIPS * 8` grid lines
pub struct MuxFanout<EN, S, const CHIPS: usize> {
    /// Per-chip output enables, active LOW
    enables: [EN; CHIPS],
    /// Shared S0/S1/S2 select bus, LSB first
    select: [S; 3],
}

impl<EN: OutputPin, S: OutputPin, const CHIPS: usize> MuxFanout<EN, S, CHIPS> {
    /// Create a fan-out group with every chip disabled and channel 0
    /// selected
    pub fn new(enables: [EN; CHIPS], select: [S; 3]) -> Self {
        let mut fanout = Self { enables, select };
        fanout.disable_all();
        fanout.set_code(0);
        fanout
    }

    /// Number of addressable lines in this group
    pub const fn capacity() -> usize {
        CHIPS * CHANNELS_PER_CHIP
    }

    /// Route line `index` to the group's common analog line
    ///
    /// Presents the select code before enabling the chip so the output
    /// never glitches through a stale channel. At most one chip drives
    /// the common line at any instant. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) {
        if index >= Self::capacity() {
            return;
        }

        let chip = index / CHANNELS_PER_CHIP;
        let code = index % CHANNELS_PER_CHIP;

        self.set_code(code as u8);
        self.enable_chip(chip);
    }

    /// Disable every chip in the group (outputs high-Z)
    pub fn disable_all(&mut self) {
        for pin in self.enables.iter_mut() {
            pin.set_high().ok();
        }
    }

    fn set_code(&mut self, code: u8) {
        for (bit, pin) in self.select.iter_mut().enumerate() {
            if code & (1 << bit) != 0 {
                pin.set_high().ok();
            } else {
                pin.set_low().ok();
            }
        }
    }

    fn enable_chip(&mut self, chip: usize) {
        self.disable_all();
        self.enables[chip].set_low().ok();
    }
}

/// Fully multiplexed grid addressing: one fan-out group per axis plus a
/// single row drive line routed through the row group
pub struct MuxMatrix<RE, CE, S, P, const ROW_CHIPS: usize, const COL_CHIPS: usize> {
    rows: MuxFanout<RE, S, ROW_CHIPS>,
    cols: MuxFanout<CE, S, COL_CHIPS>,
    /// Drives the selected row's strip (through the row group's common
    /// line)
    drive: P,
}

impl<RE, CE, S, P, const ROW_CHIPS: usize, const COL_CHIPS: usize>
    MuxMatrix<RE, CE, S, P, ROW_CHIPS, COL_CHIPS>
where
    RE: OutputPin,
    CE: OutputPin,
    S: OutputPin,
    P: OutputPin,
{
    /// Create a multiplexed matrix in the de-addressed state
    pub fn new(
        rows: MuxFanout<RE, S, ROW_CHIPS>,
        cols: MuxFanout<CE, S, COL_CHIPS>,
        drive: P,
    ) -> Self {
        let mut matrix = Self { rows, cols, drive };
        matrix.deselect_all();
        matrix
    }
}

impl<RE, CE, S, P, const ROW_CHIPS: usize, const COL_CHIPS: usize> ChannelSelector
    for MuxMatrix<RE, CE, S, P, ROW_CHIPS, COL_CHIPS>
where
    RE: OutputPin,
    CE: OutputPin,
    S: OutputPin,
    P: OutputPin,
{
    fn select_row(&mut self, row: usize) {
        if row >= MuxFanout::<RE, S, ROW_CHIPS>::capacity() {
            return;
        }

        self.rows.select(row);
        self.drive.set_high().ok();
    }

    fn select_column(&mut self, col: usize) {
        self.cols.select(col);
    }

    fn deselect_all(&mut self) {
        self.drive.set_low().ok();
        self.rows.disable_all();
        self.cols.disable_all();
    }
}
