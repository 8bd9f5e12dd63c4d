//! Combined grid front-ends
//!
//! The scan engine consumes one object providing both addressing and
//! acquisition. This module wires the building blocks into the two
//! observed topologies:
//!
//! - `Ads1220Matrix`: direct GPIO rows + delta-sigma converter columns
//! - `MuxMatrixAdc`: multiplexer fan-out on both axes + one oversampled
//!   single-ended ADC input

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use tessera_core::traits::{ChannelSelector, RawSample, SampleSource};

use crate::adc::{AdcInput, Oversampled};
use crate::ads1220::{Ads1220Bank, CHANNELS_PER_CHIP, FULL_SCALE};
use crate::gpio::RowBank;
use crate::mux::MuxMatrix;

/// GPIO-driven rows with ADS1220 bank columns
///
/// Column addressing routes the sense line inside the converters: column
/// `c` lives on chip `c / 4`, input channel `c % 4`.
pub struct Ads1220Matrix<P, SPI, CS, D, const ROWS: usize, const CHIPS: usize> {
    rows: RowBank<P, ROWS>,
    bank: Ads1220Bank<SPI, CS, D, CHIPS>,
    /// Chip currently routed to the selected column
    active_chip: usize,
}

impl<P, SPI, CS, D, const ROWS: usize, const CHIPS: usize>
    Ads1220Matrix<P, SPI, CS, D, ROWS, CHIPS>
where
    P: OutputPin,
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    /// Combine a row bank and a converter bank into one grid backend
    pub fn new(rows: RowBank<P, ROWS>, bank: Ads1220Bank<SPI, CS, D, CHIPS>) -> Self {
        Self {
            rows,
            bank,
            active_chip: 0,
        }
    }

    /// Access to the converter bank (diagnostics, re-initialization)
    pub fn bank_mut(&mut self) -> &mut Ads1220Bank<SPI, CS, D, CHIPS> {
        &mut self.bank
    }
}

impl<P, SPI, CS, D, const ROWS: usize, const CHIPS: usize> ChannelSelector
    for Ads1220Matrix<P, SPI, CS, D, ROWS, CHIPS>
where
    P: OutputPin,
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    fn select_row(&mut self, row: usize) {
        self.rows.select(row);
    }

    fn select_column(&mut self, col: usize) {
        if col >= CHIPS * CHANNELS_PER_CHIP {
            return;
        }

        let chip = col / CHANNELS_PER_CHIP;
        let channel = col % CHANNELS_PER_CHIP;

        self.active_chip = chip;
        // A failed channel write leaves the previous routing in place;
        // the conversion still completes and the cell reads stale, which
        // the scan loop tolerates by design
        self.bank.set_channel(chip, channel).ok();
    }

    fn deselect_all(&mut self) {
        // Converter inputs are passive sense lines; only the rows carry
        // drive current
        self.rows.deselect_all();
    }
}

impl<P, SPI, CS, D, const ROWS: usize, const CHIPS: usize> SampleSource
    for Ads1220Matrix<P, SPI, CS, D, ROWS, CHIPS>
where
    P: OutputPin,
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    fn read_raw(&mut self) -> RawSample {
        // A failed transfer reads as full-scale (no stimulus) rather
        // than faulting the scan loop
        self.bank.read_data(self.active_chip).unwrap_or(FULL_SCALE)
    }
}

/// Multiplexed matrix with a single oversampled ADC input
pub struct MuxMatrixAdc<RE, CE, S, P, A, const ROW_CHIPS: usize, const COL_CHIPS: usize> {
    selector: MuxMatrix<RE, CE, S, P, ROW_CHIPS, COL_CHIPS>,
    source: Oversampled<A>,
}

impl<RE, CE, S, P, A, const ROW_CHIPS: usize, const COL_CHIPS: usize>
    MuxMatrixAdc<RE, CE, S, P, A, ROW_CHIPS, COL_CHIPS>
where
    RE: OutputPin,
    CE: OutputPin,
    S: OutputPin,
    P: OutputPin,
    A: AdcInput,
{
    /// Combine a multiplexed selector and an oversampled ADC into one
    /// grid backend
    pub fn new(
        selector: MuxMatrix<RE, CE, S, P, ROW_CHIPS, COL_CHIPS>,
        source: Oversampled<A>,
    ) -> Self {
        Self { selector, source }
    }
}

impl<RE, CE, S, P, A, const ROW_CHIPS: usize, const COL_CHIPS: usize> ChannelSelector
    for MuxMatrixAdc<RE, CE, S, P, A, ROW_CHIPS, COL_CHIPS>
where
    RE: OutputPin,
    CE: OutputPin,
    S: OutputPin,
    P: OutputPin,
    A: AdcInput,
{
    fn select_row(&mut self, row: usize) {
        self.selector.select_row(row);
    }

    fn select_column(&mut self, col: usize) {
        self.selector.select_column(col);
    }

    fn deselect_all(&mut self) {
        self.selector.deselect_all();
    }
}

impl<RE, CE, S, P, A, const ROW_CHIPS: usize, const COL_CHIPS: usize> SampleSource
    for MuxMatrixAdc<RE, CE, S, P, A, ROW_CHIPS, COL_CHIPS>
where
    RE: OutputPin,
    CE: OutputPin,
    S: OutputPin,
    P: OutputPin,
    A: AdcInput,
{
    fn read_raw(&mut self) -> RawSample {
        self.source.read_raw()
    }
}
