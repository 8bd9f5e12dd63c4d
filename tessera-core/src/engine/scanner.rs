//! Scan controller
//!
//! The orchestrating state machine: iterates rows and columns, drives
//! the channel selector and sample source, applies baseline subtraction
//! or full-scale inversion plus noise thresholding, populates the frame,
//! and streams the encoded packet into the transport.
//!
//! The engine is an explicit context object owning its configuration,
//! baseline, frame, and hardware capabilities, so multiple independent
//! instances (including fully simulated ones) can coexist.

use embedded_io::Write;

use tessera_protocol::{Checksum, SYNC, TERMINATOR};

use crate::config::{AcquireConfig, GridDimensions};
use crate::engine::{Baseline, Frame};
use crate::state::EngineState;
use crate::traits::{ChannelSelector, MonotonicClock, RawSample, SampleSource, SettleDelay};

/// Grid scan engine
///
/// `B` provides addressing and acquisition for one grid topology, `D`
/// the settle delays, `K` the frame timestamps, and `W` the blocking
/// byte sink the packets are written into. `ROWS` and `COLS` are fixed
/// for the lifetime of the instance.
pub struct ScanEngine<B, D, K, W, const ROWS: usize, const COLS: usize> {
    backend: B,
    delay: D,
    clock: K,
    transport: W,
    config: AcquireConfig,
    baseline: Baseline<ROWS, COLS>,
    frame: Frame<ROWS, COLS>,
    state: EngineState,
}

impl<B, D, K, W, const ROWS: usize, const COLS: usize> ScanEngine<B, D, K, W, ROWS, COLS>
where
    B: ChannelSelector + SampleSource,
    D: SettleDelay,
    K: MonotonicClock,
    W: Write,
{
    /// Create an engine and leave the grid in its safe de-addressed state
    pub fn new(mut backend: B, delay: D, clock: K, transport: W, config: AcquireConfig) -> Self {
        const {
            assert!(ROWS > 0 && COLS > 0);
        }

        backend.deselect_all();

        Self {
            backend,
            delay,
            clock,
            transport,
            config,
            baseline: Baseline::new(),
            frame: Frame::new(),
            state: EngineState::Idle,
        }
    }

    /// Scan the entire grid once into the frame buffer
    pub fn scan_matrix(&mut self) {
        self.state = EngineState::Scanning;

        for row in 0..ROWS {
            self.backend.select_row(row);
            self.delay.delay_us(self.config.row_settle_us);

            for col in 0..COLS {
                self.backend.select_column(col);
                self.delay.delay_us(self.config.col_settle_us);

                let raw = self.backend.read_raw();
                let value = self.correct(row, col, raw);
                self.frame.set(row, col, value);
            }

            // De-energize before the next row: overlapping drive corrupts
            // readings through parallel resistive paths
            self.backend.deselect_all();
        }

        let counter = self.frame.counter().wrapping_add(1);
        let now = self.clock.now_ms();
        self.frame.stamp(counter, now);

        self.backend.deselect_all();
        self.state = EngineState::Idle;
    }

    /// Capture a resting-state baseline by averaging `samples` full scans
    ///
    /// Usage contract (cannot be verified here): no stimulus applied to
    /// the grid while calibration runs. A `samples` of zero is ignored.
    pub fn calibrate(&mut self, samples: u8) {
        if samples == 0 {
            return;
        }

        self.state = EngineState::Calibrating;
        self.baseline.begin();

        for _ in 0..samples {
            for row in 0..ROWS {
                self.backend.select_row(row);
                self.delay.delay_us(self.config.row_settle_us);

                for col in 0..COLS {
                    self.backend.select_column(col);
                    self.delay.delay_us(self.config.col_settle_us);

                    let raw = self.backend.read_raw();
                    self.baseline.add(row, col, raw);
                }

                self.backend.deselect_all();
            }
        }

        self.baseline.finish(samples);
        self.backend.deselect_all();
        self.state = EngineState::Idle;
    }

    /// Discard the baseline and return to the direct-inversion policy
    pub fn clear_calibration(&mut self) {
        self.baseline.begin();
    }

    /// Stream the current frame as one wire packet into the transport
    ///
    /// The only fallible engine operation; a transport error is
    /// propagated unmodified and is fatal at a layer above this one
    /// (no retry or buffering here).
    pub fn transmit(&mut self) -> Result<(), W::Error> {
        self.state = EngineState::Transmitting;
        let result = self.write_packet();
        self.state = EngineState::Idle;
        result
    }

    /// One complete scan + transmit cycle
    pub fn scan_cycle(&mut self) -> Result<(), W::Error> {
        self.scan_matrix();
        self.transmit()
    }

    /// Diagnostic read of a single cell with full settle discipline
    ///
    /// Returns `None` for out-of-range indices. Leaves the grid
    /// de-addressed.
    pub fn read_cell(&mut self, row: usize, col: usize) -> Option<RawSample> {
        if row >= ROWS || col >= COLS {
            return None;
        }

        self.backend.select_row(row);
        self.delay.delay_us(self.config.row_settle_us);
        self.backend.select_column(col);
        self.delay.delay_us(self.config.col_settle_us);

        let raw = self.backend.read_raw();
        self.backend.deselect_all();
        Some(raw)
    }

    /// Current engine state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The most recently completed frame
    pub fn frame(&self) -> &Frame<ROWS, COLS> {
        &self.frame
    }

    /// The current baseline matrix
    pub fn baseline(&self) -> &Baseline<ROWS, COLS> {
        &self.baseline
    }

    /// True once a calibration pass has completed
    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_calibrated()
    }

    /// Count of completed scans
    pub fn frame_count(&self) -> u32 {
        self.frame.counter()
    }

    /// Completion time of the last scan, milliseconds
    pub fn last_scan_ms(&self) -> u32 {
        self.frame.timestamp_ms()
    }

    /// Grid dimensions of this instance
    pub fn dimensions(&self) -> GridDimensions {
        GridDimensions {
            rows: ROWS as u32,
            cols: COLS as u32,
        }
    }

    /// Access to the underlying grid backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the underlying grid backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Access to the underlying transport
    pub fn transport(&self) -> &W {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut W {
        &mut self.transport
    }

    /// Correct one raw reading into a 16-bit wire intensity
    fn correct(&self, row: usize, col: usize, raw: RawSample) -> u16 {
        // Pressure is a reduction from the resting reading: subtract from
        // the baseline when calibrated, otherwise invert against the
        // converter's full-scale value. Saturating: never underflows.
        let corrected = if self.baseline.is_calibrated() {
            self.baseline.at(row, col).saturating_sub(raw)
        } else {
            self.config.full_scale.saturating_sub(raw)
        };

        let corrected = if corrected < self.config.noise_threshold {
            0
        } else {
            corrected
        };

        // Scale to the wire width only after thresholding; shifting first
        // would destroy the low-order bits the noise comparison needs
        ((corrected >> self.config.scale_shift).min(u16::MAX as u32)) as u16
    }

    fn write_packet(&mut self) -> Result<(), W::Error> {
        self.transport.write_all(&SYNC)?;

        let mut sum = Checksum::new();
        for row in 0..ROWS {
            for col in 0..COLS {
                let value = self.frame.get(row, col).unwrap_or(0);
                sum.push_value(value);
                self.transport.write_all(&value.to_le_bytes())?;
            }
        }

        self.transport.write_all(&sum.get().to_le_bytes())?;
        self.transport.write_all(&TERMINATOR)?;
        self.transport.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_protocol::packet_len;

    /// Simulated grid backend with scripted per-cell raw readings
    struct SimBackend<const ROWS: usize, const COLS: usize> {
        raw: [[RawSample; COLS]; ROWS],
        selected_row: Option<usize>,
        selected_col: Option<usize>,
        deselects: usize,
    }

    impl<const ROWS: usize, const COLS: usize> SimBackend<ROWS, COLS> {
        fn new(raw: [[RawSample; COLS]; ROWS]) -> Self {
            Self {
                raw,
                selected_row: None,
                selected_col: None,
                deselects: 0,
            }
        }
    }

    impl<const ROWS: usize, const COLS: usize> ChannelSelector for SimBackend<ROWS, COLS> {
        fn select_row(&mut self, row: usize) {
            if row < ROWS {
                self.selected_row = Some(row);
            }
        }

        fn select_column(&mut self, col: usize) {
            if col < COLS {
                self.selected_col = Some(col);
            }
        }

        fn deselect_all(&mut self) {
            self.selected_row = None;
            self.selected_col = None;
            self.deselects += 1;
        }
    }

    impl<const ROWS: usize, const COLS: usize> SampleSource for SimBackend<ROWS, COLS> {
        fn read_raw(&mut self) -> RawSample {
            self.raw[self.selected_row.unwrap()][self.selected_col.unwrap()]
        }
    }

    /// Delay double that records requested durations instead of blocking
    #[derive(Default)]
    struct RecordingDelay {
        calls: usize,
        total_us: u64,
    }

    impl SettleDelay for RecordingDelay {
        fn delay_us(&mut self, us: u32) {
            self.calls += 1;
            self.total_us += us as u64;
        }
    }

    struct FixedClock(u32);

    impl MonotonicClock for FixedClock {
        fn now_ms(&mut self) -> u32 {
            self.0
        }
    }

    /// Byte sink capturing everything written
    struct SinkWriter {
        buf: [u8; 64],
        len: usize,
    }

    impl SinkWriter {
        fn new() -> Self {
            Self {
                buf: [0; 64],
                len: 0,
            }
        }

        fn bytes(&self) -> &[u8] {
            &self.buf[..self.len]
        }
    }

    impl embedded_io::ErrorType for SinkWriter {
        type Error = core::convert::Infallible;
    }

    impl Write for SinkWriter {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.buf.len() - self.len);
            self.buf[self.len..self.len + n].copy_from_slice(&buf[..n]);
            self.len += n;
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    type TestEngine<const ROWS: usize, const COLS: usize> =
        ScanEngine<SimBackend<ROWS, COLS>, RecordingDelay, FixedClock, SinkWriter, ROWS, COLS>;

    fn engine_2x2(raw: [[RawSample; 2]; 2], config: AcquireConfig) -> TestEngine<2, 2> {
        ScanEngine::new(
            SimBackend::new(raw),
            RecordingDelay::default(),
            FixedClock(777),
            SinkWriter::new(),
            config,
        )
    }

    fn config_12bit() -> AcquireConfig {
        AcquireConfig {
            full_scale: 4095,
            noise_threshold: 50,
            scale_shift: 0,
            row_settle_us: 1000,
            col_settle_us: 50,
        }
    }

    #[test]
    fn test_uncalibrated_scan_inverts_against_full_scale() {
        let mut engine = engine_2x2([[4095, 3000], [100, 0]], config_12bit());
        engine.scan_matrix();

        // 4095-4095=0, 4095-3000=1095, 4095-100=3995, 4095-0=4095
        assert_eq!(engine.frame().get(0, 0), Some(0));
        assert_eq!(engine.frame().get(0, 1), Some(1095));
        assert_eq!(engine.frame().get(1, 0), Some(3995));
        assert_eq!(engine.frame().get(1, 1), Some(4095));
    }

    #[test]
    fn test_noise_floor_collapses_to_zero() {
        // 4095 - 4050 = 45, below the threshold of 50
        let mut engine = engine_2x2([[4050, 4046], [4045, 0]], config_12bit());
        engine.scan_matrix();

        assert_eq!(engine.frame().get(0, 0), Some(0));
        assert_eq!(engine.frame().get(0, 1), Some(0));
        // 4095 - 4045 = 50, exactly at the threshold: kept
        assert_eq!(engine.frame().get(1, 0), Some(50));
        assert_eq!(engine.frame().get(1, 1), Some(4095));
    }

    #[test]
    fn test_calibration_with_constant_source_is_exact() {
        let mut engine = engine_2x2([[3000; 2]; 2], config_12bit());
        engine.calibrate(4);

        assert!(engine.is_calibrated());
        for row in 0..2 {
            for col in 0..2 {
                assert_eq!(engine.baseline().get(row, col), Some(3000));
            }
        }
    }

    #[test]
    fn test_calibrated_scan_of_unchanged_grid_is_zero() {
        let mut engine = engine_2x2([[3000, 2000], [1000, 4095]], config_12bit());
        engine.calibrate(3);
        engine.scan_matrix();

        // The baseline cancels itself, net of the noise floor
        assert!(engine.frame().iter_cells().all(|v| v == 0));
    }

    #[test]
    fn test_full_scale_baseline_matches_inversion() {
        let mut engine = engine_2x2([[4095; 2]; 2], config_12bit());
        engine.calibrate(4);

        // With baseline == full scale, both correction policies coincide
        engine.backend_mut().raw = [[4095, 3000], [100, 0]];
        engine.scan_matrix();

        assert_eq!(engine.frame().get(0, 0), Some(0));
        assert_eq!(engine.frame().get(0, 1), Some(1095));
        assert_eq!(engine.frame().get(1, 0), Some(3995));
        assert_eq!(engine.frame().get(1, 1), Some(4095));
    }

    #[test]
    fn test_baseline_subtraction_saturates() {
        let mut engine = engine_2x2([[100; 2]; 2], config_12bit());
        engine.calibrate(1);

        // Readings above the baseline would underflow; they clamp to zero
        engine.backend_mut().raw = [[4095; 2]; 2];
        engine.scan_matrix();

        assert!(engine.frame().iter_cells().all(|v| v == 0));
    }

    #[test]
    fn test_scale_shift_applied_after_threshold() {
        let config = AcquireConfig {
            full_scale: 0xFF_FFFF,
            noise_threshold: 5000,
            scale_shift: 8,
            row_settle_us: 1000,
            col_settle_us: 100,
        };
        let raw = [
            [0xFF_FFFF - 4999, 0xFF_FFFF - 5000],
            [0xFF_FFFF, 0x00_0000],
        ];
        let mut engine = engine_2x2(raw, config);
        engine.scan_matrix();

        // 4999 < threshold: zeroed before the shift could hide it
        assert_eq!(engine.frame().get(0, 0), Some(0));
        // 5000 survives, then scales down to 5000 >> 8 = 19
        assert_eq!(engine.frame().get(0, 1), Some(19));
        assert_eq!(engine.frame().get(1, 0), Some(0));
        assert_eq!(engine.frame().get(1, 1), Some(0xFFFF));
    }

    #[test]
    fn test_clear_calibration_restores_inversion() {
        let mut engine = engine_2x2([[3000; 2]; 2], config_12bit());
        engine.calibrate(2);
        assert!(engine.is_calibrated());

        engine.clear_calibration();
        assert!(!engine.is_calibrated());

        engine.scan_matrix();
        // Back to full-scale inversion: 4095 - 3000 = 1095
        assert!(engine.frame().iter_cells().all(|v| v == 1095));
    }

    #[test]
    fn test_calibrate_zero_samples_is_ignored() {
        let mut engine = engine_2x2([[3000; 2]; 2], config_12bit());
        engine.calibrate(0);

        assert!(!engine.is_calibrated());
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_frame_counter_and_timestamp() {
        let mut engine = engine_2x2([[0; 2]; 2], config_12bit());
        assert_eq!(engine.frame_count(), 0);

        engine.scan_matrix();
        engine.scan_matrix();

        assert_eq!(engine.frame_count(), 2);
        assert_eq!(engine.last_scan_ms(), 777);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_rows_deselected_between_iterations() {
        let mut engine = engine_2x2([[0; 2]; 2], config_12bit());
        let initial = engine.backend().deselects;

        engine.scan_matrix();

        // One deselect per row plus the final one
        assert_eq!(engine.backend().deselects, initial + 2 + 1);
        assert_eq!(engine.backend().selected_row, None);
        assert_eq!(engine.backend().selected_col, None);
    }

    #[test]
    fn test_settle_delays_requested() {
        let mut engine = engine_2x2([[0; 2]; 2], config_12bit());
        engine.scan_matrix();

        // 2 row delays + 4 column delays
        assert_eq!(engine.delay.calls, 2 + 4);
        assert_eq!(engine.delay.total_us, 2 * 1000 + 4 * 50);
    }

    #[test]
    fn test_read_cell_diagnostic() {
        let mut engine = engine_2x2([[10, 20], [30, 40]], config_12bit());

        assert_eq!(engine.read_cell(1, 0), Some(30));
        assert_eq!(engine.backend().selected_row, None);

        // Out-of-range indices are ignored, never a fault
        assert_eq!(engine.read_cell(2, 0), None);
        assert_eq!(engine.read_cell(0, 2), None);
    }

    #[test]
    fn test_transmit_packet_bytes() {
        let config = AcquireConfig {
            full_scale: 0xFFFF,
            noise_threshold: 0,
            scale_shift: 0,
            row_settle_us: 1,
            col_settle_us: 1,
        };
        let backend = SimBackend::new([[0xFFFF - 0x1234]]);
        let mut engine: TestEngine<1, 1> = ScanEngine::new(
            backend,
            RecordingDelay::default(),
            FixedClock(0),
            SinkWriter::new(),
            config,
        );

        engine.scan_cycle().unwrap();

        assert_eq!(
            engine.transport().bytes(),
            &[0xAA, 0x55, 0x34, 0x12, 0x46, 0x00, 0x0D, 0x0A]
        );
    }

    #[test]
    fn test_transmit_length_invariant() {
        let mut engine = engine_2x2([[123, 456], [789, 4095]], config_12bit());
        engine.scan_cycle().unwrap();

        assert_eq!(engine.transport().bytes().len(), packet_len(4));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_dimensions() {
        let engine = engine_2x2([[0; 2]; 2], config_12bit());
        let dims = engine.dimensions();
        assert_eq!((dims.rows, dims.cols), (2, 2));
        assert_eq!(dims.total_cells(), 4);
    }
}
