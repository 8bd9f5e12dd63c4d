//! Single-ended ADC acquisition path
//!
//! The multiplexed topology senses every column through one analog input
//! on the controller's internal SAR converter. The platform provides the
//! conversion primitive; this module adds fixed-count oversampling to
//! suppress high-frequency noise.

use tessera_core::traits::{RawSample, SampleSource};

/// 12-bit full-scale value for internal SAR converters
pub const FULL_SCALE_12BIT: u32 = 4095;

/// Single-ended ADC conversion primitive (platform-provided)
pub trait AdcInput {
    /// Perform one blocking conversion (12-bit, 0-4095)
    fn read(&mut self) -> u16;
}

/// Fixed-count averaging sampler
///
/// Each `read_raw` triggers `samples` conversions and returns their
/// integer average.
pub struct Oversampled<A> {
    adc: A,
    samples: u8,
}

impl<A> Oversampled<A> {
    /// Samples averaged per reading unless configured otherwise
    pub const DEFAULT_SAMPLES: u8 = 4;

    /// Create a sampler averaging `samples` conversions per reading
    ///
    /// A `samples` of zero is treated as one.
    pub fn new(adc: A, samples: u8) -> Self {
        Self {
            adc,
            samples: samples.max(1),
        }
    }

    /// Create a sampler with the default sample count
    pub fn with_default_samples(adc: A) -> Self {
        Self::new(adc, Self::DEFAULT_SAMPLES)
    }

    /// Access to the underlying ADC
    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }
}

impl<A: AdcInput> SampleSource for Oversampled<A> {
    fn read_raw(&mut self) -> RawSample {
        let mut sum: u32 = 0;
        for _ in 0..self.samples {
            sum += self.adc.read() as u32;
        }
        sum / self.samples as u32
    }
}
