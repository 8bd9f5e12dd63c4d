//! ADS1220 24-bit delta-sigma ADC bank (SPI)
//!
//! Texas Instruments ADS1220: 4-channel, 24-bit delta-sigma converter
//! with an SPI interface. Column sensing uses several chips on one
//! shared SPI bus, each with its own chip-select line (active LOW).
//!
//! # SPI Protocol
//!
//! Single-byte commands, with register access encoded in the command
//! byte:
//! - RESET (0x06), START/SYNC (0x08), POWERDOWN (0x02), RDATA (0x10)
//! - RREG: `0x20 | (addr << 2)`, WREG: `0x40 | (addr << 2)`
//!
//! Conversion results are 24 bits, clocked out MSB first.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Converter full-scale value (24-bit)
pub const FULL_SCALE: u32 = 0xFF_FFFF;

/// Single-ended input channels per chip (AIN0-AIN3 vs AVSS)
pub const CHANNELS_PER_CHIP: usize = 4;

/// SPI command bytes
pub mod cmd {
    /// Reset the device
    pub const RESET: u8 = 0x06;
    /// Start/sync conversions
    pub const START: u8 = 0x08;
    /// Enter power-down mode
    pub const POWERDOWN: u8 = 0x02;
    /// Read conversion data by command
    pub const RDATA: u8 = 0x10;
    /// Read register (OR with `addr << 2`)
    pub const RREG: u8 = 0x20;
    /// Write register (OR with `addr << 2`)
    pub const WREG: u8 = 0x40;
}

/// Configuration register addresses
pub mod reg {
    /// MUX, gain, PGA bypass
    pub const REG0: u8 = 0x00;
    /// Data rate, operating mode, conversion mode
    pub const REG1: u8 = 0x01;
    /// Reference selection, 50/60 Hz rejection
    pub const REG2: u8 = 0x02;
    /// IDAC routing, DRDY mode
    pub const REG3: u8 = 0x03;
}

/// Register 0 fields: MUX[3:0] | GAIN[2:0] | PGA_BYPASS
pub mod reg0 {
    /// AIN0 vs AVSS, single-ended
    pub const MUX_AIN0_AVSS: u8 = 0x80;
    /// AIN1 vs AVSS, single-ended
    pub const MUX_AIN1_AVSS: u8 = 0x90;
    /// AIN2 vs AVSS, single-ended
    pub const MUX_AIN2_AVSS: u8 = 0xA0;
    /// AIN3 vs AVSS, single-ended
    pub const MUX_AIN3_AVSS: u8 = 0xB0;

    /// Gain = 1
    pub const GAIN_1: u8 = 0x00;
    /// Gain = 2
    pub const GAIN_2: u8 = 0x02;
    /// Gain = 4
    pub const GAIN_4: u8 = 0x04;

    /// Bypass the PGA (required for near-rail single-ended inputs)
    pub const PGA_BYPASS: u8 = 0x01;
}

/// Register 1 fields: DR[2:0] | MODE[1:0] | CM | TS | BCS
pub mod reg1 {
    /// 20 SPS (normal mode)
    pub const DR_20SPS: u8 = 0x00;
    /// 330 SPS (normal mode)
    pub const DR_330SPS: u8 = 0x80;
    /// 1000 SPS (turbo mode)
    pub const DR_1000SPS: u8 = 0xC0;

    /// Normal operating mode
    pub const MODE_NORMAL: u8 = 0x00;
    /// Turbo operating mode
    pub const MODE_TURBO: u8 = 0x10;

    /// Single-shot conversion mode
    pub const CM_SINGLE: u8 = 0x00;
    /// Continuous conversion mode
    pub const CM_CONTINUOUS: u8 = 0x04;
}

/// Register 2 fields: VREF[1:0] | 50/60[1:0] | PSW | IDAC[2:0]
pub mod reg2 {
    /// Internal 2.048 V reference
    pub const VREF_INTERNAL: u8 = 0x00;
    /// External reference on REFP0/REFN0
    pub const VREF_EXTERNAL: u8 = 0x40;
    /// AVDD as reference
    pub const VREF_AVDD: u8 = 0x80;

    /// No 50/60 Hz rejection
    pub const REJECT_OFF: u8 = 0x00;
    /// Simultaneous 50 Hz and 60 Hz rejection
    pub const REJECT_BOTH: u8 = 0x10;
}

/// MUX codes for the four single-ended channels
const CHANNEL_MUX: [u8; CHANNELS_PER_CHIP] = [
    reg0::MUX_AIN0_AVSS,
    reg0::MUX_AIN1_AVSS,
    reg0::MUX_AIN2_AVSS,
    reg0::MUX_AIN3_AVSS,
];

/// ADS1220 configuration register values
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ads1220Config {
    /// REG0: input MUX, gain, PGA bypass
    pub reg0: u8,
    /// REG1: data rate, mode, conversion mode
    pub reg1: u8,
    /// REG2: reference, mains rejection
    pub reg2: u8,
    /// REG3: IDAC routing
    pub reg3: u8,
    /// Wait after START before reading the result, microseconds
    ///
    /// At 1000 SPS turbo a conversion takes about 1 ms; the default adds
    /// margin.
    pub conversion_wait_us: u32,
}

impl Default for Ads1220Config {
    fn default() -> Self {
        // Fast single-shot readings: AIN0 vs AVSS, gain 1, PGA bypassed,
        // 1000 SPS turbo, AVDD reference
        Self {
            reg0: reg0::MUX_AIN0_AVSS | reg0::GAIN_1 | reg0::PGA_BYPASS,
            reg1: reg1::DR_1000SPS | reg1::MODE_TURBO | reg1::CM_SINGLE,
            reg2: reg2::VREF_AVDD,
            reg3: 0x00,
            conversion_wait_us: 2000,
        }
    }
}

/// Bank of ADS1220 chips on a shared SPI bus
///
/// Driver-level bus errors are surfaced here; the grid front-end decides
/// how to absorb them (see `frontend`).
pub struct Ads1220Bank<SPI, CS, D, const CHIPS: usize> {
    spi: SPI,
    cs: [CS; CHIPS],
    delay: D,
    config: Ads1220Config,
}

impl<SPI, CS, D, const CHIPS: usize> Ads1220Bank<SPI, CS, D, CHIPS>
where
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    /// Create a bank with every chip deselected
    pub fn new(spi: SPI, cs: [CS; CHIPS], delay: D, config: Ads1220Config) -> Self {
        let mut bank = Self {
            spi,
            cs,
            delay,
            config,
        };
        for chip in 0..CHIPS {
            bank.cs[chip].set_high().ok();
        }
        bank
    }

    /// Number of chips in the bank
    pub const fn chips(&self) -> usize {
        CHIPS
    }

    /// Total single-ended channels across the bank
    pub const fn channels(&self) -> usize {
        CHIPS * CHANNELS_PER_CHIP
    }

    /// Reset and configure every chip for single-shot operation
    ///
    /// Must be called once after power-on, before the first conversion.
    pub fn init(&mut self) -> Result<(), SPI::Error> {
        // Power-on settling before the first command
        self.delay.delay_ms(10);

        let config = self.config;
        for chip in 0..CHIPS {
            self.send_command(chip, cmd::RESET)?;
            self.delay.delay_ms(1);

            self.write_register(chip, reg::REG0, config.reg0)?;
            self.write_register(chip, reg::REG1, config.reg1)?;
            self.write_register(chip, reg::REG2, config.reg2)?;
            self.write_register(chip, reg::REG3, config.reg3)?;
        }

        Ok(())
    }

    /// Route `channel` to chip `chip`'s input
    ///
    /// Rewrites REG0's MUX field, keeping the configured gain and PGA
    /// bits. Must complete before the next conversion is triggered.
    /// Out-of-range indices are ignored.
    pub fn set_channel(&mut self, chip: usize, channel: usize) -> Result<(), SPI::Error> {
        if chip >= CHIPS || channel >= CHANNELS_PER_CHIP {
            return Ok(());
        }

        let value = CHANNEL_MUX[channel] | (self.config.reg0 & 0x0F);
        self.write_register(chip, reg::REG0, value)
    }

    /// Trigger one conversion on chip `chip` and read the 24-bit result
    pub fn read_data(&mut self, chip: usize) -> Result<u32, SPI::Error> {
        if chip >= CHIPS {
            return Ok(0);
        }

        self.send_command(chip, cmd::START)?;
        self.delay.delay_us(self.config.conversion_wait_us);

        self.cs[chip].set_low().ok();
        let result = self.read_data_exchange();
        self.cs[chip].set_high().ok();

        result
    }

    /// Convenience: select a channel and read it
    pub fn read_channel(&mut self, chip: usize, channel: usize) -> Result<u32, SPI::Error> {
        self.set_channel(chip, channel)?;
        self.read_data(chip)
    }

    /// Read back a configuration register
    pub fn read_register(&mut self, chip: usize, reg: u8) -> Result<u8, SPI::Error> {
        if chip >= CHIPS {
            return Ok(0);
        }

        self.cs[chip].set_low().ok();
        let result = self.read_register_exchange(reg);
        self.cs[chip].set_high().ok();

        result
    }

    fn send_command(&mut self, chip: usize, command: u8) -> Result<(), SPI::Error> {
        self.cs[chip].set_low().ok();
        let result = self.spi.write(&[command]);
        self.cs[chip].set_high().ok();
        result
    }

    fn write_register(&mut self, chip: usize, reg: u8, value: u8) -> Result<(), SPI::Error> {
        self.cs[chip].set_low().ok();
        let result = self.spi.write(&[cmd::WREG | (reg << 2), value]);
        self.cs[chip].set_high().ok();
        result
    }

    fn read_data_exchange(&mut self) -> Result<u32, SPI::Error> {
        self.spi.write(&[cmd::RDATA])?;
        let mut rx = [0u8; 3];
        self.spi.read(&mut rx)?;

        // 24-bit result, MSB first
        Ok(((rx[0] as u32) << 16) | ((rx[1] as u32) << 8) | (rx[2] as u32))
    }

    fn read_register_exchange(&mut self, reg: u8) -> Result<u8, SPI::Error> {
        self.spi.write(&[cmd::RREG | (reg << 2)])?;
        let mut rx = [0u8; 1];
        self.spi.read(&mut rx)?;
        Ok(rx[0])
    }
}
