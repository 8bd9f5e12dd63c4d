//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the capability traits
//! defined in tessera-core for the two observed grid topologies:
//!
//! - Analog multiplexer fan-out addressing (CD4051-class chips)
//! - Direct GPIO row drive
//! - ADS1220 delta-sigma converter bank over SPI
//! - Oversampled single-ended ADC acquisition
//! - Combined grid front-ends consumed by the scan engine

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod ads1220;
pub mod frontend;
pub mod gpio;
pub mod mux;
