//! Grid Frame Streaming Protocol
//!
//! This crate defines the one-way binary protocol between the scanning
//! controller and the host visualizer. One packet is emitted per complete
//! grid scan; there is no acknowledgment, framing negotiation, or flow
//! control.
//!
//! # Packet Overview
//!
//! ```text
//! ┌──────┬─────────────────┬──────────┬────────────┐
//! │ SYNC │ PAYLOAD         │ CHECKSUM │ TERMINATOR │
//! │ 2B   │ rows*cols*2 B   │ 2B       │ 2B (CR LF) │
//! └──────┴─────────────────┴──────────┴────────────┘
//! ```
//!
//! The payload carries the corrected 16-bit intensity values in row-major
//! order, little-endian. The checksum is the sum of every payload byte,
//! modulo 65536, little-endian - a corruption-detection aid, not an
//! error-correcting code. Grid dimensions are fixed per build; the
//! consumer learns them out-of-band.

#![no_std]
#![deny(unsafe_code)]

pub mod packet;
pub mod parser;

pub use packet::{
    encode_packet, packet_len, payload_checksum, Checksum, PacketError, FOOTER_LEN, HEADER_LEN,
    SYNC, TERMINATOR,
};
pub use parser::PacketParser;
