//! Byte-at-a-time packet parser (consumer side).
//!
//! Feeds on a raw serial stream and recovers complete frames. The parser
//! hunts for the sync marker, so it recovers from garbage, truncated
//! packets, and checksum failures by discarding bytes until the next
//! valid packet boundary.

use heapless::Vec;

use crate::packet::{Checksum, PacketError, SYNC, TERMINATOR};

/// State machine for parsing incoming packets
///
/// `MAX_CELLS` is the compile-time payload capacity; the actual expected
/// cell count is fixed at construction (grid dimensions are known to the
/// consumer out-of-band).
#[derive(Debug, Clone)]
pub struct PacketParser<const MAX_CELLS: usize> {
    state: ParseState,
    cell_count: usize,
    cells: Vec<u16, MAX_CELLS>,
    sum: Checksum,
    /// Low byte of the cell or checksum currently being assembled
    pending_lo: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Hunting for the first sync byte
    SyncA,
    /// Got 0xAA, expecting 0x55
    SyncB,
    /// Reading the low byte of a cell value
    PayloadLow,
    /// Reading the high byte of a cell value
    PayloadHigh,
    /// Reading the low byte of the checksum
    ChecksumLow,
    /// Reading the high byte of the checksum
    ChecksumHigh,
    /// Expecting the CR terminator byte
    TermCr,
    /// Expecting the LF terminator byte
    TermLf,
}

impl<const MAX_CELLS: usize> PacketParser<MAX_CELLS> {
    /// Create a parser expecting `cell_count` cells per packet
    pub fn new(cell_count: usize) -> Result<Self, PacketError> {
        if cell_count > MAX_CELLS {
            return Err(PacketError::CapacityExceeded);
        }

        Ok(Self {
            state: ParseState::SyncA,
            cell_count,
            cells: Vec::new(),
            sum: Checksum::new(),
            pending_lo: 0,
        })
    }

    /// Reset the parser to hunt for the next sync marker
    pub fn reset(&mut self) {
        self.state = ParseState::SyncA;
        self.cells.clear();
        self.sum = Checksum::new();
        self.pending_lo = 0;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(cells))` when a complete valid packet is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on a malformed
    /// packet (the parser resets itself and resumes hunting for sync).
    pub fn feed(&mut self, byte: u8) -> Result<Option<Vec<u16, MAX_CELLS>>, PacketError> {
        match self.state {
            ParseState::SyncA => {
                if byte == SYNC[0] {
                    self.state = ParseState::SyncB;
                }
                // Silently discard non-sync bytes while hunting
                Ok(None)
            }
            ParseState::SyncB => {
                if byte == SYNC[1] {
                    self.cells.clear();
                    self.sum = Checksum::new();
                    self.state = if self.cell_count == 0 {
                        ParseState::ChecksumLow
                    } else {
                        ParseState::PayloadLow
                    };
                } else if byte != SYNC[0] {
                    // 0xAA 0xAA 0x55 is still a valid sync; anything else
                    // restarts the hunt
                    self.state = ParseState::SyncA;
                }
                Ok(None)
            }
            ParseState::PayloadLow => {
                self.pending_lo = byte;
                self.sum.push_byte(byte);
                self.state = ParseState::PayloadHigh;
                Ok(None)
            }
            ParseState::PayloadHigh => {
                let value = u16::from_le_bytes([self.pending_lo, byte]);
                self.sum.push_byte(byte);
                // Cannot overflow: cell_count was bounds-checked at construction
                let _ = self.cells.push(value);
                self.state = if self.cells.len() == self.cell_count {
                    ParseState::ChecksumLow
                } else {
                    ParseState::PayloadLow
                };
                Ok(None)
            }
            ParseState::ChecksumLow => {
                self.pending_lo = byte;
                self.state = ParseState::ChecksumHigh;
                Ok(None)
            }
            ParseState::ChecksumHigh => {
                let received = u16::from_le_bytes([self.pending_lo, byte]);
                if received != self.sum.get() {
                    self.reset();
                    return Err(PacketError::ChecksumMismatch);
                }
                self.state = ParseState::TermCr;
                Ok(None)
            }
            ParseState::TermCr => {
                if byte != TERMINATOR[0] {
                    self.reset();
                    return Err(PacketError::InvalidTerminator);
                }
                self.state = ParseState::TermLf;
                Ok(None)
            }
            ParseState::TermLf => {
                if byte != TERMINATOR[1] {
                    self.reset();
                    return Err(PacketError::InvalidTerminator);
                }
                let cells = self.cells.clone();
                self.reset();
                Ok(Some(cells))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any. Bytes after a
    /// complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Vec<u16, MAX_CELLS>>, PacketError> {
        for &byte in bytes {
            if let Some(cells) = self.feed(byte)? {
                return Ok(Some(cells));
            }
        }
        Ok(None)
    }
}
