//! In-memory coverage cache.
//!
//! Coverage queries ("which cells hold real data?") only need the low four
//! status bits of each cell, so the cache packs exactly those, 4 bits per
//! cell, using the same bit codec as the record store. For a typical survey
//! grid this is two orders of magnitude smaller than the records it
//! summarizes.
//!
//! The cache lives on the open file handle. It is built by one full scan,
//! kept in step with every write that goes through the handle, and freed as
//! a whole; it is never partially invalidated.

use crate::bitpack::{pack_bits, unpack_bits};

/// Packed per-cell status nibbles for one grid.
#[derive(Debug)]
pub(crate) struct CoverageMap {
    width: u32,
    bits: Vec<u8>,
}

impl CoverageMap {
    /// Allocate a zeroed map. Callers bounds-check rows and columns; the
    /// map itself only does the arithmetic.
    pub(crate) fn with_dimensions(width: u32, height: u32) -> CoverageMap {
        let cells = width as usize * height as usize;
        CoverageMap {
            width,
            bits: vec![0u8; cells.div_ceil(2)],
        }
    }

    fn cell_bit(&self, row: u32, col: u32) -> usize {
        (row as usize * self.width as usize + col as usize) * 4
    }

    /// Record the low four status bits of a cell.
    pub(crate) fn set(&mut self, row: u32, col: u32, status: u32) {
        let bit = self.cell_bit(row, col);
        pack_bits(&mut self.bits, bit, 4, status & 0xF);
    }

    /// The cached status nibble of a cell.
    pub(crate) fn get(&self, row: u32, col: u32) -> u8 {
        unpack_bits(&self.bits, self.cell_bit(row, col), 4) as u8
    }
}
