// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Sequential reads over a cell.

use super::{BitString, CellRef};
use crate::error::{KernelError, Result};

/// A read cursor over one cell.
///
/// Reference positions are absolute within the underlying cell, which is what
/// a proof skeleton needs when a structure starts in the middle of a cell.
#[derive(Debug, Clone)]
pub struct CellSlice {
    cell: CellRef,
    bit_pos: usize,
    ref_pos: usize,
}

impl CellSlice {
    pub fn new(cell: CellRef) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    pub fn cell(&self) -> &CellRef {
        &self.cell
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.ref_pos
    }

    /// Index within the cell of the next reference to be loaded.
    pub fn ref_position(&self) -> usize {
        self.ref_pos
    }

    fn ensure_bits(&self, needed: usize) -> Result<()> {
        if needed > self.remaining_bits() {
            return Err(KernelError::CellUnderflow {
                what: "bits",
                needed,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    pub fn load_bit(&mut self) -> Result<bool> {
        self.ensure_bits(1)?;
        let bit = self.cell.data().get(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u64> {
        debug_assert!(bits <= 64);
        self.ensure_bits(bits)?;
        let data = self.cell.data();
        let value = (self.bit_pos..self.bit_pos + bits)
            .fold(0u64, |acc, i| (acc << 1) | data.get(i) as u64);
        self.bit_pos += bits;
        Ok(value)
    }

    pub fn load_int(&mut self, bits: usize) -> Result<i64> {
        let raw = self.load_uint(bits)?;
        if bits == 0 || bits == 64 {
            return Ok(raw as i64);
        }
        let shift = 64 - bits;
        Ok(((raw << shift) as i64) >> shift)
    }

    pub fn load_bits(&mut self, bits: usize) -> Result<BitString> {
        self.ensure_bits(bits)?;
        let out = self.cell.data().slice(self.bit_pos, self.bit_pos + bits);
        self.bit_pos += bits;
        Ok(out)
    }

    pub fn load_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.load_bits(len * 8)?.as_bytes().to_vec())
    }

    pub fn load_u256(&mut self) -> Result<[u8; 32]> {
        let bits = self.load_bits(256)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(bits.as_bytes());
        Ok(out)
    }

    pub fn skip_bits(&mut self, bits: usize) -> Result<()> {
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(())
    }

    /// Loads the next reference together with its index in the cell.
    pub fn load_ref_indexed(&mut self) -> Result<(usize, CellRef)> {
        let index = self.ref_pos;
        let cell = self
            .cell
            .refs()
            .get(index)
            .cloned()
            .ok_or(KernelError::CellUnderflow {
                what: "refs",
                needed: 1,
                available: 0,
            })?;
        self.ref_pos += 1;
        Ok((index, cell))
    }

    pub fn load_ref(&mut self) -> Result<CellRef> {
        self.load_ref_indexed().map(|(_, cell)| cell)
    }

    /// `Maybe ^X`.
    pub fn load_maybe_ref_indexed(&mut self) -> Result<Option<(usize, CellRef)>> {
        if self.load_bit()? {
            self.load_ref_indexed().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn load_maybe_ref(&mut self) -> Result<Option<CellRef>> {
        Ok(self.load_maybe_ref_indexed()?.map(|(_, cell)| cell))
    }

    /// `VarUInteger 16`.
    pub fn load_coins(&mut self) -> Result<u128> {
        let len = self.load_uint(4)? as usize;
        let bytes = self.load_bytes(len)?;
        Ok(bytes.iter().fold(0u128, |acc, b| (acc << 8) | *b as u128))
    }

    /// `CurrencyCollection`: grams plus an optional extra-currency dictionary.
    pub fn skip_currency_collection(&mut self) -> Result<()> {
        self.load_coins()?;
        self.load_maybe_ref()?;
        Ok(())
    }

    pub fn peek_remaining_bits(&self) -> BitString {
        self.cell.data().slice(self.bit_pos, self.cell.bit_len())
    }

    pub fn remaining_ref_cells(&self) -> &[CellRef] {
        &self.cell.refs()[self.ref_pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellBuilder};
    use std::sync::Arc;

    #[test]
    fn test_ref_positions_are_absolute() {
        let mut b = CellBuilder::new();
        b.store_uint(0xAB, 8).unwrap();
        b.store_ref(Arc::new(Cell::empty())).unwrap();
        b.store_maybe_ref(Some(Arc::new(Cell::empty()))).unwrap();
        let mut s = CellSlice::new(b.build_ref().unwrap());

        assert_eq!(s.load_uint(8).unwrap(), 0xAB);
        let (first, _) = s.load_ref_indexed().unwrap();
        let (second, _) = s.load_maybe_ref_indexed().unwrap().unwrap();
        assert_eq!((first, second), (0, 1));
        assert_eq!(s.remaining_refs(), 0);
    }

    #[test]
    fn test_underflow_reports_counts() {
        let mut b = CellBuilder::new();
        b.store_uint(1, 3).unwrap();
        let mut s = CellSlice::new(b.build_ref().unwrap());
        match s.load_uint(8) {
            Err(KernelError::CellUnderflow { needed, available, .. }) => {
                assert_eq!((needed, available), (8, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
