// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Cell construction.

use std::sync::Arc;

use super::{BitString, Cell, CellKind, CellRef, CellSlice};
use crate::config::{MAX_CELL_BITS, MAX_CELL_REFS};
use crate::error::{KernelError, Result};

#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: BitString,
    refs: Vec<CellRef>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits_used(&self) -> usize {
        self.data.len()
    }

    pub fn refs_used(&self) -> usize {
        self.refs.len()
    }

    fn ensure_bits(&self, extra: usize) -> Result<()> {
        if self.data.len() + extra > MAX_CELL_BITS {
            return Err(KernelError::CellOverflow {
                bits: self.data.len() + extra,
                refs: self.refs.len(),
            });
        }
        Ok(())
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.ensure_bits(1)?;
        self.data.push(bit);
        Ok(self)
    }

    /// Stores the low `bits` bits of `value`; `value` must fit.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        if bits > 64 || (bits < 64 && value >> bits != 0) {
            return Err(KernelError::Encoding(format!(
                "value {value} does not fit in {bits} bits"
            )));
        }
        self.ensure_bits(bits)?;
        self.data.push_uint(value, bits);
        Ok(self)
    }

    /// Stores a two's complement signed integer.
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self> {
        if bits == 0 || bits > 64 {
            return Err(KernelError::Encoding(format!("invalid int width {bits}")));
        }
        if bits < 64 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if value < min || value > max {
                return Err(KernelError::Encoding(format!(
                    "value {value} does not fit in int{bits}"
                )));
            }
        }
        let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        self.ensure_bits(bits)?;
        self.data.push_uint(value as u64 & mask, bits);
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.ensure_bits(bytes.len() * 8)?;
        self.data.extend(&BitString::from_bytes(bytes));
        Ok(self)
    }

    pub fn store_bits(&mut self, bits: &BitString) -> Result<&mut Self> {
        self.ensure_bits(bits.len())?;
        self.data.extend(bits);
        Ok(self)
    }

    pub fn store_ref(&mut self, cell: CellRef) -> Result<&mut Self> {
        if self.refs.len() >= MAX_CELL_REFS {
            return Err(KernelError::CellOverflow {
                bits: self.data.len(),
                refs: self.refs.len() + 1,
            });
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// `Maybe ^X`: a presence bit followed by the reference.
    pub fn store_maybe_ref(&mut self, cell: Option<CellRef>) -> Result<&mut Self> {
        match cell {
            Some(cell) => {
                self.store_bit(true)?;
                self.store_ref(cell)
            }
            None => self.store_bit(false),
        }
    }

    /// `VarUInteger 16`: a 4-bit byte length followed by the value.
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self> {
        let len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        if len > 15 {
            return Err(KernelError::Encoding(format!("coins {amount} out of range")));
        }
        self.store_uint(len as u64, 4)?;
        let bytes = amount.to_be_bytes();
        self.store_bytes(&bytes[16 - len..])
    }

    /// Appends the unread remainder of `slice`.
    pub fn store_slice(&mut self, slice: &CellSlice) -> Result<&mut Self> {
        let bits = slice.peek_remaining_bits();
        self.store_bits(&bits)?;
        for cell in slice.remaining_ref_cells() {
            self.store_ref(cell.clone())?;
        }
        Ok(self)
    }

    /// Appends the contents of another builder.
    pub fn append(&mut self, other: &CellBuilder) -> Result<&mut Self> {
        self.store_bits(&other.data)?;
        for cell in &other.refs {
            self.store_ref(cell.clone())?;
        }
        Ok(self)
    }

    pub fn build(&self) -> Result<Cell> {
        Cell::from_parts(CellKind::Ordinary, self.data.clone(), self.refs.clone())
    }

    pub fn build_ref(&self) -> Result<CellRef> {
        self.build().map(Arc::new)
    }
}
