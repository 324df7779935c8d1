// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Binary tries keyed by fixed-width bit strings (`Hashmap n X`).
//!
//! ```text
//! hm_edge#_ label:(HmLabel ~l n) node:(HashmapNode m X)   // n = l + m
//! hmn_leaf#_ value:X                                      // m = 0
//! hmn_fork#_ left:^(Hashmap m-1 X) right:^(Hashmap m-1 X)
//! ```
//! Augmented forks (`HashmapAug`) carry extra bits after the two refs; lookups
//! never read them, so the same traversal serves both flavours.

pub mod builder;
mod label;

pub use builder::DictBuilder;

use crate::cell::{BitString, CellRef, CellSlice};
use crate::error::{KernelError, Result};
use crate::proof::skeleton::ProofSkeleton;

/// A non-empty dictionary whose root edge starts at a slice cursor.
///
/// The root may begin in the middle of a cell (inline `Hashmap`) or at the
/// start of a referenced cell (`HashmapE`). Either way, the skeleton passed to
/// [`Dictionary::lookup_with_path`] must be the node of the cell holding the root.
#[derive(Debug, Clone)]
pub struct Dictionary {
    root: CellSlice,
    key_bits: usize,
}

impl Dictionary {
    /// Dictionary whose root edge starts at the cursor of `root`.
    pub fn inline(root: CellSlice, key_bits: usize) -> Self {
        Self { root, key_bits }
    }

    /// Dictionary rooted at the start of `cell`.
    pub fn from_root_cell(cell: CellRef, key_bits: usize) -> Self {
        Self::inline(CellSlice::new(cell), key_bits)
    }

    /// Reads a `HashmapE`: `None` when empty, otherwise the ref slot of the
    /// root cell within `slice`'s cell together with the dictionary.
    pub fn load_optional(slice: &mut CellSlice, key_bits: usize) -> Result<Option<(usize, Self)>> {
        Ok(slice
            .load_maybe_ref_indexed()?
            .map(|(index, cell)| (index, Self::from_root_cell(cell, key_bits))))
    }

    pub fn key_bits(&self) -> usize {
        self.key_bits
    }

    pub fn root_cell(&self) -> &CellRef {
        self.root.cell()
    }

    /// Finds `key`, recording every fork taken as a `descend` on `skeleton`.
    ///
    /// Returns the value slice and the skeleton node of the leaf cell, ready to
    /// be marked recursive or descended into further.
    pub fn lookup_with_path<'s>(
        &self,
        key: &BitString,
        skeleton: &'s mut ProofSkeleton,
    ) -> Result<(CellSlice, &'s mut ProofSkeleton)> {
        self.check_key(key)?;
        let mut slice = self.root.clone();
        let mut node = skeleton;
        let mut pos = 0;

        loop {
            let remaining = self.key_bits - pos;
            let label = label::read_label(&mut slice, remaining).map_err(malformed)?;
            if key.slice(pos, pos + label.len()) != label {
                return Err(KernelError::key_not_found(key));
            }
            pos += label.len();
            if pos == self.key_bits {
                return Ok((slice, node));
            }

            if slice.remaining_refs() < 2 {
                return Err(KernelError::MalformedDictionary(format!(
                    "fork at bit {pos} has {} refs",
                    slice.remaining_refs()
                )));
            }
            let index = slice.ref_position() + key.get(pos) as usize;
            let child = slice.cell().reference(index)?.clone();
            node = node.descend(index)?;
            slice = CellSlice::new(child);
            pos += 1;
        }
    }

    /// Plain lookup without recording a path.
    pub fn get(&self, key: &BitString) -> Result<CellSlice> {
        let mut scratch = ProofSkeleton::new();
        self.lookup_with_path(key, &mut scratch)
            .map(|(value, _)| value)
    }

    pub fn get_uint(&self, key: u64) -> Result<CellSlice> {
        self.get(&BitString::from_uint(key, self.key_bits))
    }

    /// Every entry in ascending key order.
    pub fn load_all(&self) -> Result<Vec<(BitString, CellSlice)>> {
        let mut out = Vec::new();
        self.collect(self.root.clone(), BitString::with_capacity(self.key_bits), &mut out)
            .map_err(malformed)?;
        Ok(out)
    }

    fn collect(
        &self,
        mut slice: CellSlice,
        prefix: BitString,
        out: &mut Vec<(BitString, CellSlice)>,
    ) -> Result<()> {
        let remaining = self.key_bits - prefix.len();
        let label = label::read_label(&mut slice, remaining)?;
        let mut key = prefix;
        key.extend(&label);
        if key.len() == self.key_bits {
            out.push((key, slice));
            return Ok(());
        }

        let left = slice.load_ref()?;
        let right = slice.load_ref()?;
        for (bit, child) in [(false, left), (true, right)] {
            let mut child_key = key.clone();
            child_key.push(bit);
            self.collect(CellSlice::new(child), child_key, out)?;
        }
        Ok(())
    }

    fn check_key(&self, key: &BitString) -> Result<()> {
        if key.len() != self.key_bits {
            return Err(KernelError::InvalidKeyWidth {
                expected: self.key_bits,
                found: key.len(),
            });
        }
        Ok(())
    }
}

/// Reading past the end of a trie node means the trie itself is broken.
fn malformed(err: KernelError) -> KernelError {
    match err {
        KernelError::CellUnderflow { .. } => KernelError::MalformedDictionary(err.to_string()),
        other => other,
    }
}
