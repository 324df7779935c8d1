// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Content-addressed cell trees.
//!
//! A cell holds up to 1023 data bits and up to 4 ordered child references.
//! Its hash is SHA-256 over the level-0 representation:
//!
//! ```text
//! d1 (refs + 8 * exotic) | d2 (byte length descriptor) | data (completion tagged)
//! | depth(child_i) as u16 BE ... | hash(child_i) ...
//! ```
//!
//! A pruned branch stands in for a subtree and reports that subtree's hash and
//! depth, so the parent's hash is the same whether it references the original
//! or the placeholder.
//!
//! An ordinary cell's level mask is the OR of its children's masks. A merkle
//! proof shifts its child's mask down by one. Only the level-0 hash is computed.

pub mod bits;
pub mod boc;
pub mod builder;
pub mod slice;

use core::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

pub use bits::BitString;
pub use builder::CellBuilder;
pub use slice::CellSlice;

use crate::config::{MAX_CELL_BITS, MAX_CELL_REFS};
use crate::error::{KernelError, Result};

pub type CellRef = Arc<Cell>;

const PRUNED_BRANCH_TAG: u8 = 1;
const LIBRARY_TAG: u8 = 2;
const MERKLE_PROOF_TAG: u8 = 3;

/// Level mask carried by every pruned branch this crate produces.
const PRUNED_LEVEL_MASK: u8 = 1;

const PRUNED_BITS: usize = 8 + 8 + 256 + 16;
const LIBRARY_BITS: usize = 8 + 256;
const MERKLE_PROOF_BITS: usize = 8 + 256 + 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Ordinary,
    PrunedBranch,
    Library,
    MerkleProof,
}

impl CellKind {
    pub fn is_exotic(self) -> bool {
        self != CellKind::Ordinary
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            PRUNED_BRANCH_TAG => Ok(CellKind::PrunedBranch),
            LIBRARY_TAG => Ok(CellKind::Library),
            MERKLE_PROOF_TAG => Ok(CellKind::MerkleProof),
            other => Err(KernelError::InvalidExoticCell(format!(
                "unsupported exotic tag {other}"
            ))),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Cell {
    kind: CellKind,
    data: BitString,
    refs: Vec<CellRef>,
    hash: [u8; 32],
    depth: u16,
    level_mask: u8,
}

impl Cell {
    /// Validates the layout of `kind` and computes hash and depth.
    pub fn from_parts(kind: CellKind, data: BitString, refs: Vec<CellRef>) -> Result<Self> {
        if data.len() > MAX_CELL_BITS || refs.len() > MAX_CELL_REFS {
            return Err(KernelError::CellOverflow {
                bits: data.len(),
                refs: refs.len(),
            });
        }

        let (hash, depth, level_mask) = match kind {
            CellKind::Ordinary => (
                representation_hash(kind, &data, &refs),
                child_depth(&refs)?,
                children_mask(&refs),
            ),
            CellKind::PrunedBranch => {
                if data.len() != PRUNED_BITS || !refs.is_empty() {
                    return Err(KernelError::InvalidExoticCell(
                        "pruned branch must carry 288 bits and no refs".into(),
                    ));
                }
                let raw = data.as_bytes();
                check_tag(raw[0], PRUNED_BRANCH_TAG)?;
                if raw[1] != PRUNED_LEVEL_MASK {
                    return Err(KernelError::InvalidExoticCell(format!(
                        "pruned branch level mask {} unsupported",
                        raw[1]
                    )));
                }
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&raw[2..34]);
                (hash, u16::from_be_bytes([raw[34], raw[35]]), PRUNED_LEVEL_MASK)
            }
            CellKind::Library => {
                if data.len() != LIBRARY_BITS || !refs.is_empty() {
                    return Err(KernelError::InvalidExoticCell(
                        "library cell must carry 264 bits and no refs".into(),
                    ));
                }
                check_tag(data.as_bytes()[0], LIBRARY_TAG)?;
                (representation_hash(kind, &data, &refs), 0, 0)
            }
            CellKind::MerkleProof => {
                if data.len() != MERKLE_PROOF_BITS || refs.len() != 1 {
                    return Err(KernelError::InvalidExoticCell(
                        "merkle proof must carry 280 bits and one ref".into(),
                    ));
                }
                let raw = data.as_bytes();
                check_tag(raw[0], MERKLE_PROOF_TAG)?;
                let inner = &refs[0];
                if raw[1..33] != inner.hash()[..] || u16::from_be_bytes([raw[33], raw[34]]) != inner.depth() {
                    return Err(KernelError::InvalidExoticCell(
                        "merkle proof does not match its child".into(),
                    ));
                }
                (
                    representation_hash(kind, &data, &refs),
                    child_depth(&refs)?,
                    inner.level_mask >> 1,
                )
            }
        };

        Ok(Self {
            kind,
            data,
            refs,
            hash,
            depth,
            level_mask,
        })
    }

    /// A placeholder holding only the hash and depth of `original`.
    pub fn pruned(original: &Cell) -> Self {
        if original.kind == CellKind::PrunedBranch {
            return original.clone();
        }
        let mut data = BitString::with_capacity(PRUNED_BITS);
        data.push_uint(PRUNED_BRANCH_TAG as u64, 8);
        data.push_uint(PRUNED_LEVEL_MASK as u64, 8);
        data.extend(&BitString::from_bytes(&original.hash));
        data.push_uint(original.depth as u64, 16);
        Self {
            kind: CellKind::PrunedBranch,
            data,
            refs: Vec::new(),
            hash: original.hash,
            depth: original.depth,
            level_mask: PRUNED_LEVEL_MASK,
        }
    }

    /// Wraps `inner` in a merkle proof header committing to its hash and depth.
    pub fn merkle_proof(inner: CellRef) -> Result<Self> {
        let mut data = BitString::with_capacity(MERKLE_PROOF_BITS);
        data.push_uint(MERKLE_PROOF_TAG as u64, 8);
        data.extend(&BitString::from_bytes(inner.hash()));
        data.push_uint(inner.depth() as u64, 16);
        Self::from_parts(CellKind::MerkleProof, data, vec![inner])
    }

    pub fn empty() -> Self {
        // An empty ordinary cell is always within limits.
        Self {
            kind: CellKind::Ordinary,
            hash: representation_hash(CellKind::Ordinary, &BitString::new(), &[]),
            data: BitString::new(),
            refs: Vec::new(),
            depth: 0,
            level_mask: 0,
        }
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_exotic(&self) -> bool {
        self.kind.is_exotic()
    }

    pub fn data(&self) -> &BitString {
        &self.data
    }

    pub fn bit_len(&self) -> usize {
        self.data.len()
    }

    pub fn refs(&self) -> &[CellRef] {
        &self.refs
    }

    pub fn reference(&self, index: usize) -> Result<&CellRef> {
        self.refs.get(index).ok_or(KernelError::IndexOutOfRange {
            index,
            available: self.refs.len(),
        })
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn level_mask(&self) -> u8 {
        self.level_mask
    }

    /// Descriptor bytes as written in a bag of cells.
    pub fn descriptors(&self) -> [u8; 2] {
        let mut d1 = self.refs.len() as u8;
        if self.is_exotic() {
            d1 |= 8;
        }
        d1 |= self.level_mask << 5;
        [d1, data_descriptor(self.data.len())]
    }

    /// Hash of the proof a merkle proof cell commits to.
    pub fn proven_hash(&self) -> Option<[u8; 32]> {
        if self.kind != CellKind::MerkleProof {
            return None;
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.data.as_bytes()[1..33]);
        Some(out)
    }

    /// Number of distinct cells reachable from here, counted by (hash, kind).
    pub fn count_unique(&self) -> usize {
        let mut seen = rustc_hash::FxHashSet::default();
        count_into(self, &mut seen);
        seen.len()
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let label = match self.kind {
            CellKind::Ordinary => String::new(),
            CellKind::PrunedBranch => "pruned ".to_string(),
            CellKind::Library => "library ".to_string(),
            CellKind::MerkleProof => "proof ".to_string(),
        };
        write!(
            f,
            "{:indent$}{label}{}[{}]",
            "",
            self.data.len(),
            self.data,
            indent = indent
        )?;
        if self.refs.is_empty() {
            return writeln!(f);
        }
        writeln!(f, " -> {{")?;
        for child in &self.refs {
            child.fmt_tree(f, indent + 2)?;
        }
        writeln!(f, "{:indent$}}}", "", indent = indent)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("kind", &self.kind)
            .field("bits", &self.data.len())
            .field("refs", &self.refs.len())
            .field("hash", &hex::encode(self.hash))
            .finish()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

fn count_into(cell: &Cell, seen: &mut rustc_hash::FxHashSet<([u8; 32], CellKind)>) {
    if !seen.insert((cell.hash, cell.kind)) {
        return;
    }
    for child in &cell.refs {
        count_into(child, seen);
    }
}

fn check_tag(found: u8, expected: u8) -> Result<()> {
    if found != expected {
        return Err(KernelError::InvalidExoticCell(format!(
            "expected tag {expected}, found {found}"
        )));
    }
    Ok(())
}

pub(crate) fn data_descriptor(bits: usize) -> u8 {
    (bits / 8 + bits.div_ceil(8)) as u8
}

fn child_depth(refs: &[CellRef]) -> Result<u16> {
    match refs.iter().map(|c| c.depth()).max() {
        None => Ok(0),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| KernelError::InvalidExoticCell("cell depth overflow".into())),
    }
}

fn children_mask(refs: &[CellRef]) -> u8 {
    refs.iter().fold(0, |mask, c| mask | c.level_mask)
}

fn representation_hash(kind: CellKind, data: &BitString, refs: &[CellRef]) -> [u8; 32] {
    let mut d1 = refs.len() as u8;
    if kind.is_exotic() {
        d1 |= 8;
    }
    let mut hasher = Sha256::new();
    hasher.update([d1, data_descriptor(data.len())]);
    hasher.update(data.padded_bytes());
    for child in refs {
        hasher.update(child.depth().to_be_bytes());
    }
    for child in refs {
        hasher.update(child.hash());
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: u64) -> CellRef {
        let mut b = CellBuilder::new();
        b.store_uint(value, 32).unwrap();
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn test_empty_cell_hash_is_known_constant() {
        // sha256(0x00 0x00)
        assert_eq!(
            hex::encode(Cell::empty().hash()),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }

    #[test]
    fn test_pruned_branch_is_hash_transparent() {
        let child = leaf(7);
        let mut b = CellBuilder::new();
        b.store_uint(1, 8).unwrap();
        b.store_ref(child.clone()).unwrap();
        let original = b.build().unwrap();

        let placeholder = Arc::new(Cell::pruned(&child));
        assert_eq!(placeholder.hash(), child.hash());
        assert_eq!(placeholder.kind(), CellKind::PrunedBranch);

        let rebuilt = Cell::from_parts(
            CellKind::Ordinary,
            original.data().clone(),
            vec![placeholder],
        )
        .unwrap();
        assert_eq!(rebuilt.hash(), original.hash());
    }

    #[test]
    fn test_depth_tracks_longest_path() {
        let a = leaf(1);
        let mut b = CellBuilder::new();
        b.store_ref(a.clone()).unwrap();
        let mid = Arc::new(b.build().unwrap());
        let mut c = CellBuilder::new();
        c.store_ref(mid).unwrap();
        c.store_ref(a).unwrap();
        assert_eq!(c.build().unwrap().depth(), 2);
    }

    #[test]
    fn test_merkle_proof_rejects_mismatched_child() {
        let inner = leaf(1);
        let proof = Cell::merkle_proof(inner.clone()).unwrap();
        assert_eq!(proof.proven_hash().unwrap(), *inner.hash());

        let forged = Cell::from_parts(CellKind::MerkleProof, proof.data().clone(), vec![leaf(2)]);
        assert!(matches!(forged, Err(KernelError::InvalidExoticCell(_))));
    }

    #[test]
    fn test_level_mask_propagates_to_ancestors() {
        let placeholder = Arc::new(Cell::pruned(&leaf(3)));
        let mut b = CellBuilder::new();
        b.store_ref(leaf(1)).unwrap();
        b.store_ref(placeholder).unwrap();
        let parent = Arc::new(b.build().unwrap());
        assert_eq!(parent.level_mask(), 1);
        assert_eq!(parent.descriptors()[0], 2 | (1 << 5));

        let mut b = CellBuilder::new();
        b.store_ref(parent.clone()).unwrap();
        assert_eq!(b.build().unwrap().level_mask(), 1);

        let proof = Cell::merkle_proof(parent).unwrap();
        assert_eq!(proof.level_mask(), 0);
        assert_eq!(leaf(1).level_mask(), 0);
    }

    #[test]
    fn test_higher_level_pruned_branch_is_rejected() {
        let mut data = Cell::pruned(&leaf(5)).data().as_bytes().to_vec();
        data[1] = 3;
        let res = Cell::from_parts(CellKind::PrunedBranch, BitString::from_bytes(&data), Vec::new());
        assert!(matches!(res, Err(KernelError::InvalidExoticCell(_))));
    }

    #[test]
    fn test_overflow_is_rejected() {
        let mut bits = BitString::new();
        for _ in 0..1024 {
            bits.push(true);
        }
        let res = Cell::from_parts(CellKind::Ordinary, bits, Vec::new());
        assert!(matches!(res, Err(KernelError::CellOverflow { bits: 1024, .. })));
    }
}
