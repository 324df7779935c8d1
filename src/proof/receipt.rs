// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof receipts.

use serde::{Deserialize, Serialize};

use crate::cell::{boc, CellRef};
use crate::error::{KernelError, Result};

/// Version of the receipt layout.
pub const RECEIPT_VERSION: u64 = 1;

/// A compact record of a produced proof.
///
/// Lets a relayer check that a stored proof file is the one it built, without
/// parsing the cells again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofReceipt {
    pub version: u64,

    /// Hash of the cell tree the proof commits to.
    pub root_hash: [u8; 32],

    /// BLAKE3 hash of the serialized proof.
    pub boc_digest: [u8; 32],

    /// Distinct cells in the proof.
    pub cell_count: u64,
}

impl ProofReceipt {
    /// Serializes `proof` and records its digest.
    pub fn for_proof(proof: &CellRef) -> Result<(Self, Vec<u8>)> {
        let bytes = boc::to_boc(proof)?;
        let root_hash = proof.proven_hash().unwrap_or(*proof.hash());
        let receipt = Self {
            version: RECEIPT_VERSION,
            root_hash,
            boc_digest: hash_bytes(&bytes),
            cell_count: proof.count_unique() as u64,
        };
        Ok((receipt, bytes))
    }

    /// True when `bytes` are exactly the serialized proof this receipt describes.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        hash_bytes(bytes) == self.boc_digest
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| KernelError::Encoding(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (receipt, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| KernelError::Encoding(e.to_string()))?;
        if read != bytes.len() {
            return Err(KernelError::Encoding(format!(
                "{} trailing bytes after receipt",
                bytes.len() - read
            )));
        }
        Ok(receipt)
    }
}

pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellBuilder;
    use crate::proof::{create_merkle_proof, ProofSkeleton};

    fn sample_proof() -> CellRef {
        let mut leaf = CellBuilder::new();
        leaf.store_uint(42, 32).unwrap();
        let mut root = CellBuilder::new();
        root.store_ref(leaf.build_ref().unwrap()).unwrap();
        let root = root.build_ref().unwrap();
        create_merkle_proof(&root, &ProofSkeleton::new()).unwrap()
    }

    #[test]
    fn test_receipt_records_proven_root() {
        let proof = sample_proof();
        let (receipt, bytes) = ProofReceipt::for_proof(&proof).unwrap();
        assert_eq!(receipt.root_hash, proof.proven_hash().unwrap());
        assert_eq!(receipt.cell_count, 3);
        assert!(receipt.matches(&bytes));
        assert!(!receipt.matches(&bytes[1..]));
    }

    #[test]
    fn test_receipt_encoding_is_deterministic() {
        let (receipt, _) = ProofReceipt::for_proof(&sample_proof()).unwrap();
        let a = receipt.encode().unwrap();
        let b = receipt.encode().unwrap();
        assert_eq!(a, b);
        assert_eq!(ProofReceipt::decode(&a).unwrap(), receipt);
    }
}
