// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Skeleton-guided pruning.

use std::sync::Arc;

use super::skeleton::ProofSkeleton;
use crate::cell::{Cell, CellRef};
use crate::error::{KernelError, Result};

/// Copies `root` keeping only the paths in `skeleton`.
///
/// References without a skeleton node become pruned branches and are never
/// visited. A recursive node returns its subtree unchanged. The result has the
/// same hash as `root`.
pub fn prune(root: &CellRef, skeleton: &ProofSkeleton) -> Result<CellRef> {
    if skeleton.is_recursive() {
        return Ok(root.clone());
    }

    let refs = root.refs();
    if let Some((index, _)) = skeleton.children().find(|(i, _)| *i >= refs.len()) {
        return Err(KernelError::SchemaMismatch {
            index,
            available: refs.len(),
        });
    }

    let kept = refs
        .iter()
        .enumerate()
        .map(|(i, child)| match skeleton.child(i) {
            Some(node) => prune(child, node),
            None => Ok(Arc::new(Cell::pruned(child))),
        })
        .collect::<Result<Vec<_>>>()?;

    let out = Cell::from_parts(root.kind(), root.data().clone(), kept)?;
    debug_assert_eq!(out.hash(), root.hash());
    Ok(Arc::new(out))
}

/// Prunes `root` and wraps the result in a merkle proof header.
pub fn create_merkle_proof(root: &CellRef, skeleton: &ProofSkeleton) -> Result<CellRef> {
    let pruned = prune(root, skeleton)?;
    Ok(Arc::new(Cell::merkle_proof(pruned)?))
}

/// Returns the root hash a merkle proof cell commits to.
///
/// Construction already checked the header against its child, so only the kind
/// is left to verify here.
pub fn verify_merkle_proof(proof: &Cell) -> Result<[u8; 32]> {
    proof.proven_hash().ok_or_else(|| {
        KernelError::InvalidExoticCell(format!("expected merkle proof, found {:?}", proof.kind()))
    })
}

/// Strips a merkle proof header if present.
pub fn unwrap_merkle_proof(cell: &CellRef) -> Result<CellRef> {
    match cell.proven_hash() {
        Some(_) => Ok(cell.reference(0)?.clone()),
        None => Ok(cell.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellBuilder, CellKind};

    fn node(tag: u64, children: &[CellRef]) -> CellRef {
        let mut b = CellBuilder::new();
        b.store_uint(tag, 16).unwrap();
        for c in children {
            b.store_ref(c.clone()).unwrap();
        }
        b.build_ref().unwrap()
    }

    #[test]
    fn test_empty_skeleton_prunes_every_child() {
        let root = node(1, &[node(2, &[]), node(3, &[])]);
        let proof = prune(&root, &ProofSkeleton::new()).unwrap();
        assert_eq!(proof.hash(), root.hash());
        assert!(proof.refs().iter().all(|c| c.kind() == CellKind::PrunedBranch));
    }

    #[test]
    fn test_stale_skeleton_is_schema_mismatch() {
        let root = node(1, &[node(2, &[])]);
        let mut sk = ProofSkeleton::new();
        sk.descend(0).unwrap().descend(1).unwrap();
        assert!(matches!(
            prune(&root, &sk),
            Err(KernelError::SchemaMismatch { index: 1, available: 0 })
        ));
    }

    #[test]
    fn test_merkle_proof_wraps_pruned_root() {
        let root = node(1, &[node(2, &[])]);
        let proof = create_merkle_proof(&root, &ProofSkeleton::new()).unwrap();
        assert_eq!(verify_merkle_proof(&proof).unwrap(), *root.hash());
        assert_eq!(unwrap_merkle_proof(&proof).unwrap().hash(), root.hash());
        assert!(verify_merkle_proof(&root).is_err());
    }
}
