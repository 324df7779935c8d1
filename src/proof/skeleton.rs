// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof skeletons: which paths of a cell tree a proof keeps.

use crate::cell::Cell;
use crate::config::MAX_CELL_REFS;
use crate::error::{KernelError, Result};

/// One position of a cell tree in a proof plan.
///
/// A present child means that reference is kept (and walked further). A
/// recursive node keeps its whole subtree; recorded children stay in place, so
/// marking a node recursive only ever widens what is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofSkeleton {
    children: [Option<Box<ProofSkeleton>>; MAX_CELL_REFS],
    recursive: bool,
}

impl ProofSkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node for child slot `index`, creating it if absent.
    pub fn descend(&mut self, index: usize) -> Result<&mut ProofSkeleton> {
        let slot = self
            .children
            .get_mut(index)
            .ok_or(KernelError::IndexOutOfRange {
                index,
                available: MAX_CELL_REFS,
            })?;
        Ok(slot.get_or_insert_with(Box::default).as_mut())
    }

    /// Like [`descend`](Self::descend), but also checks that `cell` has the slot.
    pub fn descend_within(&mut self, cell: &Cell, index: usize) -> Result<&mut ProofSkeleton> {
        if index >= cell.refs().len() {
            return Err(KernelError::IndexOutOfRange {
                index,
                available: cell.refs().len(),
            });
        }
        self.descend(index)
    }

    /// Follows `path` from this node, creating nodes as needed.
    pub fn descend_path(&mut self, path: &[usize]) -> Result<&mut ProofSkeleton> {
        path.iter()
            .try_fold(self, |node, &index| node.descend(index))
    }

    pub fn child(&self, index: usize) -> Option<&ProofSkeleton> {
        self.children.get(index)?.as_deref()
    }

    /// Present children with their slot index.
    pub fn children(&self) -> impl Iterator<Item = (usize, &ProofSkeleton)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_deref().map(|c| (i, c)))
    }

    pub fn mark_recursive(&mut self) -> &mut Self {
        self.recursive = true;
        self
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Adds every path and recursive mark of `other` to this skeleton.
    pub fn merge(&mut self, other: &ProofSkeleton) {
        self.recursive |= other.recursive;
        for (index, theirs) in other.children() {
            self.children[index]
                .get_or_insert_with(Box::default)
                .merge(theirs);
        }
    }

    /// Number of nodes in the plan, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children().map(|(_, c)| c.node_count()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descend_creates_once() {
        let mut sk = ProofSkeleton::new();
        sk.descend(2).unwrap().descend(0).unwrap();
        sk.descend(2).unwrap();
        assert_eq!(sk.node_count(), 3);
        assert!(sk.child(2).unwrap().child(0).is_some());
        assert!(sk.child(1).is_none());
    }

    #[test]
    fn test_descend_rejects_fifth_slot() {
        let mut sk = ProofSkeleton::new();
        assert!(matches!(
            sk.descend(4),
            Err(KernelError::IndexOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn test_descend_within_checks_cell() {
        let mut sk = ProofSkeleton::new();
        let leaf = Cell::empty();
        assert!(matches!(
            sk.descend_within(&leaf, 0),
            Err(KernelError::IndexOutOfRange { index: 0, available: 0 })
        ));
    }

    #[test]
    fn test_recursive_keeps_recorded_children() {
        let mut sk = ProofSkeleton::new();
        sk.descend_path(&[3, 1]).unwrap();
        sk.mark_recursive();
        assert!(sk.is_recursive());
        assert!(sk.child(3).unwrap().child(1).is_some());
    }

    #[test]
    fn test_merge_is_union() {
        let mut a = ProofSkeleton::new();
        a.descend_path(&[0, 1]).unwrap();
        let mut b = ProofSkeleton::new();
        b.descend_path(&[0, 2]).unwrap().mark_recursive();

        a.merge(&b);
        let zero = a.child(0).unwrap();
        assert!(zero.child(1).is_some());
        assert!(zero.child(2).unwrap().is_recursive());
    }
}
