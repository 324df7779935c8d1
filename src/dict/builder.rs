// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Dictionary construction.

use std::collections::BTreeMap;

use super::label::write_label;
use crate::cell::{BitString, CellBuilder, CellRef};
use crate::error::{KernelError, Result};

/// Collects entries and serializes them as a `Hashmap n X`.
///
/// Entries are kept sorted, so the same set of pairs always produces the same
/// cells regardless of insertion order.
#[derive(Debug, Clone)]
pub struct DictBuilder {
    key_bits: usize,
    entries: BTreeMap<BitString, CellBuilder>,
    fork_extra: Option<CellBuilder>,
}

impl DictBuilder {
    pub fn new(key_bits: usize) -> Self {
        Self {
            key_bits,
            entries: BTreeMap::new(),
            fork_extra: None,
        }
    }

    /// Appends `extra` after the refs of every fork (`HashmapAug`).
    ///
    /// Leaf extras are part of the value and must be written by the caller.
    pub fn with_fork_extra(mut self, extra: CellBuilder) -> Self {
        self.fork_extra = Some(extra);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or replaces the value stored under `key`.
    pub fn insert(&mut self, key: BitString, value: CellBuilder) -> Result<&mut Self> {
        if key.len() != self.key_bits {
            return Err(KernelError::InvalidKeyWidth {
                expected: self.key_bits,
                found: key.len(),
            });
        }
        self.entries.insert(key, value);
        Ok(self)
    }

    pub fn insert_uint(&mut self, key: u64, value: CellBuilder) -> Result<&mut Self> {
        self.insert(BitString::from_uint(key, self.key_bits), value)
    }

    /// Root edge as a builder, for dictionaries stored inline in a parent cell.
    pub fn build_inline(&self) -> Result<CellBuilder> {
        if self.entries.is_empty() {
            return Err(KernelError::Encoding("inline dictionary cannot be empty".into()));
        }
        let entries: Vec<_> = self.entries.iter().collect();
        self.build_node(&entries, 0)
    }

    /// Root cell, or `None` for an empty dictionary.
    pub fn build(&self) -> Result<Option<CellRef>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        self.build_inline()?.build_ref().map(Some)
    }

    /// Writes the dictionary as a `HashmapE`.
    pub fn store_into(&self, b: &mut CellBuilder) -> Result<()> {
        b.store_maybe_ref(self.build()?)?;
        Ok(())
    }

    fn build_node(&self, entries: &[(&BitString, &CellBuilder)], prefix: usize) -> Result<CellBuilder> {
        let mut node = CellBuilder::new();
        let remaining = self.key_bits - prefix;

        if let [(key, value)] = entries {
            write_label(&mut node, &key.slice(prefix, self.key_bits), remaining)?;
            node.append(value)?;
            return Ok(node);
        }

        // Sorted keys: the first and last bound the common prefix of all of them.
        let (first, _) = entries[0];
        let (last, _) = entries[entries.len() - 1];
        let common = first.common_prefix_len(last, prefix);
        let split = prefix + common;
        write_label(&mut node, &first.slice(prefix, split), remaining)?;

        let mid = entries.partition_point(|(key, _)| !key.get(split));
        let left = self.build_node(&entries[..mid], split + 1)?.build_ref()?;
        let right = self.build_node(&entries[mid..], split + 1)?.build_ref()?;
        node.store_ref(left)?;
        node.store_ref(right)?;
        if let Some(extra) = &self.fork_extra {
            node.append(extra)?;
        }
        Ok(node)
    }
}
