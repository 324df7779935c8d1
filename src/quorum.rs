// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Selecting a 2/3 quorum of validator signatures.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell::{BitString, CellBuilder, CellRef};
use crate::dict::DictBuilder;
use crate::error::{KernelError, Result};
use crate::validators::ValidatorEntry;

/// Key width of the public key to signature dictionary.
pub const SIGNATURE_KEY_BITS: usize = 256;

/// A block signature as delivered by the network, keyed by signer short id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    pub node_id_short: [u8; 32],
    pub signature: [u8; 64],
}

/// Public key to signature, with the weight that was accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumResult {
    signatures: BTreeMap<[u8; 32], [u8; 64]>,
    signed_weight: u64,
    total_weight: u64,
}

impl QuorumResult {
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn signed_weight(&self) -> u64 {
        self.signed_weight
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn get(&self, public_key: &[u8; 32]) -> Option<&[u8; 64]> {
        self.signatures.get(public_key)
    }

    /// Entries ordered by public key.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8; 32], &[u8; 64])> {
        self.signatures.iter()
    }

    /// `Dict<uint256, bits512>` as carried in bridge messages.
    pub fn to_dict(&self) -> Result<DictBuilder> {
        let mut dict = DictBuilder::new(SIGNATURE_KEY_BITS);
        for (key, signature) in &self.signatures {
            let mut value = CellBuilder::new();
            value.store_bytes(signature)?;
            dict.insert(BitString::from_bytes(key), value)?;
        }
        Ok(dict)
    }

    /// Root cell of the signature dictionary.
    pub fn to_dict_cell(&self) -> Result<CellRef> {
        self.to_dict()?
            .build()?
            .ok_or_else(|| KernelError::Encoding("empty signature set".into()))
    }
}

/// Picks the heaviest matching signatures until they carry more than two
/// thirds of `total_weight`.
///
/// Signatures from unknown signers are dropped, as are repeats from a signer
/// already matched. Candidates are ordered by weight, heaviest first, keeping
/// input order among equal weights.
pub fn select_quorum(
    validators: &[ValidatorEntry],
    signatures: &[SignatureEntry],
    total_weight: u64,
) -> Result<QuorumResult> {
    let by_short_id: FxHashMap<&[u8; 32], &ValidatorEntry> =
        validators.iter().map(|v| (&v.short_id, v)).collect();

    let mut seen = FxHashSet::default();
    let mut matched: Vec<(&ValidatorEntry, &[u8; 64])> = signatures
        .iter()
        .filter_map(|s| {
            let validator = by_short_id.get(&s.node_id_short)?;
            seen.insert(s.node_id_short)
                .then_some((*validator, &s.signature))
        })
        .collect();
    matched.sort_by(|a, b| b.0.weight.cmp(&a.0.weight));

    let threshold = 2 * total_weight as u128;
    let mut signed: u128 = 0;
    let mut selected = BTreeMap::new();
    for (validator, signature) in matched {
        selected.insert(validator.public_key, *signature);
        signed += validator.weight as u128;
        if 3 * signed > threshold {
            return Ok(QuorumResult {
                signatures: selected,
                signed_weight: saturate(signed),
                total_weight,
            });
        }
    }

    Err(KernelError::InsufficientWeight {
        signed: saturate(signed),
        required: required_weight(total_weight),
        total: total_weight,
    })
}

/// Smallest weight `w` with `3w > 2 * total`.
pub fn required_weight(total_weight: u64) -> u64 {
    saturate(2 * total_weight as u128 / 3 + 1)
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_weight_boundaries() {
        assert_eq!(required_weight(20), 14);
        assert_eq!(required_weight(3), 3);
        assert_eq!(required_weight(0), 1);
        assert!(required_weight(u64::MAX) < u64::MAX);
    }

    #[test]
    fn test_repeated_signer_counts_once() {
        let v = ValidatorEntry::new([1u8; 32], 10);
        let other = ValidatorEntry::new([2u8; 32], 10);
        let sig = SignatureEntry {
            node_id_short: v.short_id,
            signature: [9u8; 64],
        };
        let res = select_quorum(&[v, other], &[sig.clone(), sig], 20);
        assert!(matches!(
            res,
            Err(KernelError::InsufficientWeight { signed: 10, required: 14, total: 20 })
        ));
    }
}
