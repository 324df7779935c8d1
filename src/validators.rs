// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Validator sets (configuration parameter 34).
//!
//! ```text
//! validators#11 utime_since:uint32 utime_until:uint32
//!   total:(## 16) main:(## 16) { main <= total } { main >= 1 }
//!   list:(Hashmap 16 ValidatorDescr) = ValidatorSet;
//! validators_ext#12 utime_since:uint32 utime_until:uint32
//!   total:(## 16) main:(## 16) { main <= total } { main >= 1 }
//!   total_weight:uint64 list:(HashmapE 16 ValidatorDescr) = ValidatorSet;
//!
//! validator#53 public_key:SigPubKey weight:uint64 = ValidatorDescr;
//! validator_addr#73 public_key:SigPubKey weight:uint64 adnl_addr:bits256 = ValidatorDescr;
//! ed25519_pubkey#8e81278a pubkey:bits256 = SigPubKey;
//! ```

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::block::expect_tag;
use crate::cell::{CellBuilder, CellRef, CellSlice};
use crate::config::{TotalWeightMode, PUB_ED25519_TL_ID, VALIDATOR_KEY_BITS};
use crate::dict::{DictBuilder, Dictionary};
use crate::error::{KernelError, Result};

pub const VALIDATOR_SET_TAG: u8 = 0x11;
pub const VALIDATOR_SET_EXT_TAG: u8 = 0x12;
pub const VALIDATOR_TAG: u8 = 0x53;
pub const VALIDATOR_ADDR_TAG: u8 = 0x73;
pub const ED25519_PUBKEY_TAG: u32 = 0x8e81_278a;

/// Short id of an ed25519 key: SHA-256 of its TL `pub.ed25519` serialization.
pub fn short_id(public_key: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(PUB_ED25519_TL_ID.to_le_bytes());
    hasher.update(public_key);
    hasher.finalize().into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorEntry {
    #[serde(with = "hex_bytes")]
    pub public_key: [u8; 32],
    pub weight: u64,
    #[serde(with = "hex_bytes")]
    pub short_id: [u8; 32],
    #[serde(skip_serializing_if = "Option::is_none", with = "hex_opt")]
    pub adnl_addr: Option<[u8; 32]>,
}

impl ValidatorEntry {
    pub fn new(public_key: [u8; 32], weight: u64) -> Self {
        Self {
            short_id: short_id(&public_key),
            public_key,
            weight,
            adnl_addr: None,
        }
    }

    pub fn with_adnl_addr(mut self, addr: [u8; 32]) -> Self {
        self.adnl_addr = Some(addr);
        self
    }

    fn parse(mut s: CellSlice) -> Result<Self> {
        let tag = s.load_uint(8)? as u8;
        if tag != VALIDATOR_TAG && tag != VALIDATOR_ADDR_TAG {
            return Err(KernelError::UnexpectedTag {
                what: "ValidatorDescr",
                expected: VALIDATOR_TAG as u64,
                found: tag as u64,
            });
        }
        expect_tag(&mut s, 32, ED25519_PUBKEY_TAG as u64, "SigPubKey")?;
        let entry = Self::new(s.load_u256()?, s.load_uint(64)?);
        if tag == VALIDATOR_ADDR_TAG {
            return Ok(entry.with_adnl_addr(s.load_u256()?));
        }
        Ok(entry)
    }

    /// Serializes as `ValidatorDescr`.
    pub fn store(&self, b: &mut CellBuilder) -> Result<()> {
        let tag = if self.adnl_addr.is_some() {
            VALIDATOR_ADDR_TAG
        } else {
            VALIDATOR_TAG
        };
        b.store_uint(tag as u64, 8)?;
        b.store_uint(ED25519_PUBKEY_TAG as u64, 32)?;
        b.store_bytes(&self.public_key)?;
        b.store_uint(self.weight, 64)?;
        if let Some(addr) = &self.adnl_addr {
            b.store_bytes(addr)?;
        }
        Ok(())
    }
}

/// The two encodings of a validator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ValidatorSetFormat {
    /// `validators#11`: no declared total.
    Basic,
    /// `validators_ext#12`: the declared total must match the entries.
    Weighted { total_weight: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorSet {
    pub utime_since: u32,
    pub utime_until: u32,
    pub total: u16,
    pub main: u16,
    pub format: ValidatorSetFormat,
    /// Entries in ascending dictionary key order.
    pub entries: Vec<(u16, ValidatorEntry)>,
}

impl ValidatorSet {
    pub fn parse(cell: &CellRef) -> Result<Self> {
        let mut s = CellSlice::new(cell.clone());
        let weighted = match s.load_uint(8)? as u8 {
            VALIDATOR_SET_TAG => false,
            VALIDATOR_SET_EXT_TAG => true,
            other => return Err(KernelError::UnknownValidatorSetFormat(other)),
        };
        let utime_since = s.load_uint(32)? as u32;
        let utime_until = s.load_uint(32)? as u32;
        let total = s.load_uint(16)? as u16;
        let main = s.load_uint(16)? as u16;

        let (format, list) = if weighted {
            let total_weight = s.load_uint(64)?;
            let list = Dictionary::load_optional(&mut s, VALIDATOR_KEY_BITS)?.map(|(_, d)| d);
            (ValidatorSetFormat::Weighted { total_weight }, list)
        } else {
            let list = Dictionary::inline(s, VALIDATOR_KEY_BITS);
            (ValidatorSetFormat::Basic, Some(list))
        };

        let mut entries = match list {
            Some(dict) => dict
                .load_all()?
                .into_iter()
                .map(|(key, value)| -> Result<(u16, ValidatorEntry)> {
                    Ok((key.to_uint() as u16, ValidatorEntry::parse(value)?))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        entries.sort_by_key(|(key, _)| *key);

        let set = Self {
            utime_since,
            utime_until,
            total,
            main,
            format,
            entries,
        };
        if let ValidatorSetFormat::Weighted { total_weight } = set.format {
            let computed = sum_weights(set.entries.iter().map(|(_, v)| v))?;
            if computed != total_weight {
                return Err(KernelError::WeightMismatch {
                    declared: total_weight,
                    computed,
                });
            }
        }
        Ok(set)
    }

    /// Serializes the set in its own format.
    pub fn to_cell(&self) -> Result<CellRef> {
        let mut list = DictBuilder::new(VALIDATOR_KEY_BITS);
        for (key, entry) in &self.entries {
            let mut value = CellBuilder::new();
            entry.store(&mut value)?;
            list.insert_uint(*key as u64, value)?;
        }

        let mut b = CellBuilder::new();
        let tag = match self.format {
            ValidatorSetFormat::Basic => VALIDATOR_SET_TAG,
            ValidatorSetFormat::Weighted { .. } => VALIDATOR_SET_EXT_TAG,
        };
        b.store_uint(tag as u64, 8)?;
        b.store_uint(self.utime_since as u64, 32)?;
        b.store_uint(self.utime_until as u64, 32)?;
        b.store_uint(self.total as u64, 16)?;
        b.store_uint(self.main as u64, 16)?;
        match self.format {
            ValidatorSetFormat::Basic => {
                b.append(&list.build_inline()?)?;
            }
            ValidatorSetFormat::Weighted { total_weight } => {
                b.store_uint(total_weight, 64)?;
                list.store_into(&mut b)?;
            }
        }
        b.build_ref()
    }

    /// The first `main` entries by key.
    pub fn main_validators(&self) -> &[(u16, ValidatorEntry)] {
        let n = (self.main as usize).min(self.entries.len());
        &self.entries[..n]
    }
}

/// The quorum-eligible validators of an epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainValidators {
    pub validators: Vec<ValidatorEntry>,
    /// Sum over `validators`.
    pub total_weight: u64,
    /// Sum over every entry of the set, main or not.
    pub all_weight: u64,
    /// Hash of the configuration parameter cell, identifying the epoch.
    #[serde(with = "hex_bytes")]
    pub set_hash: [u8; 32],
    pub format: ValidatorSetFormat,
}

impl MainValidators {
    /// Total the quorum threshold is measured against.
    pub fn quorum_total(&self, mode: TotalWeightMode) -> u64 {
        match mode {
            TotalWeightMode::MainValidators => self.total_weight,
            TotalWeightMode::AllValidators => self.all_weight,
        }
    }
}

/// Decodes configuration parameter 34 and keeps its first `main` validators.
pub fn extract_main_validators(param: &CellRef) -> Result<MainValidators> {
    let set = ValidatorSet::parse(param)?;
    let validators: Vec<ValidatorEntry> = set
        .main_validators()
        .iter()
        .map(|(_, v)| v.clone())
        .collect();
    if validators.is_empty() {
        return Err(KernelError::NoValidators);
    }

    Ok(MainValidators {
        total_weight: sum_weights(validators.iter())?,
        all_weight: sum_weights(set.entries.iter().map(|(_, v)| v))?,
        validators,
        set_hash: *param.hash(),
        format: set.format,
    })
}

fn sum_weights<'a>(mut entries: impl Iterator<Item = &'a ValidatorEntry>) -> Result<u64> {
    entries.try_fold(0u64, |acc, v| {
        acc.checked_add(v.weight).ok_or(KernelError::WeightOverflow)
    })
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }
}

mod hex_opt {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &Option<[u8; 32]>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_str(&hex::encode(b)),
            None => s.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_is_tl_hash() {
        let key = [7u8; 32];
        let mut expected = Sha256::new();
        expected.update([0xc6, 0xb4, 0x13, 0x48]);
        expected.update(key);
        let expected: [u8; 32] = expected.finalize().into();
        assert_eq!(short_id(&key), expected);
    }

    #[test]
    fn test_descriptor_with_adnl_round_trips() {
        let entry = ValidatorEntry::new([1u8; 32], 99).with_adnl_addr([2u8; 32]);
        let mut b = CellBuilder::new();
        entry.store(&mut b).unwrap();
        assert_eq!(b.bits_used(), 8 + 32 + 256 + 64 + 256);
        let parsed = ValidatorEntry::parse(CellSlice::new(b.build_ref().unwrap())).unwrap();
        assert_eq!(parsed, entry);
    }
}
