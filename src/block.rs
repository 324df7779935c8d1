// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Narrow access to block cells by schema position.
//!
//! ```text
//! block#11ef55aa global_id:int32
//!   info:^BlockInfo value_flow:^ValueFlow state_update:^MERKLE_UPDATE extra:^BlockExtra
//! block_extra in_msg_descr:^InMsgDescr out_msg_descr:^OutMsgDescr
//!   account_blocks:^ShardAccountBlocks rand_seed:bits256 created_by:bits256
//!   custom:(Maybe ^McBlockExtra)
//! ```
//! Only the fields the prover needs are decoded; everything else is skipped
//! by position.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cell::{CellBuilder, CellRef, CellSlice};
use crate::config::{ACCOUNT_KEY_BITS, CONFIG_KEY_BITS, TRANSACTION_KEY_BITS};
use crate::dict::Dictionary;
use crate::error::{KernelError, Result};

pub const BLOCK_TAG: u32 = 0x11ef_55aa;
pub const BLOCK_INFO_TAG: u32 = 0x9bc7_a987;
pub const BLOCK_EXTRA_TAG: u32 = 0x4a33_f6fd;
pub const MC_BLOCK_EXTRA_TAG: u16 = 0xcca5;
pub const ACCOUNT_BLOCK_TAG: u8 = 0x5;

/// Reference slots of the block root.
pub mod slots {
    pub const INFO: usize = 0;
    pub const VALUE_FLOW: usize = 1;
    pub const STATE_UPDATE: usize = 2;
    pub const EXTRA: usize = 3;

    /// Within `BlockExtra`.
    pub const ACCOUNT_BLOCKS: usize = 2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShardIdent {
    pub workchain: i32,
    pub prefix_bits: u8,
    pub prefix: u64,
}

impl ShardIdent {
    pub fn masterchain() -> Self {
        Self {
            workchain: crate::config::MASTERCHAIN_WORKCHAIN,
            prefix_bits: 0,
            prefix: 0,
        }
    }

    /// Shard id with the terminating bit set after the prefix.
    pub fn shard_id(&self) -> u64 {
        self.prefix | (1u64 << (63 - self.prefix_bits.min(63) as u32))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub version: u32,
    pub not_master: bool,
    pub after_merge: bool,
    pub before_split: bool,
    pub after_split: bool,
    pub want_split: bool,
    pub want_merge: bool,
    pub key_block: bool,
    pub vert_seqno_incr: bool,
    pub flags: u8,
    pub seqno: u32,
    pub vert_seqno: u32,
    pub shard: ShardIdent,
    pub gen_utime: u32,
    pub start_lt: u64,
    pub end_lt: u64,
    pub gen_validator_list_hash_short: u32,
    pub gen_catchain_seqno: u32,
    pub min_ref_mc_seqno: u32,
    pub prev_key_block_seqno: u32,
}

impl BlockInfo {
    pub fn parse(cell: &CellRef) -> Result<Self> {
        let mut s = CellSlice::new(cell.clone());
        expect_tag(&mut s, 32, BLOCK_INFO_TAG as u64, "BlockInfo")?;
        let version = s.load_uint(32)? as u32;
        let mut bits = [false; 8];
        for bit in &mut bits {
            *bit = s.load_bit()?;
        }
        let flags = s.load_uint(8)? as u8;
        let seqno = s.load_uint(32)? as u32;
        let vert_seqno = s.load_uint(32)? as u32;
        expect_tag(&mut s, 2, 0, "ShardIdent")?;
        let shard = ShardIdent {
            prefix_bits: s.load_uint(6)? as u8,
            workchain: s.load_int(32)? as i32,
            prefix: s.load_uint(64)?,
        };

        Ok(Self {
            version,
            not_master: bits[0],
            after_merge: bits[1],
            before_split: bits[2],
            after_split: bits[3],
            want_split: bits[4],
            want_merge: bits[5],
            key_block: bits[6],
            vert_seqno_incr: bits[7],
            flags,
            seqno,
            vert_seqno,
            shard,
            gen_utime: s.load_uint(32)? as u32,
            start_lt: s.load_uint(64)?,
            end_lt: s.load_uint(64)?,
            gen_validator_list_hash_short: s.load_uint(32)? as u32,
            gen_catchain_seqno: s.load_uint(32)? as u32,
            min_ref_mc_seqno: s.load_uint(32)? as u32,
            prev_key_block_seqno: s.load_uint(32)? as u32,
        })
    }

    /// Writes the fixed part of the record; the caller appends any refs.
    pub fn store(&self, b: &mut CellBuilder) -> Result<()> {
        b.store_uint(BLOCK_INFO_TAG as u64, 32)?;
        b.store_uint(self.version as u64, 32)?;
        for bit in [
            self.not_master,
            self.after_merge,
            self.before_split,
            self.after_split,
            self.want_split,
            self.want_merge,
            self.key_block,
            self.vert_seqno_incr,
        ] {
            b.store_bit(bit)?;
        }
        b.store_uint(self.flags as u64, 8)?;
        b.store_uint(self.seqno as u64, 32)?;
        b.store_uint(self.vert_seqno as u64, 32)?;
        b.store_uint(0, 2)?;
        b.store_uint(self.shard.prefix_bits as u64, 6)?;
        b.store_int(self.shard.workchain as i64, 32)?;
        b.store_uint(self.shard.prefix, 64)?;
        b.store_uint(self.gen_utime as u64, 32)?;
        b.store_uint(self.start_lt, 64)?;
        b.store_uint(self.end_lt, 64)?;
        b.store_uint(self.gen_validator_list_hash_short as u64, 32)?;
        b.store_uint(self.gen_catchain_seqno as u64, 32)?;
        b.store_uint(self.min_ref_mc_seqno as u64, 32)?;
        b.store_uint(self.prev_key_block_seqno as u64, 32)?;
        Ok(())
    }
}

/// The masterchain configuration dictionary of a key block.
#[derive(Debug, Clone)]
pub struct ConfigParams {
    pub config_addr: [u8; 32],
    /// Ref slot of the dictionary root within `McBlockExtra`.
    pub slot: usize,
    pub dict: Dictionary,
}

impl ConfigParams {
    /// The cell stored under parameter `id`.
    pub fn param(&self, id: u32) -> Result<CellRef> {
        self.dict.get_uint(id as u64)?.load_ref()
    }
}

/// One account's entry in `ShardAccountBlocks`.
///
/// ```text
/// acc_trans#5 account_addr:bits256
///   transactions:(HashmapAug 64 ^Transaction CurrencyCollection)
///   state_update:^(HASH_UPDATE Account)
/// ```
#[derive(Debug, Clone)]
pub struct AccountBlock {
    pub account: [u8; 32],
    pub transactions: Dictionary,
}

impl AccountBlock {
    /// Parses a dictionary value, which starts with the augmentation extra.
    pub fn parse(mut value: CellSlice) -> Result<Self> {
        value.skip_currency_collection()?;
        expect_tag(&mut value, 4, ACCOUNT_BLOCK_TAG as u64, "AccountBlock")?;
        let account = value.load_u256()?;
        Ok(Self {
            account,
            transactions: Dictionary::inline(value, TRANSACTION_KEY_BITS),
        })
    }

    /// Every transaction as (logical time, cell), in ascending time order.
    pub fn transaction_cells(&self) -> Result<Vec<(u64, CellRef)>> {
        self.transactions
            .load_all()?
            .into_iter()
            .map(|(lt, mut value)| -> Result<(u64, CellRef)> {
                let (_, tx) = load_transaction_ref(&mut value)?;
                Ok((lt.to_uint(), tx))
            })
            .collect()
    }
}

/// Reads a transaction dictionary value: the extra, then `^Transaction`.
pub fn load_transaction_ref(value: &mut CellSlice) -> Result<(usize, CellRef)> {
    value.skip_currency_collection()?;
    value.load_ref_indexed()
}

/// A parsed block root.
#[derive(Debug, Clone)]
pub struct Block {
    root: CellRef,
    global_id: i32,
    info: BlockInfo,
}

impl Block {
    pub fn parse(root: CellRef) -> Result<Self> {
        let mut s = CellSlice::new(root.clone());
        expect_tag(&mut s, 32, BLOCK_TAG as u64, "Block")?;
        let global_id = s.load_int(32)? as i32;
        let info = BlockInfo::parse(&child(&root, slots::INFO)?)?;
        Ok(Self {
            root,
            global_id,
            info,
        })
    }

    pub fn root(&self) -> &CellRef {
        &self.root
    }

    pub fn hash(&self) -> &[u8; 32] {
        self.root.hash()
    }

    pub fn global_id(&self) -> i32 {
        self.global_id
    }

    pub fn info(&self) -> &BlockInfo {
        &self.info
    }

    pub fn is_key_block(&self) -> bool {
        self.info.key_block
    }

    pub fn extra(&self) -> Result<CellRef> {
        let extra = child(&self.root, slots::EXTRA)?;
        expect_tag(&mut CellSlice::new(extra.clone()), 32, BLOCK_EXTRA_TAG as u64, "BlockExtra")?;
        Ok(extra)
    }

    /// The account-blocks `HashmapAugE` and the ref slot of its root, or `None` if empty.
    pub fn account_blocks(&self) -> Result<Option<(usize, Dictionary)>> {
        let cell = child(&self.extra()?, slots::ACCOUNT_BLOCKS)?;
        Dictionary::load_optional(&mut CellSlice::new(cell), ACCOUNT_KEY_BITS)
    }

    /// `McBlockExtra` and its ref slot within `BlockExtra`.
    pub fn custom(&self) -> Result<(usize, CellRef)> {
        let mut s = CellSlice::new(self.extra()?);
        s.skip_bits(32 + 256 + 256)?;
        for _ in 0..3 {
            s.load_ref()?;
        }
        s.load_maybe_ref_indexed()?
            .ok_or(KernelError::MissingField("McBlockExtra"))
    }

    /// Walks `McBlockExtra` to the configuration dictionary.
    ///
    /// ```text
    /// masterchain_block_extra#cca5 key_block:(## 1) shard_hashes:ShardHashes
    ///   shard_fees:ShardFees ^[ prev_blk_signatures ... ]
    ///   config:key_block?ConfigParams
    /// ```
    pub fn config_params(&self) -> Result<ConfigParams> {
        let (_, custom) = self.custom()?;
        let mut s = CellSlice::new(custom);
        expect_tag(&mut s, 16, MC_BLOCK_EXTRA_TAG as u64, "McBlockExtra")?;
        if !s.load_bit()? {
            return Err(KernelError::MissingField("ConfigParams"));
        }
        s.load_maybe_ref()?;
        s.load_maybe_ref()?;
        s.skip_currency_collection()?;
        s.skip_currency_collection()?;
        s.load_ref()?;
        let config_addr = s.load_u256()?;
        let (slot, root) = s.load_ref_indexed()?;
        Ok(ConfigParams {
            config_addr,
            slot,
            dict: Dictionary::from_root_cell(root, CONFIG_KEY_BITS),
        })
    }
}

/// SHA-256 of the serialized block file.
pub fn file_hash(boc: &[u8]) -> [u8; 32] {
    Sha256::digest(boc).into()
}

fn child(cell: &CellRef, index: usize) -> Result<CellRef> {
    cell.refs()
        .get(index)
        .cloned()
        .ok_or(KernelError::CellUnderflow {
            what: "refs",
            needed: index + 1,
            available: cell.refs().len(),
        })
}

pub(crate) fn expect_tag(s: &mut CellSlice, bits: usize, expected: u64, what: &'static str) -> Result<()> {
    let found = s.load_uint(bits)?;
    if found != expected {
        return Err(KernelError::UnexpectedTag {
            what,
            expected,
            found,
        });
    }
    Ok(())
}
