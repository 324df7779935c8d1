// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Deterministic blocks, validator sets and signatures for tests and demos.
//!
//! Blocks follow the real schema positions closely enough for every proof and
//! lookup in this crate; fields the prover never reads hold placeholder values.

use crate::block::{
    BlockInfo, ShardIdent, ACCOUNT_BLOCK_TAG, BLOCK_EXTRA_TAG, BLOCK_TAG, MC_BLOCK_EXTRA_TAG,
};
use crate::cell::{boc, BitString, CellBuilder, CellRef};
use crate::config::{
    ACCOUNT_KEY_BITS, CONFIG_KEY_BITS, CONFIG_PARAM_CURRENT_VALIDATORS, MASTERCHAIN_SHARD,
    MASTERCHAIN_WORKCHAIN, TRANSACTION_KEY_BITS,
};
use crate::dict::DictBuilder;
use crate::error::Result;
use crate::quorum::SignatureEntry;
use crate::source::{BlockId, MemoryProvider, ProofStep};
use crate::validators::{ValidatorEntry, ValidatorSet, ValidatorSetFormat};

pub const GLOBAL_ID: i32 = -239;

/// Public key of the `index`-th fixture validator.
pub fn validator_key(index: u16) -> [u8; 32] {
    *blake3::hash(&index.to_be_bytes()).as_bytes()
}

pub fn validators(weights: &[u64]) -> Vec<ValidatorEntry> {
    weights
        .iter()
        .enumerate()
        .map(|(i, &w)| ValidatorEntry::new(validator_key(i as u16), w))
        .collect()
}

/// A validator set keyed `0..n` in the given order.
pub fn validator_set(format: ValidatorSetFormat, weights: &[u64], main: u16) -> ValidatorSet {
    ValidatorSet {
        utime_since: 1_700_000_000,
        utime_until: 1_700_065_536,
        total: weights.len() as u16,
        main,
        format,
        entries: validators(weights)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as u16, v))
            .collect(),
    }
}

/// `validators_ext#12` with a correct declared total.
pub fn weighted_set(weights: &[u64], main: u16) -> ValidatorSet {
    let total_weight = weights.iter().sum();
    validator_set(ValidatorSetFormat::Weighted { total_weight }, weights, main)
}

/// A stand-in signature: 64 bytes derived from signer and message.
pub fn sign(validator: &ValidatorEntry, message: &[u8; 32]) -> SignatureEntry {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&validator.public_key);
    hasher.update(message);
    let mut signature = [0u8; 64];
    hasher.finalize_xof().fill(&mut signature);
    SignatureEntry {
        node_id_short: validator.short_id,
        signature,
    }
}

/// Account id of the `index`-th fixture account.
pub fn account_id(index: u8) -> [u8; 32] {
    let mut id = [0u8; 32];
    id[0] = index.wrapping_mul(37);
    id[31] = index;
    id
}

/// A transaction-shaped cell; its hash is the transaction hash.
pub fn transaction_cell(account: &[u8; 32], lt: u64) -> Result<CellRef> {
    let mut messages = CellBuilder::new();
    messages.store_uint(lt % 7, 8)?;

    let mut b = CellBuilder::new();
    b.store_uint(0b0111, 4)?;
    b.store_bytes(account)?;
    b.store_uint(lt, 64)?;
    b.store_bytes(&[0u8; 32])?;
    b.store_uint(lt.saturating_sub(1), 64)?;
    b.store_uint(1_700_000_000, 32)?;
    b.store_ref(messages.build_ref()?)?;
    b.build_ref()
}

fn empty_currency_collection(b: &mut CellBuilder) -> Result<()> {
    b.store_coins(0)?;
    b.store_bit(false)?;
    Ok(())
}

fn currency_extra() -> Result<CellBuilder> {
    let mut extra = CellBuilder::new();
    empty_currency_collection(&mut extra)?;
    Ok(extra)
}

fn placeholder(tag: u64) -> Result<CellRef> {
    let mut b = CellBuilder::new();
    b.store_uint(tag, 32)?;
    b.build_ref()
}

#[derive(Debug, Clone)]
pub struct AccountFixture {
    pub account: [u8; 32],
    pub lts: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct BlockFixture {
    pub seqno: u32,
    pub prev_key_block_seqno: u32,
    pub shard: ShardIdent,
    pub accounts: Vec<AccountFixture>,
    /// Present for key blocks.
    pub validator_set: Option<ValidatorSet>,
}

impl BlockFixture {
    pub fn masterchain(seqno: u32, prev_key_block_seqno: u32) -> Self {
        Self {
            seqno,
            prev_key_block_seqno,
            shard: ShardIdent::masterchain(),
            accounts: Vec::new(),
            validator_set: None,
        }
    }

    /// Turns the block into a key block publishing `set` as parameter 34.
    pub fn with_validators(mut self, set: ValidatorSet) -> Self {
        self.validator_set = Some(set);
        self
    }

    pub fn with_account(mut self, account: [u8; 32], lts: &[u64]) -> Self {
        self.accounts.push(AccountFixture {
            account,
            lts: lts.to_vec(),
        });
        self
    }

    pub fn is_key_block(&self) -> bool {
        self.validator_set.is_some()
    }

    pub fn info(&self) -> BlockInfo {
        let start_lt = self.seqno as u64 * 1_000_000;
        BlockInfo {
            version: 0,
            not_master: self.shard.workchain != MASTERCHAIN_WORKCHAIN,
            after_merge: false,
            before_split: false,
            after_split: false,
            want_split: false,
            want_merge: false,
            key_block: self.is_key_block(),
            vert_seqno_incr: false,
            flags: 0,
            seqno: self.seqno,
            vert_seqno: 1,
            shard: self.shard,
            gen_utime: 1_700_000_000 + self.seqno * 5,
            start_lt,
            end_lt: start_lt + 100,
            gen_validator_list_hash_short: 0,
            gen_catchain_seqno: 1,
            min_ref_mc_seqno: self.seqno.saturating_sub(1),
            prev_key_block_seqno: self.prev_key_block_seqno,
        }
    }

    pub fn build(&self) -> Result<CellRef> {
        let mut root = CellBuilder::new();
        root.store_uint(BLOCK_TAG as u64, 32)?;
        root.store_int(GLOBAL_ID as i64, 32)?;
        root.store_ref(self.info_cell()?)?;
        root.store_ref(placeholder(0xb8e4_8dfb)?)?;
        root.store_ref(placeholder(0x0472_1234)?)?;
        root.store_ref(self.extra_cell()?)?;
        root.build_ref()
    }

    pub fn to_boc(&self) -> Result<Vec<u8>> {
        boc::to_boc(&self.build()?)
    }

    /// Cells of every fixture transaction as (account, lt, cell).
    pub fn transactions(&self) -> Result<Vec<([u8; 32], u64, CellRef)>> {
        let mut out = Vec::new();
        for acc in &self.accounts {
            for &lt in &acc.lts {
                out.push((acc.account, lt, transaction_cell(&acc.account, lt)?));
            }
        }
        Ok(out)
    }

    fn info_cell(&self) -> Result<CellRef> {
        let mut prev = CellBuilder::new();
        prev.store_uint(self.info().start_lt.saturating_sub(1), 64)?;
        prev.store_uint(self.seqno.saturating_sub(1) as u64, 32)?;
        prev.store_bytes(&[0u8; 32])?;
        prev.store_bytes(&[0u8; 32])?;

        let mut b = CellBuilder::new();
        self.info().store(&mut b)?;
        b.store_ref(prev.build_ref()?)?;
        b.build_ref()
    }

    fn extra_cell(&self) -> Result<CellRef> {
        let mut b = CellBuilder::new();
        b.store_uint(BLOCK_EXTRA_TAG as u64, 32)?;
        b.store_ref(placeholder(0x1)?)?;
        b.store_ref(placeholder(0x2)?)?;
        b.store_ref(self.account_blocks_cell()?)?;
        b.store_bytes(&[0x5a; 32])?;
        b.store_bytes(&[0xc3; 32])?;
        let custom = match self.shard.workchain {
            MASTERCHAIN_WORKCHAIN => Some(self.mc_extra_cell()?),
            _ => None,
        };
        b.store_maybe_ref(custom)?;
        b.build_ref()
    }

    fn account_blocks_cell(&self) -> Result<CellRef> {
        let mut accounts = DictBuilder::new(ACCOUNT_KEY_BITS).with_fork_extra(currency_extra()?);
        for acc in &self.accounts {
            let mut txs = DictBuilder::new(TRANSACTION_KEY_BITS).with_fork_extra(currency_extra()?);
            for &lt in &acc.lts {
                let mut value = currency_extra()?;
                value.store_ref(transaction_cell(&acc.account, lt)?)?;
                txs.insert_uint(lt, value)?;
            }

            let mut value = currency_extra()?;
            value.store_uint(ACCOUNT_BLOCK_TAG as u64, 4)?;
            value.store_bytes(&acc.account)?;
            value.append(&txs.build_inline()?)?;
            value.store_ref(placeholder(0x72)?)?;
            accounts.insert(BitString::from_bytes(&acc.account), value)?;
        }

        let mut b = CellBuilder::new();
        accounts.store_into(&mut b)?;
        empty_currency_collection(&mut b)?;
        b.build_ref()
    }

    fn mc_extra_cell(&self) -> Result<CellRef> {
        let mut b = CellBuilder::new();
        b.store_uint(MC_BLOCK_EXTRA_TAG as u64, 16)?;
        b.store_bit(self.is_key_block())?;
        b.store_maybe_ref(Some(placeholder(0x5ba5)?))?;
        b.store_maybe_ref(Some(placeholder(0xfee5)?))?;
        empty_currency_collection(&mut b)?;
        empty_currency_collection(&mut b)?;
        b.store_ref(placeholder(0x5165)?)?;
        if let Some(set) = &self.validator_set {
            b.store_bytes(&[0x55; 32])?;
            b.store_ref(config_dict(set)?)?;
        }
        b.build_ref()
    }
}

fn config_dict(set: &ValidatorSet) -> Result<CellRef> {
    let mut params = DictBuilder::new(CONFIG_KEY_BITS);
    let mut param = |id: u32, cell: CellRef| -> Result<()> {
        let mut value = CellBuilder::new();
        value.store_ref(cell)?;
        params.insert_uint(id as u64, value)?;
        Ok(())
    };

    let mut addr = CellBuilder::new();
    addr.store_bytes(&[0x55; 32])?;
    param(0, addr.build_ref()?)?;
    let mut elector = CellBuilder::new();
    elector.store_bytes(&[0x33; 32])?;
    param(1, elector.build_ref()?)?;
    let mut timings = CellBuilder::new();
    for v in [65_536u64, 32_768, 8_192, 32_768] {
        timings.store_uint(v, 32)?;
    }
    param(15, timings.build_ref()?)?;
    param(CONFIG_PARAM_CURRENT_VALIDATORS, set.to_cell()?)?;

    params
        .build()?
        .ok_or_else(|| crate::error::KernelError::Encoding("empty config".into()))
}

/// A key block, a later block it vouches for, and signatures over the later one.
#[derive(Debug, Clone)]
pub struct SignedScenario {
    pub key_block: BlockFixture,
    pub block: BlockFixture,
    pub validators: Vec<ValidatorEntry>,
    pub signatures: Vec<SignatureEntry>,
}

pub const SCENARIO_KEY_SEQNO: u32 = 100;
pub const SCENARIO_SEQNO: u32 = 105;

/// Key block 100 publishing a weighted set of `weights` (all main), and block
/// 105 signed by the validators at `signers`.
pub fn signed_scenario(weights: &[u64], signers: &[usize]) -> Result<SignedScenario> {
    let set = weighted_set(weights, weights.len() as u16);
    let validators: Vec<ValidatorEntry> = set.entries.iter().map(|(_, v)| v.clone()).collect();
    let key_block = BlockFixture::masterchain(SCENARIO_KEY_SEQNO, 90).with_validators(set);
    let block = BlockFixture::masterchain(SCENARIO_SEQNO, SCENARIO_KEY_SEQNO)
        .with_account(account_id(1), &[5_000_001, 5_000_002])
        .with_account(account_id(2), &[5_000_010]);

    let target = block.build()?;
    let signatures = signers
        .iter()
        .filter_map(|&i| validators.get(i))
        .map(|v| sign(v, target.hash()))
        .collect();

    Ok(SignedScenario {
        key_block,
        block,
        validators,
        signatures,
    })
}

impl SignedScenario {
    /// A provider serving both blocks and the forward step into the target.
    pub fn provider(&self) -> Result<MemoryProvider> {
        let mut provider = MemoryProvider::new();
        provider.insert_block(self.key_block.to_boc()?)?;
        let to = provider.insert_block(self.block.to_boc()?)?;
        let from = BlockId {
            workchain: MASTERCHAIN_WORKCHAIN,
            shard: MASTERCHAIN_SHARD,
            seqno: SCENARIO_SEQNO - 1,
            root_hash: [0u8; 32],
            file_hash: [0u8; 32],
        };
        provider.insert_id(from);
        provider.insert_proof(
            &from,
            &to,
            vec![ProofStep::Forward {
                from,
                to,
                signatures: self.signatures.clone(),
            }],
        );
        Ok(provider)
    }
}
