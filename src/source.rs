// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Fetching blocks and signatures, and gathering a quorum for one block.
//!
//! Transport is behind [`BlockProvider`]; [`MemoryProvider`] serves blocks that
//! are already on disk or in memory.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::block::{file_hash, Block};
use crate::cell::{boc, CellRef};
use crate::config::{ProverConfig, CONFIG_PARAM_CURRENT_VALIDATORS, MASTERCHAIN_SHARD, MASTERCHAIN_WORKCHAIN};
use crate::error::{KernelError, Result};
use crate::quorum::{select_quorum, QuorumResult, SignatureEntry};
use crate::validators::{extract_main_validators, MainValidators};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockId {
    pub workchain: i32,
    pub shard: u64,
    pub seqno: u32,
    #[serde(serialize_with = "hex_hash")]
    pub root_hash: [u8; 32],
    #[serde(serialize_with = "hex_hash")]
    pub file_hash: [u8; 32],
}

impl BlockId {
    /// Identity of a serialized block.
    pub fn of(block: &Block, boc: &[u8]) -> Self {
        let info = block.info();
        Self {
            workchain: info.shard.workchain,
            shard: info.shard.shard_id(),
            seqno: info.seqno,
            root_hash: *block.hash(),
            file_hash: file_hash(boc),
        }
    }
}

fn hex_hash<S: serde::Serializer>(bytes: &[u8; 32], s: S) -> core::result::Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

/// One link of a block proof chain.
#[derive(Debug, Clone)]
pub enum ProofStep {
    /// Signed by the validators of `from`'s epoch.
    Forward {
        from: BlockId,
        to: BlockId,
        signatures: Vec<SignatureEntry>,
    },
    /// Merkle proof that `to` is an ancestor of `from`.
    ///
    /// Only level 1 pruned branches can be decoded. A proof nesting another
    /// merkle proof carries higher level placeholders and fails to parse with
    /// `InvalidExoticCell`.
    Backward {
        from: BlockId,
        to: BlockId,
        proof: CellRef,
    },
}

pub trait BlockProvider {
    fn lookup_block(&self, workchain: i32, shard: u64, seqno: u32) -> Result<BlockId>;

    /// Serialized block.
    fn block_data(&self, id: &BlockId) -> Result<Vec<u8>>;

    fn block_proof(&self, from: &BlockId, to: &BlockId) -> Result<Vec<ProofStep>>;
}

type ChainKey = (i32, u64, u32);

/// A provider over blocks held in memory.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    ids: BTreeMap<ChainKey, BlockId>,
    data: FxHashMap<[u8; 32], Vec<u8>>,
    proofs: FxHashMap<(u32, u32), Vec<ProofStep>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a serialized block and returns its id.
    pub fn insert_block(&mut self, bytes: Vec<u8>) -> Result<BlockId> {
        let block = Block::parse(boc::from_boc(&bytes)?)?;
        let id = BlockId::of(&block, &bytes);
        self.ids.insert((id.workchain, id.shard, id.seqno), id);
        self.data.insert(id.root_hash, bytes);
        Ok(id)
    }

    /// Makes an id known without its data, for blocks only used as proof endpoints.
    pub fn insert_id(&mut self, id: BlockId) {
        self.ids.insert((id.workchain, id.shard, id.seqno), id);
    }

    pub fn insert_proof(&mut self, from: &BlockId, to: &BlockId, steps: Vec<ProofStep>) {
        self.proofs.insert((from.seqno, to.seqno), steps);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl BlockProvider for MemoryProvider {
    fn lookup_block(&self, workchain: i32, shard: u64, seqno: u32) -> Result<BlockId> {
        self.ids
            .get(&(workchain, shard, seqno))
            .copied()
            .ok_or(KernelError::BlockNotFound {
                workchain,
                shard,
                seqno,
            })
    }

    fn block_data(&self, id: &BlockId) -> Result<Vec<u8>> {
        self.data
            .get(&id.root_hash)
            .cloned()
            .ok_or(KernelError::BlockNotFound {
                workchain: id.workchain,
                shard: id.shard,
                seqno: id.seqno,
            })
    }

    fn block_proof(&self, from: &BlockId, to: &BlockId) -> Result<Vec<ProofStep>> {
        self.proofs
            .get(&(from.seqno, to.seqno))
            .cloned()
            .ok_or_else(|| KernelError::Provider(format!("no proof from {} to {}", from.seqno, to.seqno)))
    }
}

/// Fetches and parses a block.
pub fn load_block<P: BlockProvider + ?Sized>(provider: &P, id: &BlockId) -> Result<Block> {
    let bytes = provider.block_data(id)?;
    Block::parse(boc::from_boc(&bytes)?)
}

/// Signatures of the last forward step, the one that reaches the target.
pub fn last_forward_signatures(steps: &[ProofStep]) -> Option<&[SignatureEntry]> {
    steps.iter().rev().find_map(|step| match step {
        ProofStep::Forward { signatures, .. } => Some(signatures.as_slice()),
        ProofStep::Backward { .. } => None,
    })
}

/// A quorum of signatures for one masterchain block.
#[derive(Debug, Clone)]
pub struct BlockSignatures {
    pub block: BlockId,
    pub key_block: BlockId,
    pub validators: MainValidators,
    pub quorum: QuorumResult,
}

/// Gathers the smallest heaviest-first quorum of signatures for masterchain block `seqno`.
///
/// The signers are the main validators of the previous key block; their
/// signatures come from the last forward step of the proof from `seqno - 1`.
pub fn collect_block_signatures<P: BlockProvider + ?Sized>(
    provider: &P,
    seqno: u32,
    config: &ProverConfig,
) -> Result<BlockSignatures> {
    let id = provider.lookup_block(MASTERCHAIN_WORKCHAIN, MASTERCHAIN_SHARD, seqno)?;
    let block = load_block(provider, &id)?;
    let info = block.info();
    let (workchain, shard) = (info.shard.workchain, info.shard.shard_id());

    let prev_seqno = seqno.checked_sub(1).ok_or(KernelError::BlockNotFound {
        workchain,
        shard,
        seqno: 0,
    })?;
    let prev = provider.lookup_block(workchain, shard, prev_seqno)?;
    let key_id = provider.lookup_block(workchain, shard, info.prev_key_block_seqno)?;
    let key_block = load_block(provider, &key_id)?;
    tracing::debug!(
        "Block {} signed by validators of key block {}",
        seqno,
        key_id.seqno
    );

    let param = key_block
        .config_params()?
        .param(CONFIG_PARAM_CURRENT_VALIDATORS)?;
    let validators = extract_main_validators(&param)?;

    let steps = provider.block_proof(&prev, &id)?;
    let signatures = match last_forward_signatures(&steps) {
        Some(signatures) => signatures,
        None => {
            tracing::warn!("Proof chain {} -> {} has no forward step", prev.seqno, seqno);
            &[]
        }
    };

    let total = validators.quorum_total(config.total_weight_mode);
    let quorum = select_quorum(&validators.validators, signatures, total)?;
    tracing::info!(
        "Selected {} of {} signatures for block {} ({}/{} weight)",
        quorum.len(),
        signatures.len(),
        seqno,
        quorum.signed_weight(),
        total
    );

    Ok(BlockSignatures {
        block: id,
        key_block: key_id,
        validators,
        quorum,
    })
}

/// The key block whose validator set can vouch for `seqno`: the block itself
/// when it is a key block, its previous key block otherwise.
pub fn resolve_trusted_key_block<P: BlockProvider + ?Sized>(
    provider: &P,
    seqno: u32,
) -> Result<(BlockId, Block)> {
    let id = provider.lookup_block(MASTERCHAIN_WORKCHAIN, MASTERCHAIN_SHARD, seqno)?;
    let block = load_block(provider, &id)?;
    if block.is_key_block() {
        return Ok((id, block));
    }

    let key_seqno = block.info().prev_key_block_seqno;
    tracing::info!("Block {} is not a key block, using key block {}", seqno, key_seqno);
    let key_id = provider.lookup_block(MASTERCHAIN_WORKCHAIN, MASTERCHAIN_SHARD, key_seqno)?;
    let key_block = load_block(provider, &key_id)?;
    Ok((key_id, key_block))
}
