// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Message bodies and contract data for the on-chain bridge contracts.
//!
//! Only payload construction lives here; signing and sending belong to a wallet.

use crate::cell::{BitString, CellBuilder, CellRef};
use crate::config::{OP_CHECK_BLOCK, OP_CHECK_TX, OP_NEW_KEY_BLOCK};
use crate::dict::DictBuilder;
use crate::error::Result;
use crate::proof::TransactionLocation;
use crate::quorum::QuorumResult;
use crate::validators::MainValidators;

/// `^[file_hash:bits256 proof:^Cell]`, the block reference shared by several bodies.
pub fn block_ref_cell(file_hash: &[u8; 32], proof: CellRef) -> Result<CellRef> {
    let mut b = CellBuilder::new();
    b.store_bytes(file_hash)?;
    b.store_ref(proof)?;
    b.build_ref()
}

fn block_body(op: u32, file_hash: &[u8; 32], proof: CellRef, signatures: &QuorumResult) -> Result<CellRef> {
    let mut b = CellBuilder::new();
    b.store_uint(op as u64, 32)?;
    b.store_uint(0, 64)?;
    b.store_ref(block_ref_cell(file_hash, proof)?)?;
    signatures.to_dict()?.store_into(&mut b)?;
    b.build_ref()
}

/// Body announcing a new key block to the light client contract.
pub fn new_key_block_body(file_hash: &[u8; 32], proof: CellRef, signatures: &QuorumResult) -> Result<CellRef> {
    block_body(OP_NEW_KEY_BLOCK, file_hash, proof, signatures)
}

/// Body asking the light client contract to check an ordinary block.
pub fn check_block_body(file_hash: &[u8; 32], proof: CellRef, signatures: &QuorumResult) -> Result<CellRef> {
    block_body(OP_CHECK_BLOCK, file_hash, proof, signatures)
}

/// `hash:bits256 account:bits256 lt:uint64`.
pub fn tx_summary_cell(location: &TransactionLocation) -> Result<CellRef> {
    let mut b = CellBuilder::new();
    b.store_bytes(location.transaction.hash())?;
    b.store_bytes(&location.account)?;
    b.store_uint(location.lt, 64)?;
    b.build_ref()
}

/// Body asking the transaction checker to verify `tx_proof` against a signed block.
///
/// ```text
/// op:uint32 tx:^TxSummary proof:^Cell
///   block:^[ ^[file_hash:bits256 ^BlockProof] ^Signatures ]
/// ```
pub fn check_tx_body(
    location: &TransactionLocation,
    tx_proof: CellRef,
    file_hash: &[u8; 32],
    block_proof: CellRef,
    signatures: &QuorumResult,
) -> Result<CellRef> {
    let mut block = CellBuilder::new();
    block.store_ref(block_ref_cell(file_hash, block_proof)?)?;
    block.store_ref(signatures.to_dict_cell()?)?;

    let mut b = CellBuilder::new();
    b.store_uint(OP_CHECK_TX as u64, 32)?;
    b.store_ref(tx_summary_cell(location)?)?;
    b.store_ref(tx_proof)?;
    b.store_ref(block.build_ref()?)?;
    b.build_ref()
}

/// Initial storage of the light client: `total_weight:uint64 epoch_hash:bits256
/// validators:(HashmapE 256 uint64)`.
pub fn lite_client_init_data(main: &MainValidators) -> Result<CellRef> {
    let mut validators = DictBuilder::new(256);
    for v in &main.validators {
        let mut weight = CellBuilder::new();
        weight.store_uint(v.weight, 64)?;
        validators.insert(BitString::from_bytes(&v.public_key), weight)?;
    }

    let mut b = CellBuilder::new();
    b.store_uint(main.total_weight, 64)?;
    b.store_bytes(&main.set_hash)?;
    validators.store_into(&mut b)?;
    b.build_ref()
}
