// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Locating facts inside a block and recording the path to them.

use super::prune::create_merkle_proof;
use super::skeleton::ProofSkeleton;
use crate::block::{load_transaction_ref, slots, AccountBlock, Block};
use crate::cell::{BitString, CellRef, CellSlice};
use crate::config::{CONFIG_PARAM_CURRENT_VALIDATORS, CONFIG_KEY_BITS, TRANSACTION_KEY_BITS};
use crate::error::{KernelError, Result};

/// Where a transaction lives in a block.
#[derive(Debug, Clone)]
pub struct TransactionLocation {
    pub account: [u8; 32],
    pub lt: u64,
    pub transaction: CellRef,
}

/// Builds one proof skeleton over one block.
///
/// Each call adds a path; calls may be combined freely and the skeleton keeps
/// the union of everything requested.
#[derive(Debug)]
pub struct ProofPathResolver<'b> {
    block: &'b Block,
    skeleton: ProofSkeleton,
}

impl<'b> ProofPathResolver<'b> {
    pub fn new(block: &'b Block) -> Self {
        Self {
            block,
            skeleton: ProofSkeleton::new(),
        }
    }

    /// Reveals the whole `BlockInfo` record.
    pub fn block_header(&mut self) -> Result<&mut Self> {
        self.skeleton
            .descend_within(self.block.root(), slots::INFO)?
            .mark_recursive();
        Ok(self)
    }

    /// Reveals configuration parameter `id` and returns its cell.
    pub fn config_param(&mut self, id: u32) -> Result<CellRef> {
        let block = self.block;
        let (custom_slot, _) = block.custom()?;
        let config = block.config_params()?;
        let node = self
            .skeleton
            .descend_path(&[slots::EXTRA, custom_slot, config.slot])?;

        let key = BitString::from_uint(id as u64, CONFIG_KEY_BITS);
        let (mut value, leaf) = config.dict.lookup_with_path(&key, node)?;
        leaf.mark_recursive();
        value.load_ref()
    }

    /// Reveals the full account block of `account`.
    pub fn account_block(&mut self, account: &[u8; 32]) -> Result<AccountBlock> {
        let (value, leaf) = self.lookup_account(account)?;
        leaf.mark_recursive();
        AccountBlock::parse(value)
    }

    /// Reveals transaction `lt` of `account` and returns its cell.
    ///
    /// Only the three dictionary paths and the transaction itself are kept;
    /// sibling accounts and transactions stay pruned.
    pub fn transaction(&mut self, account: &[u8; 32], lt: u64) -> Result<CellRef> {
        let (value, account_node) = self.lookup_account(account)?;
        let account_block = AccountBlock::parse(value)?;

        let key = BitString::from_uint(lt, TRANSACTION_KEY_BITS);
        let (mut value, tx_node) = account_block
            .transactions
            .lookup_with_path(&key, account_node)?;
        tx_node.mark_recursive();
        let (_, tx) = load_transaction_ref(&mut value)?;
        Ok(tx)
    }

    /// Finds which account and logical time hold the transaction hashing to `tx_hash`.
    pub fn locate_transaction(&self, tx_hash: &[u8; 32]) -> Result<TransactionLocation> {
        let not_found = || KernelError::TransactionNotFound {
            tx_hash: hex::encode(tx_hash),
        };
        let (_, accounts) = self.block.account_blocks()?.ok_or_else(not_found)?;

        for (_, value) in accounts.load_all()? {
            let account_block = AccountBlock::parse(value)?;
            for (lt, transaction) in account_block.transaction_cells()? {
                if transaction.hash() == tx_hash {
                    return Ok(TransactionLocation {
                        account: account_block.account,
                        lt,
                        transaction,
                    });
                }
            }
        }
        Err(not_found())
    }

    /// Locates `tx_hash` and reveals it.
    pub fn prove_transaction(&mut self, tx_hash: &[u8; 32]) -> Result<TransactionLocation> {
        let location = self.locate_transaction(tx_hash)?;
        self.transaction(&location.account, location.lt)?;
        Ok(location)
    }

    pub fn skeleton(&self) -> &ProofSkeleton {
        &self.skeleton
    }

    pub fn finish(self) -> ProofSkeleton {
        self.skeleton
    }

    fn lookup_account(&mut self, account: &[u8; 32]) -> Result<(CellSlice, &mut ProofSkeleton)> {
        let key = BitString::from_bytes(account);
        let (slot, accounts) = self
            .block
            .account_blocks()?
            .ok_or_else(|| KernelError::key_not_found(&key))?;
        let node = self
            .skeleton
            .descend_path(&[slots::EXTRA, slots::ACCOUNT_BLOCKS, slot])?;
        accounts.lookup_with_path(&key, node)
    }
}

/// Proof of a block: key blocks reveal the current validator set, other
/// blocks reveal their header.
pub fn build_block_proof(block: &Block) -> Result<CellRef> {
    let mut resolver = ProofPathResolver::new(block);
    if block.is_key_block() {
        resolver.config_param(CONFIG_PARAM_CURRENT_VALIDATORS)?;
    } else {
        resolver.block_header()?;
    }
    create_merkle_proof(block.root(), &resolver.finish())
}

/// Proof that `tx_hash` is part of `block`.
pub fn build_tx_proof(block: &Block, tx_hash: &[u8; 32]) -> Result<(CellRef, TransactionLocation)> {
    let mut resolver = ProofPathResolver::new(block);
    let location = resolver.prove_transaction(tx_hash)?;
    Ok((create_merkle_proof(block.root(), &resolver.finish())?, location))
}
