// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Selective-disclosure proofs over cell trees.
//!
//! A [`ProofSkeleton`] records which references to keep, [`prune`] copies a
//! tree along those paths and replaces everything else with pruned branches,
//! and [`ProofPathResolver`] knows where facts live inside a block.

pub mod prune;
pub mod receipt;
pub mod resolve;
pub mod skeleton;

pub use prune::{create_merkle_proof, prune, unwrap_merkle_proof, verify_merkle_proof};
pub use receipt::ProofReceipt;
pub use resolve::{build_block_proof, build_tx_proof, ProofPathResolver, TransactionLocation};
pub use skeleton::ProofSkeleton;
