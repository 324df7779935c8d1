// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! bridge-kernel: proof construction and signature quorum selection for a
//! trustless cross-chain bridge.
//!
//! A block is a tree of content-addressed cells. To prove one fact about it
//! (a configuration parameter, a transaction) the kernel records the path to
//! that fact in a [`proof::ProofSkeleton`] and prunes every other branch down
//! to its hash, so the proof still hashes to the block's root. Separately,
//! [`quorum::select_quorum`] picks the heaviest validator signatures until
//! they carry more than two thirds of the epoch's weight.

pub mod block;
pub mod cell;
pub mod config;
pub mod dict;
pub mod error;
pub mod fixtures;
pub mod messages;
pub mod proof;
pub mod quorum;
pub mod source;
pub mod validators;

pub use error::{ErrorKind, KernelError, KernelResult, Result};

#[cfg(test)]
pub mod tests;
