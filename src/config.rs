// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants and prover settings.

use serde::{Deserialize, Serialize};

/// Maximum number of data bits in a single cell.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of child references in a single cell.
pub const MAX_CELL_REFS: usize = 4;

/// Magic prefix of a serialized bag of cells.
pub const BOC_MAGIC: u32 = 0xb5ee_9c72;

/// TL constructor id of `pub.ed25519`, hashed together with a key to derive its short id.
pub const PUB_ED25519_TL_ID: u32 = 0x4813_b4c6;

/// Configuration parameter holding the current validator set.
pub const CONFIG_PARAM_CURRENT_VALIDATORS: u32 = 34;

/// Key width of the configuration dictionary.
pub const CONFIG_KEY_BITS: usize = 32;

/// Key width of the account-blocks dictionary.
pub const ACCOUNT_KEY_BITS: usize = 256;

/// Key width (logical time) of an account's transaction dictionary.
pub const TRANSACTION_KEY_BITS: usize = 64;

/// Key width of the validator list dictionary.
pub const VALIDATOR_KEY_BITS: usize = 16;

pub const MASTERCHAIN_WORKCHAIN: i32 = -1;
pub const MASTERCHAIN_SHARD: u64 = 0x8000_0000_0000_0000;

pub const OP_NEW_KEY_BLOCK: u32 = 0x11a7_8ffe;
pub const OP_CHECK_BLOCK: u32 = 0x8eaa_9d76;
pub const OP_CHECK_TX: u32 = 0x91d5_55f7;

/// Which validators contribute to the total weight the quorum is measured against.
///
/// Chain semantics differ between versions: either only the `main` validators
/// that are eligible for the current epoch, or every entry of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalWeightMode {
    #[default]
    MainValidators,
    AllValidators,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    pub total_weight_mode: TotalWeightMode,
}
