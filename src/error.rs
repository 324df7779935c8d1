// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

/// Coarse classification of a [`KernelError`].
///
/// Structural errors mean a decoding or schema assumption failed and retrying
/// with the same input cannot help. Not-found errors mean the input was well
/// formed but does not contain the requested fact, so a caller may fetch a
/// different block. Quorum errors carry the weight shortfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structural,
    NotFound,
    QuorumInsufficient,
    Io,
}

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Cell overflow: {bits} bits, {refs} refs")]
    CellOverflow { bits: usize, refs: usize },

    #[error("Cell underflow: needed {needed} {what}, {available} available")]
    CellUnderflow {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Invalid exotic cell: {0}")]
    InvalidExoticCell(String),

    #[error("Invalid bag of cells: {0}")]
    InvalidBoc(String),

    #[error("Skeleton child index {index} out of range (cell has {available} refs)")]
    IndexOutOfRange { index: usize, available: usize },

    #[error("Skeleton does not match tree shape: child {index} requested, cell has {available} refs")]
    SchemaMismatch { index: usize, available: usize },

    #[error("Malformed dictionary: {0}")]
    MalformedDictionary(String),

    #[error("Invalid key width: expected {expected} bits, found {found}")]
    InvalidKeyWidth { expected: usize, found: usize },

    #[error("Unexpected tag for {what}: expected {expected:#x}, found {found:#x}")]
    UnexpectedTag {
        what: &'static str,
        expected: u64,
        found: u64,
    },

    #[error("Unknown validator set format (tag {0:#04x})")]
    UnknownValidatorSetFormat(u8),

    #[error("Validator weight mismatch: declared {declared}, computed {computed}")]
    WeightMismatch { declared: u64, computed: u64 },

    #[error("Validator weight sum overflows u64")]
    WeightOverflow,

    #[error("Validator set resolves to zero validators")]
    NoValidators,

    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Transaction not found: {tx_hash}")]
    TransactionNotFound { tx_hash: String },

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Block not found: workchain {workchain}, shard {shard:016x}, seqno {seqno}")]
    BlockNotFound { workchain: i32, shard: u64, seqno: u32 },

    #[error("Insufficient signed weight: {signed}/{total} (need at least {required})")]
    InsufficientWeight { signed: u64, required: u64, total: u64 },

    #[error("Block provider error: {0}")]
    Provider(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
}

impl KernelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::KeyNotFound { .. }
            | KernelError::TransactionNotFound { .. }
            | KernelError::MissingField(_)
            | KernelError::BlockNotFound { .. } => ErrorKind::NotFound,
            KernelError::InsufficientWeight { .. } => ErrorKind::QuorumInsufficient,
            KernelError::IoError(_) | KernelError::Provider(_) => ErrorKind::Io,
            _ => ErrorKind::Structural,
        }
    }

    pub(crate) fn key_not_found(key: &crate::cell::BitString) -> Self {
        KernelError::KeyNotFound {
            key: key.to_string(),
        }
    }
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
