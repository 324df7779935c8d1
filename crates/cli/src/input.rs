// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Loading blocks, proofs and signatures from disk.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use bridge_kernel::block::Block;
use bridge_kernel::cell::{boc, CellRef};
use bridge_kernel::config::{MASTERCHAIN_SHARD, MASTERCHAIN_WORKCHAIN};
use bridge_kernel::quorum::SignatureEntry;
use bridge_kernel::source::{BlockId, BlockProvider, MemoryProvider, ProofStep};
use serde::{Deserialize, Serialize};

pub fn read_cell(path: &Path) -> anyhow::Result<CellRef> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    boc::from_boc(&bytes).with_context(|| format!("{} is not a bag of cells", path.display()))
}

pub fn read_block(path: &Path) -> anyhow::Result<Block> {
    let root = read_cell(path)?;
    Block::parse(root).with_context(|| format!("{} is not a block", path.display()))
}

pub fn parse_hash(text: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = hex::decode(text.trim_start_matches("0x")).context("Hash is not hex")?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow!("Hash must be 32 bytes, got {}", b.len()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub node_id_short: String,
    pub signature: String,
}

impl SignatureRecord {
    pub fn from_entry(entry: &SignatureEntry) -> Self {
        Self {
            node_id_short: hex::encode(entry.node_id_short),
            signature: hex::encode(entry.signature),
        }
    }

    pub fn to_entry(&self) -> anyhow::Result<SignatureEntry> {
        let signature = hex::decode(&self.signature).context("Signature is not hex")?;
        Ok(SignatureEntry {
            node_id_short: parse_hash(&self.node_id_short)?,
            signature: signature
                .try_into()
                .map_err(|s: Vec<u8>| anyhow!("Signature must be 64 bytes, got {}", s.len()))?,
        })
    }
}

/// Signatures over one masterchain block, as dumped by a lite client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureFile {
    pub seqno: u32,
    pub signatures: Vec<SignatureRecord>,
}

impl SignatureFile {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid signature file {}", path.display()))
    }

    pub fn entries(&self) -> anyhow::Result<Vec<SignatureEntry>> {
        self.signatures.iter().map(SignatureRecord::to_entry).collect()
    }
}

/// Serves block files and one signature file as if they came from the network.
///
/// The signatures become the forward step into their block; the block before
/// it only needs an id, so one is made up when its file is absent.
pub fn offline_provider(blocks: &[PathBuf], signatures: &Path) -> anyhow::Result<(MemoryProvider, u32)> {
    let mut provider = MemoryProvider::new();
    for path in blocks {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let id = provider
            .insert_block(bytes)
            .with_context(|| format!("{} is not a block", path.display()))?;
        tracing::debug!("Loaded block {} from {:?}", id.seqno, path);
    }

    let file = SignatureFile::read(signatures)?;
    let target = provider.lookup_block(MASTERCHAIN_WORKCHAIN, MASTERCHAIN_SHARD, file.seqno)?;
    let prev_seqno = file
        .seqno
        .checked_sub(1)
        .ok_or_else(|| anyhow!("Block 0 has no signatures"))?;
    let prev = match provider.lookup_block(MASTERCHAIN_WORKCHAIN, MASTERCHAIN_SHARD, prev_seqno) {
        Ok(id) => id,
        Err(_) => {
            let id = BlockId {
                workchain: MASTERCHAIN_WORKCHAIN,
                shard: MASTERCHAIN_SHARD,
                seqno: prev_seqno,
                root_hash: [0u8; 32],
                file_hash: [0u8; 32],
            };
            provider.insert_id(id);
            id
        }
    };
    provider.insert_proof(
        &prev,
        &target,
        vec![ProofStep::Forward {
            from: prev,
            to: target,
            signatures: file.entries()?,
        }],
    );
    Ok((provider, file.seqno))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hash() {
        let hash = parse_hash(&format!("0x{}", "ab".repeat(32))).unwrap();
        assert_eq!(hash, [0xab; 32]);
        assert!(parse_hash("abcd").is_err());
        assert!(parse_hash("zz").is_err());
    }

    #[test]
    fn test_signature_record_round_trip() {
        let entry = SignatureEntry {
            node_id_short: [3u8; 32],
            signature: [4u8; 64],
        };
        let record = SignatureRecord::from_entry(&entry);
        assert_eq!(record.to_entry().unwrap(), entry);
    }
}
