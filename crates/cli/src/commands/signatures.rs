// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bridge_kernel::source::{collect_block_signatures, BlockSignatures, MemoryProvider};
use serde::Serialize;

use super::Settings;
use crate::input::offline_provider;
use crate::output::{write_cell, write_json, OutputFormat};

#[derive(Serialize)]
struct SelectedSignature {
    public_key: String,
    signature: String,
}

#[derive(Serialize)]
struct QuorumReport {
    block: bridge_kernel::source::BlockId,
    key_block: bridge_kernel::source::BlockId,
    signed_weight: u64,
    total_weight: u64,
    signatures: Vec<SelectedSignature>,
}

/// Loads the files and selects a quorum for the signed block.
pub fn collect(
    blocks: &[PathBuf],
    signatures: &Path,
    settings: &Settings,
) -> anyhow::Result<(MemoryProvider, BlockSignatures)> {
    let (provider, seqno) = offline_provider(blocks, signatures)?;
    let signed = collect_block_signatures(&provider, seqno, &settings.prover)
        .with_context(|| format!("No quorum for block {}", seqno))?;
    Ok((provider, signed))
}

/// `bridge block signatures`
pub fn run(
    blocks: &[PathBuf],
    signatures: &Path,
    out_path: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let (_, signed) = collect(blocks, signatures, settings)?;
    let quorum = &signed.quorum;

    match settings.format {
        OutputFormat::Json => write_json(
            out,
            &QuorumReport {
                block: signed.block,
                key_block: signed.key_block,
                signed_weight: quorum.signed_weight(),
                total_weight: quorum.total_weight(),
                signatures: quorum
                    .iter()
                    .map(|(key, sig)| SelectedSignature {
                        public_key: hex::encode(key),
                        signature: hex::encode(sig),
                    })
                    .collect(),
            },
        ),
        format => write_cell(out, &quorum.to_dict_cell()?, format, out_path),
    }
}
