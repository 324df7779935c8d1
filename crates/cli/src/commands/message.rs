// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Message bodies for the bridge contracts, built from offline files.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use bridge_kernel::messages::{check_block_body, check_tx_body, lite_client_init_data, new_key_block_body};
use bridge_kernel::proof::{build_block_proof, build_tx_proof};
use bridge_kernel::source::load_block;

use super::signatures::collect;
use super::Settings;
use crate::input::{parse_hash, read_block};
use crate::output::write_cell;

/// `bridge message new-key-block`
pub fn new_key_block(
    blocks: &[PathBuf],
    signatures: &Path,
    out_path: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let (provider, signed) = collect(blocks, signatures, settings)?;
    let block = load_block(&provider, &signed.block)?;
    if !block.is_key_block() {
        bail!("Block {} is not a key block", signed.block.seqno);
    }
    let proof = build_block_proof(&block)?;
    let body = new_key_block_body(&signed.block.file_hash, proof, &signed.quorum)?;
    write_cell(out, &body, settings.format, out_path)
}

/// `bridge message check-block`
pub fn check_block(
    blocks: &[PathBuf],
    signatures: &Path,
    out_path: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let (provider, signed) = collect(blocks, signatures, settings)?;
    let block = load_block(&provider, &signed.block)?;
    let proof = build_block_proof(&block)?;
    let body = check_block_body(&signed.block.file_hash, proof, &signed.quorum)?;
    write_cell(out, &body, settings.format, out_path)
}

/// `bridge message check-tx`
pub fn check_tx(
    blocks: &[PathBuf],
    signatures: &Path,
    tx_hash: &str,
    out_path: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let tx_hash = parse_hash(tx_hash)?;
    let (provider, signed) = collect(blocks, signatures, settings)?;
    let block = load_block(&provider, &signed.block)?;

    let (tx_proof, location) = build_tx_proof(&block, &tx_hash)
        .with_context(|| format!("Transaction {} not in block {}", hex::encode(tx_hash), signed.block.seqno))?;
    let block_proof = build_block_proof(&block)?;
    let body = check_tx_body(
        &location,
        tx_proof,
        &signed.block.file_hash,
        block_proof,
        &signed.quorum,
    )?;
    tracing::info!(
        "check-tx body for lt {} of account {}",
        location.lt,
        hex::encode(location.account)
    );
    write_cell(out, &body, settings.format, out_path)
}

/// `bridge message init-data`: initial light client storage from a key block.
pub fn init_data(
    block_path: &Path,
    out_path: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let block = read_block(block_path)?;
    if !block.is_key_block() {
        bail!("Block {} is not a key block", block.info().seqno);
    }
    let main = super::validators::load(block_path)?;
    let data = lite_client_init_data(&main)?;
    tracing::info!(
        "Light client seeded with {} validators, weight {}",
        main.validators.len(),
        main.total_weight
    );
    write_cell(out, &data, settings.format, out_path)
}
