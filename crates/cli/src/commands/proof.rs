// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use bridge_kernel::cell::CellRef;
use bridge_kernel::proof::{build_block_proof, build_tx_proof, ProofReceipt};

use super::Settings;
use crate::input::{parse_hash, read_block};
use crate::output::write_cell;

/// `bridge block proof`: validator set for key blocks, header otherwise.
pub fn block(
    block_path: &Path,
    out_path: Option<&Path>,
    receipt_path: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let block = read_block(block_path)?;
    let proof = build_block_proof(&block).context("Failed to build block proof")?;
    tracing::info!(
        "Built {} proof for block {} ({} cells)",
        if block.is_key_block() { "key block" } else { "header" },
        block.info().seqno,
        proof.count_unique()
    );

    write_receipt(&proof, receipt_path)?;
    write_cell(out, &proof, settings.format, out_path)
}

/// `bridge tx proof`: the transaction and the dictionary paths leading to it.
pub fn tx(
    block_path: &Path,
    tx_hash: &str,
    out_path: Option<&Path>,
    receipt_path: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let block = read_block(block_path)?;
    let tx_hash = parse_hash(tx_hash)?;
    let (proof, location) = build_tx_proof(&block, &tx_hash)
        .with_context(|| format!("Failed to prove transaction {}", hex::encode(tx_hash)))?;
    tracing::info!(
        "Transaction {} found in account {} at lt {}",
        hex::encode(tx_hash),
        hex::encode(location.account),
        location.lt
    );

    write_receipt(&proof, receipt_path)?;
    write_cell(out, &proof, settings.format, out_path)
}

fn write_receipt(proof: &CellRef, path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let (receipt, _) = ProofReceipt::for_proof(proof)?;
    std::fs::write(path, receipt.encode()?)
        .with_context(|| format!("Failed to write receipt {}", path.display()))?;
    tracing::info!("Receipt for root {} written to {:?}", hex::encode(receipt.root_hash), path);
    Ok(())
}
