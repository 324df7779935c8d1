// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use bridge_kernel::cell::boc;
use bridge_kernel::proof::{verify_merkle_proof, ProofReceipt};

use crate::input::read_block;

/// `bridge block verify`: checks a proof file against its block and receipt.
pub fn run(
    proof_path: &Path,
    block_path: Option<&Path>,
    receipt_path: Option<&Path>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let bytes = std::fs::read(proof_path)
        .with_context(|| format!("Failed to read {}", proof_path.display()))?;
    let proof = boc::from_boc(&bytes)?;
    let proven = verify_merkle_proof(&proof)?;

    if let Some(path) = receipt_path {
        let receipt = ProofReceipt::decode(&std::fs::read(path)?)?;
        if !receipt.matches(&bytes) || receipt.root_hash != proven {
            writeln!(out, "\n❌ RECEIPT MISMATCH\n")?;
            writeln!(out, "Receipt root: {}", hex::encode(receipt.root_hash))?;
            writeln!(out, "Proof root:   {}", hex::encode(proven))?;
            bail!("Proof {} does not match receipt {}", proof_path.display(), path.display());
        }
    }

    if let Some(path) = block_path {
        let block = read_block(path)?;
        if block.hash() != &proven {
            writeln!(out, "\n❌ WRONG BLOCK\n")?;
            writeln!(out, "Expected Root: {}", hex::encode(block.hash()))?;
            writeln!(out, "Proven Root:   {}", hex::encode(proven))?;
            bail!("Proof does not commit to block {}", block.info().seqno);
        }
    }

    writeln!(out, "\n✅ VERIFIED\n")?;
    writeln!(out, "Proven Root: {}", hex::encode(proven))?;
    writeln!(out, "Cells:       {}\n", proof.count_unique())?;
    Ok(())
}
