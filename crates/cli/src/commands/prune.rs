// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context};
use bridge_kernel::proof::{create_merkle_proof, ProofSkeleton};

use super::Settings;
use crate::input::read_cell;
use crate::output::write_cell;

/// Parses `3.0.2` (child indices from the root) with an optional trailing `*`
/// that keeps the whole subtree below the last index.
pub fn parse_path(text: &str) -> anyhow::Result<(Vec<usize>, bool)> {
    let (body, recursive) = match text.strip_suffix('*') {
        Some(body) => (body.trim_end_matches('.'), true),
        None => (text, false),
    };
    if body.is_empty() {
        return Ok((Vec::new(), recursive));
    }
    let indices = body
        .split('.')
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| anyhow!("Bad path segment {:?} in {:?}", part, text))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok((indices, recursive))
}

/// `bridge block prune`: keeps only the given paths of any cell tree.
pub fn run(
    cell_path: &Path,
    paths: &[String],
    out_path: Option<&Path>,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let root = read_cell(cell_path)?;
    let mut skeleton = ProofSkeleton::new();
    for text in paths {
        let (indices, recursive) = parse_path(text)?;
        let node = skeleton.descend_path(&indices)?;
        if recursive {
            node.mark_recursive();
        }
    }

    let proof = create_merkle_proof(&root, &skeleton)
        .with_context(|| format!("Paths do not fit {}", cell_path.display()))?;
    tracing::info!(
        "Proof has {} cells, tree has {}",
        proof.count_unique(),
        root.count_unique()
    );
    write_cell(out, &proof, settings.format, out_path)
}
