// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use bridge_kernel::cell::{boc, CellRef};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Raw bag of cells.
    #[default]
    Bin,
    Hex,
    Json,
}

/// Writes a cell tree as a bag of cells, to `path` when given, else to `out`.
pub fn write_cell(
    out: &mut dyn Write,
    cell: &CellRef,
    format: OutputFormat,
    path: Option<&Path>,
) -> anyhow::Result<()> {
    let bytes = boc::to_boc(cell)?;
    let encoded = match format {
        OutputFormat::Bin => bytes,
        OutputFormat::Hex => format!("{}\n", hex::encode(&bytes)).into_bytes(),
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "hash": hex::encode(cell.hash()),
                "cells": cell.count_unique(),
                "boc": hex::encode(&bytes),
            });
            format!("{}\n", serde_json::to_string_pretty(&doc)?).into_bytes()
        }
    };

    match path {
        Some(path) => {
            std::fs::write(path, &encoded)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {} bytes to {:?}", encoded.len(), path);
        }
        None => out.write_all(&encoded)?,
    }
    Ok(())
}

pub fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn timestamp(unix: u32) -> String {
    chrono::DateTime::from_timestamp(unix as i64, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Shortened hex for table cells.
pub fn short_hex(bytes: &[u8]) -> String {
    let full = hex::encode(bytes);
    if full.len() <= 16 {
        return full;
    }
    format!("{}..{}", &full[..8], &full[full.len() - 8..])
}
