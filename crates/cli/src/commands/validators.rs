// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use bridge_kernel::config::CONFIG_PARAM_CURRENT_VALIDATORS;
use bridge_kernel::validators::{extract_main_validators, MainValidators};

use super::Settings;
use crate::input::read_block;
use crate::output::{short_hex, table, write_json, OutputFormat};

/// Main validators published by a key block.
pub fn load(block_path: &Path) -> anyhow::Result<MainValidators> {
    let block = read_block(block_path)?;
    let param = block
        .config_params()
        .and_then(|config| config.param(CONFIG_PARAM_CURRENT_VALIDATORS))
        .with_context(|| format!("Block {} carries no validator set", block.info().seqno))?;
    Ok(extract_main_validators(&param)?)
}

/// `bridge block validators`
pub fn run(block_path: &Path, settings: &Settings, out: &mut dyn Write) -> anyhow::Result<()> {
    let main = load(block_path)?;
    if settings.format == OutputFormat::Json {
        return write_json(out, &main);
    }

    let mut t = table(vec!["#", "Public key", "Short id", "Weight"]);
    for (i, v) in main.validators.iter().enumerate() {
        t.add_row(vec![
            i.to_string(),
            hex::encode(v.public_key),
            short_hex(&v.short_id),
            v.weight.to_string(),
        ]);
    }

    writeln!(out, "\nMain validators ({})\n", main.validators.len())?;
    writeln!(out, "{t}\n")?;
    writeln!(out, "Main weight:  {}", main.total_weight)?;
    writeln!(out, "Set weight:   {}", main.all_weight)?;
    writeln!(
        out,
        "Quorum total: {} ({:?})",
        main.quorum_total(settings.prover.total_weight_mode),
        settings.prover.total_weight_mode
    )?;
    writeln!(out, "Set hash:     {}\n", hex::encode(main.set_hash))?;
    Ok(())
}
