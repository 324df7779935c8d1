// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;
use std::path::Path;

use bridge_kernel::block::file_hash;
use serde::Serialize;

use super::Settings;
use crate::input::read_block;
use crate::output::{table, timestamp, write_json, OutputFormat};

#[derive(Serialize)]
struct BlockSummary<'a> {
    root_hash: String,
    file_hash: String,
    global_id: i32,
    accounts: usize,
    info: &'a bridge_kernel::block::BlockInfo,
}

/// `bridge block info`
pub fn run(block_path: &Path, settings: &Settings, out: &mut dyn Write) -> anyhow::Result<()> {
    let bytes = std::fs::read(block_path)?;
    let block = read_block(block_path)?;
    let info = block.info();
    let accounts = match block.account_blocks() {
        Ok(Some((_, dict))) => dict.load_all()?.len(),
        Ok(None) => 0,
        Err(e) => {
            tracing::warn!("Account blocks unreadable: {}", e);
            0
        }
    };

    if settings.format == OutputFormat::Json {
        return write_json(
            out,
            &BlockSummary {
                root_hash: hex::encode(block.hash()),
                file_hash: hex::encode(file_hash(&bytes)),
                global_id: block.global_id(),
                accounts,
                info,
            },
        );
    }

    let mut t = table(vec!["Field", "Value"]);
    t.add_row(vec!["Seqno".to_string(), info.seqno.to_string()]);
    t.add_row(vec![
        "Shard".to_string(),
        format!("{}:{:016x}", info.shard.workchain, info.shard.shard_id()),
    ]);
    t.add_row(vec!["Key block".to_string(), info.key_block.to_string()]);
    t.add_row(vec![
        "Prev key block".to_string(),
        info.prev_key_block_seqno.to_string(),
    ]);
    t.add_row(vec!["Generated".to_string(), timestamp(info.gen_utime)]);
    t.add_row(vec![
        "Logical time".to_string(),
        format!("{}..{}", info.start_lt, info.end_lt),
    ]);
    t.add_row(vec!["Accounts".to_string(), accounts.to_string()]);
    t.add_row(vec!["Root hash".to_string(), hex::encode(block.hash())]);
    t.add_row(vec!["File hash".to_string(), hex::encode(file_hash(&bytes))]);

    writeln!(out, "\nBlock {}\n", info.seqno)?;
    writeln!(out, "{t}\n")?;
    Ok(())
}
