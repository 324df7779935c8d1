// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::PathBuf;

use bridge_cli::commands::{info, message, proof, prune, signatures, validators, verify, Settings};
use bridge_cli::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bridge")]
#[command(about = "Block proofs and signature quorums for the trustless bridge", long_about = None)]
struct Cli {
    /// JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (overrides the config file).
    #[arg(long, short, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Measure the quorum against every validator of the set, not only the main ones.
    #[arg(long, global = true)]
    all_validators: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Block proofs, headers, validator sets and signatures
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },
    /// Transaction proofs
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },
    /// Message bodies for the bridge contracts
    Message {
        #[command(subcommand)]
        command: MessageCommands,
    },
}

#[derive(Args)]
struct Output {
    /// Write to this file instead of stdout.
    #[arg(long, short)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct SignedBlock {
    /// Block files (bag of cells): the signed block and its key block.
    #[arg(long = "block", required = true)]
    blocks: Vec<PathBuf>,

    /// JSON file with the signatures over the signed block.
    #[arg(long)]
    signatures: PathBuf,
}

#[derive(Subcommand)]
enum BlockCommands {
    /// Prove a block: its validator set for key blocks, its header otherwise
    Proof {
        block: PathBuf,
        #[command(flatten)]
        output: Output,
        /// Also write a receipt for the proof.
        #[arg(long)]
        receipt: Option<PathBuf>,
    },
    /// Keep only the given paths (`3.0.2`, `3.1*`) of any cell tree
    Prune {
        cell: PathBuf,
        #[arg(long = "path", required = true)]
        paths: Vec<String>,
        #[command(flatten)]
        output: Output,
    },
    /// Show a block header
    Info { block: PathBuf },
    /// List the main validators published by a key block
    Validators { block: PathBuf },
    /// Select a quorum of signatures for a block
    Signatures {
        #[command(flatten)]
        signed: SignedBlock,
        #[command(flatten)]
        output: Output,
    },
    /// Check a proof file
    Verify {
        proof: PathBuf,
        /// Block the proof must commit to.
        #[arg(long)]
        block: Option<PathBuf>,
        /// Receipt written by `block proof` or `tx proof`.
        #[arg(long)]
        receipt: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TxCommands {
    /// Prove that a transaction is part of a block
    Proof {
        block: PathBuf,
        /// Transaction hash (hex).
        #[arg(long)]
        hash: String,
        #[command(flatten)]
        output: Output,
        #[arg(long)]
        receipt: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MessageCommands {
    /// Announce a new key block to the light client
    NewKeyBlock {
        #[command(flatten)]
        signed: SignedBlock,
        #[command(flatten)]
        output: Output,
    },
    /// Ask the light client to check a block
    CheckBlock {
        #[command(flatten)]
        signed: SignedBlock,
        #[command(flatten)]
        output: Output,
    },
    /// Ask the transaction checker to verify a transaction
    CheckTx {
        #[command(flatten)]
        signed: SignedBlock,
        /// Transaction hash (hex).
        #[arg(long)]
        hash: String,
        #[command(flatten)]
        output: Output,
    },
    /// Initial light client storage from a key block
    InitData {
        block: PathBuf,
        #[command(flatten)]
        output: Output,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "bridge_cli=info,bridge_kernel=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(cli.config.as_deref(), cli.format, cli.all_validators)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Block { command } => match command {
            BlockCommands::Proof {
                block,
                output,
                receipt,
            } => proof::block(
                &block,
                output.out.as_deref(),
                receipt.as_deref(),
                &settings,
                &mut out,
            ),
            BlockCommands::Prune {
                cell,
                paths,
                output,
            } => prune::run(&cell, &paths, output.out.as_deref(), &settings, &mut out),
            BlockCommands::Info { block } => info::run(&block, &settings, &mut out),
            BlockCommands::Validators { block } => validators::run(&block, &settings, &mut out),
            BlockCommands::Signatures { signed, output } => signatures::run(
                &signed.blocks,
                &signed.signatures,
                output.out.as_deref(),
                &settings,
                &mut out,
            ),
            BlockCommands::Verify {
                proof,
                block,
                receipt,
            } => verify::run(&proof, block.as_deref(), receipt.as_deref(), &mut out),
        },
        Commands::Tx { command } => match command {
            TxCommands::Proof {
                block,
                hash,
                output,
                receipt,
            } => proof::tx(
                &block,
                &hash,
                output.out.as_deref(),
                receipt.as_deref(),
                &settings,
                &mut out,
            ),
        },
        Commands::Message { command } => match command {
            MessageCommands::NewKeyBlock { signed, output } => message::new_key_block(
                &signed.blocks,
                &signed.signatures,
                output.out.as_deref(),
                &settings,
                &mut out,
            ),
            MessageCommands::CheckBlock { signed, output } => message::check_block(
                &signed.blocks,
                &signed.signatures,
                output.out.as_deref(),
                &settings,
                &mut out,
            ),
            MessageCommands::CheckTx {
                signed,
                hash,
                output,
            } => message::check_tx(
                &signed.blocks,
                &signed.signatures,
                &hash,
                output.out.as_deref(),
                &settings,
                &mut out,
            ),
            MessageCommands::InitData { block, output } => {
                message::init_data(&block, output.out.as_deref(), &settings, &mut out)
            }
        },
    }
}
