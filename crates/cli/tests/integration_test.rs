use std::path::{Path, PathBuf};

use bridge_cli::commands::{info, message, proof, prune, signatures, validators, verify, Settings};
use bridge_cli::input::{SignatureFile, SignatureRecord};
use bridge_cli::output::OutputFormat;
use bridge_kernel::cell::{boc, CellKind, CellSlice};
use bridge_kernel::config::OP_CHECK_TX;
use bridge_kernel::fixtures::{account_id, signed_scenario, transaction_cell, SignedScenario, SCENARIO_SEQNO};
use bridge_kernel::proof::unwrap_merkle_proof;
use tempfile::tempdir;

struct Files {
    key_block: PathBuf,
    block: PathBuf,
    signatures: PathBuf,
}

fn write_scenario(dir: &Path, scenario: &SignedScenario) -> Files {
    let files = Files {
        key_block: dir.join("key_block.boc"),
        block: dir.join("block.boc"),
        signatures: dir.join("signatures.json"),
    };
    std::fs::write(&files.key_block, scenario.key_block.to_boc().unwrap()).unwrap();
    std::fs::write(&files.block, scenario.block.to_boc().unwrap()).unwrap();
    let sigs = SignatureFile {
        seqno: SCENARIO_SEQNO,
        signatures: scenario.signatures.iter().map(SignatureRecord::from_entry).collect(),
    };
    std::fs::write(&files.signatures, serde_json::to_vec(&sigs).unwrap()).unwrap();
    files
}

fn settings(format: OutputFormat) -> Settings {
    Settings {
        format,
        ..Settings::default()
    }
}

#[test]
fn test_block_proof_workflow() {
    let dir = tempdir().unwrap();
    let scenario = signed_scenario(&[10, 5, 5], &[0, 1, 2]).unwrap();
    let files = write_scenario(dir.path(), &scenario);
    let proof_path = dir.path().join("key_block.proof");
    let receipt_path = dir.path().join("key_block.receipt");

    let mut out = Vec::new();
    proof::block(
        &files.key_block,
        Some(&proof_path),
        Some(&receipt_path),
        &settings(OutputFormat::Bin),
        &mut out,
    )
    .unwrap();
    assert!(out.is_empty(), "output went to the file");

    let mut report = Vec::new();
    verify::run(&proof_path, Some(&files.key_block), Some(&receipt_path), &mut report).unwrap();
    assert!(String::from_utf8(report).unwrap().contains("VERIFIED"));

    // the same proof does not commit to the other block
    let mut report = Vec::new();
    assert!(verify::run(&proof_path, Some(&files.block), None, &mut report).is_err());
}

#[test]
fn test_tx_proof_hex_output() {
    let dir = tempdir().unwrap();
    let scenario = signed_scenario(&[10, 5, 5], &[0, 1, 2]).unwrap();
    let files = write_scenario(dir.path(), &scenario);
    let tx = transaction_cell(&account_id(1), 5_000_002).unwrap();

    let mut out = Vec::new();
    proof::tx(
        &files.block,
        &hex::encode(tx.hash()),
        None,
        None,
        &settings(OutputFormat::Hex),
        &mut out,
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    let proof = boc::from_boc(&hex::decode(text.trim()).unwrap()).unwrap();
    assert_eq!(proof.kind(), CellKind::MerkleProof);
    assert_eq!(
        unwrap_merkle_proof(&proof).unwrap().hash(),
        scenario.block.build().unwrap().hash()
    );

    let mut out = Vec::new();
    assert!(proof::tx(&files.block, &"00".repeat(32), None, None, &settings(OutputFormat::Hex), &mut out).is_err());
}

#[test]
fn test_info_and_validators() {
    let dir = tempdir().unwrap();
    let scenario = signed_scenario(&[10, 5, 5], &[0]).unwrap();
    let files = write_scenario(dir.path(), &scenario);

    let mut out = Vec::new();
    info::run(&files.block, &settings(OutputFormat::Bin), &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("105"));

    let mut out = Vec::new();
    info::run(&files.key_block, &settings(OutputFormat::Json), &mut out).unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(doc["info"]["key_block"], true);
    assert_eq!(doc["info"]["seqno"], 100);

    let mut out = Vec::new();
    validators::run(&files.key_block, &settings(OutputFormat::Json), &mut out).unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(doc["total_weight"], 20);
    assert_eq!(doc["validators"].as_array().unwrap().len(), 3);

    let mut out = Vec::new();
    assert!(validators::run(&files.block, &settings(OutputFormat::Bin), &mut out).is_err());
}

#[test]
fn test_signatures_quorum() {
    let dir = tempdir().unwrap();
    let scenario = signed_scenario(&[10, 5, 5], &[2, 1, 0]).unwrap();
    let files = write_scenario(dir.path(), &scenario);
    let blocks = vec![files.key_block.clone(), files.block.clone()];

    let mut out = Vec::new();
    signatures::run(&blocks, &files.signatures, None, &settings(OutputFormat::Json), &mut out).unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(doc["signed_weight"], 15);
    assert_eq!(doc["total_weight"], 20);
    assert_eq!(doc["signatures"].as_array().unwrap().len(), 2);

    let mut out = Vec::new();
    signatures::run(&blocks, &files.signatures, None, &settings(OutputFormat::Bin), &mut out).unwrap();
    let dict = boc::from_boc(&out).unwrap();
    assert_eq!(dict.kind(), CellKind::Ordinary);

    let weak = signed_scenario(&[10, 5, 5], &[1, 2]).unwrap();
    let files = write_scenario(dir.path(), &weak);
    let mut out = Vec::new();
    let err = signatures::run(&blocks, &files.signatures, None, &settings(OutputFormat::Json), &mut out)
        .unwrap_err();
    assert!(format!("{:#}", err).contains("Insufficient"));
}

#[test]
fn test_message_bodies() {
    let dir = tempdir().unwrap();
    let scenario = signed_scenario(&[10, 5, 5], &[0, 1, 2]).unwrap();
    let files = write_scenario(dir.path(), &scenario);
    let blocks = vec![files.key_block.clone(), files.block.clone()];
    let tx = transaction_cell(&account_id(2), 5_000_010).unwrap();

    let body_path = dir.path().join("check_tx.boc");
    let mut out = Vec::new();
    message::check_tx(
        &blocks,
        &files.signatures,
        &hex::encode(tx.hash()),
        Some(&body_path),
        &settings(OutputFormat::Bin),
        &mut out,
    )
    .unwrap();
    let body = boc::from_boc(&std::fs::read(&body_path).unwrap()).unwrap();
    let mut s = CellSlice::new(body);
    assert_eq!(s.load_uint(32).unwrap(), OP_CHECK_TX as u64);
    assert_eq!(s.remaining_refs(), 3);

    let mut out = Vec::new();
    message::check_block(&blocks, &files.signatures, None, &settings(OutputFormat::Bin), &mut out).unwrap();
    assert!(boc::from_boc(&out).is_ok());

    // block 105 is not a key block
    let mut out = Vec::new();
    assert!(message::new_key_block(&blocks, &files.signatures, None, &settings(OutputFormat::Bin), &mut out).is_err());

    let mut out = Vec::new();
    message::init_data(&files.key_block, None, &settings(OutputFormat::Json), &mut out).unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert!(doc["boc"].as_str().is_some());
}

#[test]
fn test_prune_arbitrary_paths() {
    let dir = tempdir().unwrap();
    let scenario = signed_scenario(&[1], &[0]).unwrap();
    let files = write_scenario(dir.path(), &scenario);

    let mut out = Vec::new();
    prune::run(
        &files.block,
        &["0*".to_string(), "3.2".to_string()],
        None,
        &settings(OutputFormat::Bin),
        &mut out,
    )
    .unwrap();
    let proof = unwrap_merkle_proof(&boc::from_boc(&out).unwrap()).unwrap();
    assert_eq!(proof.reference(0).unwrap().kind(), CellKind::Ordinary);
    assert_eq!(proof.reference(1).unwrap().kind(), CellKind::PrunedBranch);
    assert_eq!(proof.reference(3).unwrap().reference(2).unwrap().kind(), CellKind::Ordinary);

    let mut out = Vec::new();
    assert!(prune::run(&files.block, &["0.3.3".to_string()], None, &settings(OutputFormat::Bin), &mut out).is_err());
}

#[test]
fn test_settings_from_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bridge.json");
    std::fs::write(
        &path,
        r#"{"output_format": "hex", "prover": {"total_weight_mode": "main_validators"}}"#,
    )
    .unwrap();

    let s = Settings::resolve(Some(&path), None, true).unwrap();
    assert_eq!(s.format, OutputFormat::Hex);
    assert_eq!(
        s.prover.total_weight_mode,
        bridge_kernel::config::TotalWeightMode::AllValidators
    );

    let s = Settings::resolve(Some(&path), Some(OutputFormat::Json), false).unwrap();
    assert_eq!(s.format, OutputFormat::Json);
}
