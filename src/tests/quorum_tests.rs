// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::cell::{BitString, CellSlice};
use crate::dict::Dictionary;
use crate::error::{ErrorKind, KernelError};
use crate::fixtures::{sign, validators};
use crate::quorum::{required_weight, select_quorum, SignatureEntry, SIGNATURE_KEY_BITS};
use crate::validators::ValidatorEntry;

const BLOCK: [u8; 32] = [0x42; 32];

fn signatures_of(vals: &[ValidatorEntry], signers: &[usize]) -> Vec<SignatureEntry> {
    signers.iter().map(|&i| sign(&vals[i], &BLOCK)).collect()
}

fn total(vals: &[ValidatorEntry]) -> u64 {
    vals.iter().map(|v| v.weight).sum()
}

#[test]
fn test_two_light_signers_are_not_enough() {
    let vals = validators(&[10, 5, 5]);
    let sigs = signatures_of(&vals, &[1, 2]);
    let err = select_quorum(&vals, &sigs, 20).unwrap_err();
    match err {
        KernelError::InsufficientWeight { signed, required, total } => {
            assert_eq!((signed, required, total), (10, 14, 20));
        }
        ref other => panic!("unexpected {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::QuorumInsufficient);
}

#[test]
fn test_heaviest_first_stops_at_threshold() {
    let vals = validators(&[10, 5, 5]);
    let sigs = signatures_of(&vals, &[2, 1, 0]);
    let res = select_quorum(&vals, &sigs, 20).unwrap();

    assert_eq!(res.len(), 2);
    assert_eq!(res.signed_weight(), 15);
    assert!(res.get(&vals[0].public_key).is_some());
    // equal weights keep input order: signer 2 came before signer 1
    assert!(res.get(&vals[2].public_key).is_some());
    assert!(res.get(&vals[1].public_key).is_none());
}

#[test]
fn test_result_is_above_threshold_and_tight() {
    let cases: &[&[u64]] = &[
        &[1, 1, 1],
        &[100],
        &[7, 3, 3, 2, 1],
        &[50, 30, 10, 5, 5],
        &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
        &[u32::MAX as u64, 1, 1],
    ];
    for weights in cases {
        let vals = validators(weights);
        let all: Vec<usize> = (0..vals.len()).collect();
        let sigs = signatures_of(&vals, &all);
        let t = total(&vals);
        let res = select_quorum(&vals, &sigs, t).unwrap();

        let chosen: Vec<u64> = vals
            .iter()
            .filter(|v| res.get(&v.public_key).is_some())
            .map(|v| v.weight)
            .collect();
        let sum: u64 = chosen.iter().sum();
        assert!(3 * sum as u128 > 2 * t as u128, "weights {:?}", weights);
        if chosen.len() > 1 {
            let lightest = chosen.iter().min().copied().unwrap_or(0);
            assert!(3 * (sum - lightest) as u128 <= 2 * t as u128, "weights {:?}", weights);
        }
    }
}

#[test]
fn test_shortfall_is_exact() {
    let vals = validators(&[40, 30, 20, 10]);
    let sigs = signatures_of(&vals, &[1, 2, 3]);
    match select_quorum(&vals, &sigs, 100) {
        Err(KernelError::InsufficientWeight { signed, required, total }) => {
            assert_eq!(signed, 60);
            assert_eq!(required, 67);
            assert_eq!(total, 100);
            assert_eq!(required_weight(total) - signed, 7);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unknown_signers_are_dropped() {
    let vals = validators(&[10, 10, 10]);
    let strangers = validators(&[0, 0, 0, 1_000]);
    let mut sigs = vec![sign(&strangers[3], &BLOCK)];
    sigs.extend(signatures_of(&vals, &[0, 1, 2]));

    let res = select_quorum(&vals, &sigs, 30).unwrap();
    assert_eq!(res.len(), 3);
    assert_eq!(res.signed_weight(), 30);
}

#[test]
fn test_no_signatures() {
    let vals = validators(&[10]);
    assert!(matches!(
        select_quorum(&vals, &[], 10),
        Err(KernelError::InsufficientWeight { signed: 0, required: 7, total: 10 })
    ));
}

#[test]
fn test_signature_dictionary_maps_key_to_signature() {
    let vals = validators(&[10, 5, 5]);
    let sigs = signatures_of(&vals, &[0, 1, 2]);
    let res = select_quorum(&vals, &sigs, 20).unwrap();

    let dict = Dictionary::from_root_cell(res.to_dict_cell().unwrap(), SIGNATURE_KEY_BITS);
    let entries = dict.load_all().unwrap();
    assert_eq!(entries.len(), 2);
    for (key, value) in entries {
        let mut value: CellSlice = value;
        let sig = value.load_bytes(64).unwrap();
        assert_eq!(value.remaining_bits(), 0);
        let pk: [u8; 32] = key.as_bytes().try_into().unwrap();
        assert_eq!(res.get(&pk).unwrap().as_slice(), sig.as_slice());
    }
    assert!(dict.get(&BitString::from_bytes(&vals[1].public_key)).is_ok());
    assert!(matches!(
        dict.get(&BitString::from_bytes(&vals[2].public_key)),
        Err(KernelError::KeyNotFound { .. })
    ));
}
