// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::cell::{BitString, CellBuilder, CellKind, CellRef, CellSlice};
use crate::dict::{DictBuilder, Dictionary};
use crate::error::{ErrorKind, KernelError};
use crate::proof::{prune, ProofSkeleton};

const KEYS: [u64; 9] = [0, 1, 2, 7, 34, 35, 1_000, 65_535, 4_294_967_295];

fn marker(key: u64) -> CellRef {
    let mut b = CellBuilder::new();
    b.store_uint(key ^ 0xA5A5_A5A5, 64).unwrap();
    b.build_ref().unwrap()
}

/// Hashmap 32 ^Cell, like the configuration dictionary.
fn ref_dict(keys: &[u64]) -> Dictionary {
    let mut d = DictBuilder::new(32);
    for &k in keys {
        let mut value = CellBuilder::new();
        value.store_ref(marker(k)).unwrap();
        d.insert_uint(k, value).unwrap();
    }
    Dictionary::from_root_cell(d.build().unwrap().unwrap(), 32)
}

fn revealed_leaves(cell: &CellRef, out: &mut Vec<CellRef>) {
    if cell.kind() != CellKind::Ordinary {
        return;
    }
    if cell.refs().is_empty() {
        out.push(cell.clone());
    }
    for child in cell.refs() {
        revealed_leaves(child, out);
    }
}

#[test]
fn test_every_key_found() {
    let dict = ref_dict(&KEYS);
    for &k in &KEYS {
        let mut value = dict.get_uint(k).unwrap();
        assert_eq!(value.load_ref().unwrap().hash(), marker(k).hash(), "key {}", k);
    }
}

#[test]
fn test_lookup_path_reveals_single_value() {
    let dict = ref_dict(&KEYS);
    let root = dict.root_cell().clone();

    for &k in &KEYS {
        let mut sk = ProofSkeleton::new();
        let key = BitString::from_uint(k, 32);
        let (_, leaf) = dict.lookup_with_path(&key, &mut sk).unwrap();
        leaf.mark_recursive();

        let proof = prune(&root, &sk).unwrap();
        assert_eq!(proof.hash(), root.hash());

        let mut values = Vec::new();
        revealed_leaves(&proof, &mut values);
        assert_eq!(values.len(), 1, "key {}", k);
        assert_eq!(values[0].hash(), marker(k).hash());

        // the proof alone still answers the lookup
        let from_proof = Dictionary::from_root_cell(proof, 32);
        let mut value = from_proof.get(&key).unwrap();
        assert_eq!(value.load_ref().unwrap().hash(), marker(k).hash());
    }
}

#[test]
fn test_load_all_ascending() {
    let mut shuffled = KEYS;
    shuffled.reverse();
    let dict = ref_dict(&shuffled);
    let keys: Vec<u64> = dict
        .load_all()
        .unwrap()
        .iter()
        .map(|(k, _)| k.to_uint())
        .collect();
    assert_eq!(keys, KEYS.to_vec());
}

#[test]
fn test_single_entry_dictionary() {
    let dict = ref_dict(&[34]);
    let mut sk = ProofSkeleton::new();
    let (mut value, leaf) = dict
        .lookup_with_path(&BitString::from_uint(34, 32), &mut sk)
        .unwrap();
    assert_eq!(value.load_ref().unwrap().hash(), marker(34).hash());
    leaf.mark_recursive();
    // the root edge is the leaf, so no descent was recorded
    assert!(sk.is_recursive());
    assert_eq!(sk.node_count(), 1);
}

#[test]
fn test_missing_key_is_not_found() {
    let dict = ref_dict(&KEYS);
    let err = dict.get_uint(36).unwrap_err();
    assert!(matches!(err, KernelError::KeyNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_wrong_key_width() {
    let dict = ref_dict(&KEYS);
    let mut sk = ProofSkeleton::new();
    let err = dict
        .lookup_with_path(&BitString::from_uint(34, 16), &mut sk)
        .unwrap_err();
    assert!(matches!(err, KernelError::InvalidKeyWidth { expected: 32, found: 16 }));
    assert_eq!(sk.node_count(), 1);
}

#[test]
fn test_fork_without_children_is_malformed() {
    // hml_short with an empty label, then nothing: a fork with no refs
    let mut b = CellBuilder::new();
    b.store_uint(0b00, 2).unwrap();
    let dict = Dictionary::from_root_cell(b.build_ref().unwrap(), 8);
    let err = dict.get_uint(3).unwrap_err();
    assert!(matches!(err, KernelError::MalformedDictionary(_)));
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn test_truncated_label_is_malformed() {
    // hml_long claims 12 bits but the cell ends after 3
    let mut b = CellBuilder::new();
    b.store_uint(0b10, 2).unwrap();
    b.store_uint(12, 5).unwrap();
    b.store_uint(0b101, 3).unwrap();
    let dict = Dictionary::from_root_cell(b.build_ref().unwrap(), 16);
    assert!(matches!(
        dict.load_all(),
        Err(KernelError::MalformedDictionary(_))
    ));
    assert!(matches!(
        dict.get_uint(0),
        Err(KernelError::MalformedDictionary(_))
    ));
}

#[test]
fn test_inline_dictionary_uses_absolute_ref_slots() {
    let mut entries = DictBuilder::new(16);
    for k in [1u64, 2] {
        let mut v = CellBuilder::new();
        v.store_uint(k, 8).unwrap();
        entries.insert_uint(k, v).unwrap();
    }

    // a leading ref pushes the inline dictionary's forks to slots 1 and 2
    let mut parent = CellBuilder::new();
    parent.store_ref(marker(0)).unwrap();
    parent.store_uint(0xFF, 8).unwrap();
    parent.append(&entries.build_inline().unwrap()).unwrap();
    let parent = parent.build_ref().unwrap();

    let mut s = CellSlice::new(parent.clone());
    s.load_ref().unwrap();
    s.skip_bits(8).unwrap();
    let dict = Dictionary::inline(s, 16);

    let mut sk = ProofSkeleton::new();
    let (mut value, _) = dict
        .lookup_with_path(&BitString::from_uint(2, 16), &mut sk)
        .unwrap();
    assert_eq!(value.load_uint(8).unwrap(), 2);
    assert!(sk.child(0).is_none());
    assert!(sk.child(2).is_some());

    let proof = prune(&parent, &sk).unwrap();
    assert_eq!(proof.hash(), parent.hash());
    assert_eq!(proof.reference(1).unwrap().kind(), CellKind::PrunedBranch);
}
