//! Integration tests for the dictionary and blacklist file loaders.

extern crate corpus_engine;

use corpus_engine::{load_blacklist, load_dictionary, CorpusError};
use std::fs;
use tempfile::TempDir;

#[test]
fn dictionary_survives_a_realistic_mixed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dict.txt");
    fs::write(
        &path,
        "# format token dictionary\n\
         \"GET\"\n\
         \"POST\"\n\
         method=\"PUT\"\n\
         \"\\x00\\x01\\x02\"\n\
         \n\
         this line has no quotes at all\n",
    )
    .unwrap();

    let dict = load_dictionary(&path).unwrap();
    let payloads: Vec<&[u8]> = dict.iter().map(|e| e.bytes.as_slice()).collect();
    assert_eq!(payloads, vec![b"GET" as &[u8], b"POST", b"PUT", &[0, 1, 2]]);
}

#[test]
fn blacklist_accepts_a_mixed_hex_and_decimal_ascending_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blacklist.txt");
    fs::write(&path, "100\n0x100\n999999999999\n").unwrap();

    let bl = load_blacklist(&path).unwrap();
    assert_eq!(bl.len(), 3);
    assert!(bl.contains(0x100));
    assert!(!bl.contains(42));
}

#[test]
fn blacklist_rejects_the_first_descending_pair() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blacklist.txt");
    fs::write(&path, "10\n20\n30\n25\n40\n").unwrap();

    let err = load_blacklist(&path).unwrap_err();
    match err {
        CorpusError::BlacklistNotSorted { line } => assert_eq!(line, 4),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn blacklist_with_only_comments_and_blanks_is_empty_and_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blacklist.txt");
    fs::write(&path, "not-a-number\nalso not one\n").unwrap();

    let err = load_blacklist(&path).unwrap_err();
    assert!(matches!(err, CorpusError::BlacklistEmpty));
}
