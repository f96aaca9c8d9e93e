//! Log-format scenarios that exercise the full text-to-`HistoryStore` path,
//! rather than building a store directly through `HistoryBuilder`.

use predicate_core::history::{HistoryError, Key};
use predicate_parser::parse_history;

#[test]
fn write_skew_two_sessions_parses_into_four_transactions() {
    let log = "\
READ KEY[x] Txn(1, 1) From(0, 0)
WRITE KEY[y] Txn(1, 2)
READ KEY[y] Txn(2, 1) From(0, 0)
WRITE KEY[x] Txn(2, 2)
";
    let store = parse_history(log).expect("should parse");
    assert_eq!(store.transaction_count(), 4);
    assert_eq!(store.session_count(), 2);
}

#[test]
fn already_serializable_history_parses_with_no_init_transaction() {
    let log = "\
WRITE KEY[x] Txn(1, 1)
READ KEY[x] Txn(2, 1) From(1, 1)
";
    let store = parse_history(log).expect("should parse");
    assert!(store.init_transactions().is_empty());
}

#[test]
fn corrupt_log_with_an_unparseable_transaction_id_yields_zero_transactions() {
    // The only line in this file has a transaction-id literal whose session
    // field is empty, so it fails to match any record shape and is skipped
    // like any other unrecognized line -- leaving the stream with nothing
    // in it.
    let log = "WRITE KEY[x] Txn(, bar)\n";
    let err = parse_history(log).unwrap_err();
    assert_eq!(err, HistoryError::Empty);
}

#[test]
fn set_semantics_reduce_to_reads_and_writes_on_a_synthetic_key() {
    let log = "\
INSERT[a] to Set[q] Txn(1, 1)
CONTAINS[a] in Set[q] From(1, 1) Txn(2, 1)
DELETE[a] from Set[q] Txn(2, 2)
";
    let store = parse_history(log).expect("should parse");
    let key = Key::from("Set(q:a)");
    assert_eq!(store.write_history(&key).len(), 2);
    assert_eq!(store.read_history(&key).len(), 1);
    assert_eq!(store.transaction_count(), 2);
}

#[test]
fn comment_and_blank_lines_are_skipped_alongside_real_records() {
    let log = "\
// a log produced by some harness
WRITE KEY[x] Txn(1, 1)

READ KEY[x] Txn(2, 1) From(1, 1)
";
    let store = parse_history(log).expect("should parse");
    assert_eq!(store.transaction_count(), 2);
}
