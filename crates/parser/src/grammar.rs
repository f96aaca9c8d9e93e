//! Winnow combinator grammar for the log record shapes.
//!
//! ```text
//! record   = read | write | insert | contains | delete
//! read     = "READ KEY" bracketed WS txn("Txn") WS txn("From")
//! write    = "WRITE KEY" bracketed WS txn("Txn")
//! insert   = "INSERT" bracketed WS "to Set" bracketed WS txn("Txn")
//! contains = "CONTAINS" bracketed WS "in Set" bracketed WS txn("From") WS txn("Txn")
//! delete   = "DELETE" bracketed WS "from Set" bracketed WS txn("Txn")
//! bracketed = "[" [^\]]+ "]"
//! txn(tag) = tag "(" ident "," WS* ident ")"
//! ```
//!
//! Each line of the input is tried against `record` independently; a line
//! that matches none of the five shapes is unrecognized and skipped.

use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::{literal, take_while};
use winnow::ModalResult;

/// One transaction reference: `(session_id, local_id)`, both opaque strings.
pub type TxnRef = (String, String);

/// A single recognized log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Read {
        key: String,
        tx: TxnRef,
        from: TxnRef,
    },
    Write {
        key: String,
        tx: TxnRef,
    },
    Insert {
        elem: String,
        set: String,
        tx: TxnRef,
    },
    Contains {
        elem: String,
        set: String,
        from: TxnRef,
        tx: TxnRef,
    },
    Delete {
        elem: String,
        set: String,
        tx: TxnRef,
    },
}

fn inline_ws(input: &mut &str) -> ModalResult<()> {
    take_while(1.., |c: char| c == ' ' || c == '\t')
        .void()
        .parse_next(input)
}

fn opt_inline_ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c == ' ' || c == '\t')
        .void()
        .parse_next(input)
}

/// `"[" <anything but ']'>+ "]"`, returning the bracketed text verbatim.
fn bracketed(input: &mut &str) -> ModalResult<String> {
    literal("[").parse_next(input)?;
    let s = take_while(1.., |c: char| c != ']').parse_next(input)?;
    literal("]").parse_next(input)?;
    Ok(s.to_string())
}

/// One field of a transaction-id literal: non-empty, stops at `,` or `)`.
fn ident(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c != ',' && c != ')')
        .map(|s: &str| s.trim().to_string())
        .parse_next(input)
}

/// `<ident> "," WS* <ident>`, the transaction-id literal `"<session>, <local>"`.
fn txn_ref(input: &mut &str) -> ModalResult<TxnRef> {
    let session = ident.parse_next(input)?;
    literal(",").parse_next(input)?;
    opt_inline_ws.parse_next(input)?;
    let local = ident.parse_next(input)?;
    if session.is_empty() || local.is_empty() {
        return Err(winnow::error::ErrMode::Backtrack(
            winnow::error::ContextError::new(),
        ));
    }
    Ok((session, local))
}

/// `tag "(" txn_ref ")"`, e.g. `Txn(1, 2)` or `From(1, 2)`.
fn tagged_txn<'s>(tag: &'static str, input: &mut &'s str) -> ModalResult<TxnRef> {
    literal(tag).parse_next(input)?;
    literal("(").parse_next(input)?;
    let r = txn_ref.parse_next(input)?;
    literal(")").parse_next(input)?;
    Ok(r)
}

fn read_record(input: &mut &str) -> ModalResult<Record> {
    literal("READ KEY").parse_next(input)?;
    let key = bracketed.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let tx = tagged_txn("Txn", input)?;
    inline_ws.parse_next(input)?;
    let from = tagged_txn("From", input)?;
    Ok(Record::Read { key, tx, from })
}

fn write_record(input: &mut &str) -> ModalResult<Record> {
    literal("WRITE KEY").parse_next(input)?;
    let key = bracketed.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let tx = tagged_txn("Txn", input)?;
    Ok(Record::Write { key, tx })
}

fn insert_record(input: &mut &str) -> ModalResult<Record> {
    literal("INSERT").parse_next(input)?;
    let elem = bracketed.parse_next(input)?;
    inline_ws.parse_next(input)?;
    literal("to Set").parse_next(input)?;
    let set = bracketed.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let tx = tagged_txn("Txn", input)?;
    Ok(Record::Insert { elem, set, tx })
}

fn contains_record(input: &mut &str) -> ModalResult<Record> {
    literal("CONTAINS").parse_next(input)?;
    let elem = bracketed.parse_next(input)?;
    inline_ws.parse_next(input)?;
    literal("in Set").parse_next(input)?;
    let set = bracketed.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let from = tagged_txn("From", input)?;
    inline_ws.parse_next(input)?;
    let tx = tagged_txn("Txn", input)?;
    Ok(Record::Contains {
        elem,
        set,
        from,
        tx,
    })
}

fn delete_record(input: &mut &str) -> ModalResult<Record> {
    literal("DELETE").parse_next(input)?;
    let elem = bracketed.parse_next(input)?;
    inline_ws.parse_next(input)?;
    literal("from Set").parse_next(input)?;
    let set = bracketed.parse_next(input)?;
    inline_ws.parse_next(input)?;
    let tx = tagged_txn("Txn", input)?;
    Ok(Record::Delete { elem, set, tx })
}

fn record(input: &mut &str) -> ModalResult<Record> {
    alt((
        read_record,
        write_record,
        insert_record,
        contains_record,
        delete_record,
    ))
    .parse_next(input)
}

/// Parse one line (no leading/trailing whitespace concerns beyond what the
/// grammar itself consumes) into a record, or `None` if the line is not one
/// of the five recognized shapes -- unrecognized lines are skipped, not
/// reported as errors.
#[must_use]
pub fn parse_line(line: &str) -> Option<Record> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut stream: &str = trimmed;
    record.parse_next(&mut stream).ok().filter(|_| stream.is_empty())
}

/// Parse every line of `input`, discarding lines that do not match any
/// record shape.
#[must_use]
pub fn parse_records(input: &str) -> Vec<Record> {
    input.lines().filter_map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_read_record() {
        let r = parse_line("READ KEY[x] Txn(1, 1) From(0, 0)").unwrap();
        assert_eq!(
            r,
            Record::Read {
                key: "x".into(),
                tx: ("1".into(), "1".into()),
                from: ("0".into(), "0".into()),
            }
        );
    }

    #[test]
    fn parses_a_write_record() {
        let r = parse_line("WRITE KEY[y] Txn(2, 1)").unwrap();
        assert_eq!(
            r,
            Record::Write {
                key: "y".into(),
                tx: ("2".into(), "1".into()),
            }
        );
    }

    #[test]
    fn parses_an_insert_record() {
        let r = parse_line("INSERT[a] to Set[q] Txn(1, 1)").unwrap();
        assert_eq!(
            r,
            Record::Insert {
                elem: "a".into(),
                set: "q".into(),
                tx: ("1".into(), "1".into()),
            }
        );
    }

    #[test]
    fn parses_a_contains_record_with_from_before_txn() {
        let r = parse_line("CONTAINS[a] in Set[q] From(1, 1) Txn(2, 1)").unwrap();
        assert_eq!(
            r,
            Record::Contains {
                elem: "a".into(),
                set: "q".into(),
                from: ("1".into(), "1".into()),
                tx: ("2".into(), "1".into()),
            }
        );
    }

    #[test]
    fn parses_a_delete_record() {
        let r = parse_line("DELETE[a] from Set[q] Txn(2, 2)").unwrap();
        assert_eq!(
            r,
            Record::Delete {
                elem: "a".into(),
                set: "q".into(),
                tx: ("2".into(), "2".into()),
            }
        );
    }

    #[test]
    fn unrecognized_line_is_skipped() {
        assert_eq!(parse_line("// a comment that is not a record"), None);
        assert_eq!(parse_line("this is not a record at all"), None);
    }

    #[test]
    fn blank_line_is_skipped() {
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn txn_ref_with_empty_session_fails_and_the_whole_line_is_skipped() {
        assert_eq!(parse_line("WRITE KEY[x] Txn(, 1)"), None);
    }

    #[test]
    fn trailing_garbage_after_a_record_is_rejected() {
        assert_eq!(parse_line("WRITE KEY[x] Txn(1, 1) extra"), None);
    }

    #[test]
    fn parse_records_skips_unrecognized_lines_and_keeps_the_rest() {
        let input = "\
// header comment
WRITE KEY[x] Txn(1, 1)
nonsense
READ KEY[x] Txn(2, 1) From(1, 1)
";
        let records = parse_records(input);
        assert_eq!(records.len(), 2);
    }
}
