//! Log-grammar parser: turns the external record format into a
//! [`predicate_core::HistoryStore`].
//!
//! `INSERT`/`CONTAINS`/`DELETE` are not given their own place in the history
//! model -- they are folded into ordinary writes/reads on a synthesized key
//! `Set(<set>:<elem>)` before ever reaching [`predicate_core::HistoryBuilder`],
//! so the core crate never has to know sets exist.

pub mod error;
pub mod grammar;

use std::path::Path;

pub use error::ParseError;
pub use grammar::{parse_line, parse_records, Record, TxnRef};
use predicate_core::{HistoryBuilder, HistoryStore};

fn set_key(set: &str, elem: &str) -> String {
    format!("Set({set}:{elem})")
}

fn apply(builder: &mut HistoryBuilder, record: Record) {
    match record {
        Record::Read { key, tx, from } => {
            builder.add_read(&tx.0, &tx.1, key, &from.0, &from.1);
        }
        Record::Write { key, tx } => {
            builder.add_write(&tx.0, &tx.1, key, false);
        }
        Record::Insert { elem, set, tx } => {
            builder.add_write(&tx.0, &tx.1, set_key(&set, &elem), false);
        }
        Record::Contains {
            elem,
            set,
            from,
            tx,
        } => {
            builder.add_read(&tx.0, &tx.1, set_key(&set, &elem), &from.0, &from.1);
        }
        Record::Delete { elem, set, tx } => {
            builder.add_write(&tx.0, &tx.1, set_key(&set, &elem), false);
        }
    }
}

/// Parse a log's text into a [`HistoryStore`], or report that it was corrupt
/// (the record stream yielded zero transactions).
///
/// # Errors
///
/// Returns [`predicate_core::history::HistoryError`] when the log contains
/// no recognized records.
pub fn parse_history(
    input: &str,
) -> Result<HistoryStore, predicate_core::history::HistoryError> {
    let mut builder = HistoryBuilder::new();
    for record in parse_records(input) {
        apply(&mut builder, record);
    }
    builder.finish()
}

/// Read `path` and parse it into a [`HistoryStore`].
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the file cannot be read, or
/// [`ParseError::Corrupt`] if it parses to zero transactions.
pub fn parse_history_file(path: &Path) -> Result<HistoryStore, ParseError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_history(&text)?)
}
