//! The parser crate's error type: I/O failure reading a log file, or a
//! corrupt history (zero transactions) discovered once the builder is
//! finished.

use std::fmt;
use std::io;

use derive_more::From;
use predicate_core::history::HistoryError;

/// Everything that can go wrong turning a log file into a [`predicate_core::HistoryStore`].
#[derive(Debug, From)]
pub enum ParseError {
    /// The log file could not be read.
    Io(io::Error),
    /// The record stream yielded zero transactions.
    Corrupt(HistoryError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "could not read log file: {e}"),
            Self::Corrupt(e) => write!(f, "corrupt log: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Corrupt(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_variant_displays_the_underlying_history_error() {
        let err = ParseError::Corrupt(HistoryError::Empty);
        assert!(err.to_string().contains("corrupt log"));
    }
}
