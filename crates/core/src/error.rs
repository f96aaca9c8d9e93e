//! Crate-wide error type.
//!
//! `unsat` and `unknown` oracle results are not errors — see
//! [`crate::oracle::Outcome`] — only corrupt input, an oracle-reported I/O
//! problem at the caller's layer, and internal invariant violations are.

use alloc::string::String;

use derive_more::From;

use crate::history::HistoryError;

/// Something the encoder cannot recover from.
#[derive(Debug, From)]
pub enum Error {
    /// The history failed to build: see [`HistoryError`].
    History(HistoryError),
    /// A bug in the encoder: a symbol was referenced that the
    /// [`crate::symbolic::SymbolicContext`] never declared, or a computed
    /// index fell outside the range it was supposed to index into.
    Invariant(InvariantViolation),
}

/// An internal invariant violation — a defect in the encoder, never a
/// consequence of malformed input.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// What was violated, for diagnostics.
    pub message: String,
}

impl InvariantViolation {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::History(e) => write!(f, "corrupt input: {e}"),
            Self::Invariant(v) => write!(f, "internal invariant violation: {}", v.message),
        }
    }
}

impl core::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
