//! The transactional data model: sessions, transactions, events, and the
//! per-key write/read histories they populate.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// A data-store key. Set operations (`INSERT`/`CONTAINS`/`DELETE`) are
/// encoded by the parser as reads/writes on a synthesized key of the shape
/// `Set(<set>:<elem>)`; from here on they are ordinary keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub String);

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(String::from(s))
    }
}

/// A dense transaction handle. Assigned in first-appearance order, which
/// makes `TransactionId(n)` and `observed_co` the same sequence by
/// construction: the `n`-th transaction ever seen by the builder is
/// `TransactionId(n)` and has observed commit order `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u32);

impl TransactionId {
    #[must_use]
    pub const fn observed_co(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// A dense session handle, assigned in first-appearance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// The original `"<session_id>, <local_id>"` text a transaction was parsed
/// from, kept only so the result reconstructor can print the same label
/// back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionLabel {
    pub session: String,
    pub local: String,
}

impl fmt::Display for TransactionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.session, self.local)
    }
}

/// A write event: `WRITE KEY[<k>] Txn(<tx>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteEvent {
    pub tx: TransactionId,
    /// Session-relative sequence number, dense across the whole session.
    pub seq: u32,
}

/// A read event: `READ KEY[<k>] Txn(<tx>) From(<tx>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadEvent {
    pub tx: TransactionId,
    pub seq: u32,
    /// The transaction this read observed in the original execution.
    pub from_tx: TransactionId,
    /// The `seq` of the writer's write event on the same key.
    pub from_seq: u32,
}

/// Either half of an event, without its key (the key is implicit from the
/// per-key history it lives in) or its session-relative sequence number
/// (carried separately so both variants share one shape when iterated
/// together, e.g. by the result reconstructor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Read(ReadEvent),
    Write(WriteEvent),
}

impl Event {
    #[must_use]
    pub const fn tx(&self) -> TransactionId {
        match self {
            Self::Read(r) => r.tx,
            Self::Write(w) => w.tx,
        }
    }

    #[must_use]
    pub const fn seq(&self) -> u32 {
        match self {
            Self::Read(r) => r.seq,
            Self::Write(w) => w.seq,
        }
    }
}

/// A transaction: an ordered, contiguous run of events within one session.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub session: SessionId,
    pub label: Option<TransactionLabel>,
}

/// A session: a non-empty ordered sequence of transactions.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub label: String,
    pub transactions: Vec<TransactionId>,
}
