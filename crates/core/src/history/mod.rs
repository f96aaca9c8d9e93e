//! C1: History Store.

mod store;
mod types;

pub use store::{HistoryBuilder, HistoryError, HistoryStore};
pub use types::{
    Event, Key, ReadEvent, Session, SessionId, Transaction, TransactionId, TransactionLabel,
    WriteEvent,
};
