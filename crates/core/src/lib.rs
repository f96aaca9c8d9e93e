//! Predictive serializability analysis for transactional histories executed
//! under a weak isolation level.
//!
//! Given an in-memory [`history::HistoryStore`] — sessions of transactions,
//! each a sequence of key-value reads and writes — this crate builds a single
//! first-order formula (uninterpreted Booleans and integers, see
//! [`formula::Formula`]) whose satisfying model encodes an alternative
//! execution that (a) still satisfies a target weak isolation level and (b)
//! is *not* serializable. The formula is handed to an injected [`oracle::Oracle`]
//! implementation; this crate does not ship a decision procedure.
//!
//! Pipeline: [`history`] → [`symbolic`] → {[`relations`], [`boundary`]} →
//! [`axioms`] → [`unserializable`] → oracle → [`reconstruct`]. The
//! [`encoder`] module drives the whole pipeline end to end.

#![cfg_attr(not(any(test, feature = "schemars")), no_std)]

extern crate alloc;

pub mod axioms;
pub mod boundary;
pub mod config;
pub mod encoder;
pub mod error;
pub mod formula;
pub mod history;
pub mod oracle;
pub mod reconstruct;
pub mod relations;
pub mod symbolic;
pub mod unserializable;

pub use config::{Config, IsolationLevel, Strategy};
pub use encoder::{Encoder, PredictResult};
pub use error::Error;
pub use history::{HistoryBuilder, HistoryStore};
pub use oracle::{Model, Oracle, Outcome};
pub use reconstruct::PredictedHistory;
