//! The black-box SAT/SMT boundary (§6): this crate builds a [`crate::formula::Formula`]
//! and hands it to whatever implements [`Oracle`]. No decision procedure
//! ships here — callers inject one, or use [`NullOracle`] to exercise the
//! pipeline up to (but not through) a real solve.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::formula::{Formula, Symbol, Term};
use crate::history::TransactionId;

/// One declared constant or function's value in a satisfying model,
/// evaluated over the parsed transactions (§6: "a total model").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Model {
    int_values: HashMap<(Symbol, Vec<Term>), i64>,
    bool_values: HashMap<(Symbol, Term, Term), bool>,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_int(&mut self, symbol: Symbol, args: Vec<Term>, value: i64) {
        self.int_values.insert((symbol, args), value);
    }

    pub fn set_bool(&mut self, symbol: Symbol, t1: Term, t2: Term, value: bool) {
        self.bool_values.insert((symbol, t1, t2), value);
    }

    #[must_use]
    pub fn int(&self, symbol: &Symbol, args: &[Term]) -> Option<i64> {
        self.int_values
            .get(&(symbol.clone(), args.to_vec()))
            .copied()
    }

    #[must_use]
    pub fn boolean(&self, symbol: &Symbol, t1: &Term, t2: &Term) -> Option<bool> {
        self.bool_values
            .get(&(symbol.clone(), t1.clone(), t2.clone()))
            .copied()
    }

    /// Evaluates a relation application directly against the model, per the
    /// `Rel`/`IntEq`/`IntLt` atoms an encoder actually emits. Returns `None`
    /// if the model has no entry for an atom this asks about — it is the
    /// caller's job to only query atoms the oracle actually reported.
    #[must_use]
    pub fn holds(&self, relation: Symbol, t1: TransactionId, t2: TransactionId) -> Option<bool> {
        self.boolean(&relation, &Term::Tx(t1), &Term::Tx(t2))
    }
}

/// The oracle's verdict on a constraint bag (§6, §7).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Sat(Model),
    Unsat,
    /// Timeout or incompleteness; no model, no history file (§7).
    Unknown,
}

impl Outcome {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sat(_) => "sat",
            Self::Unsat => "unsat",
            Self::Unknown => "unknown",
        }
    }
}

/// The boundary this crate calls out through. An implementation owns
/// whatever SMT/SAT backend it wants; this crate only needs `check` to
/// respect the configured timeout and never panic on a well-formed formula.
pub trait Oracle {
    fn check(&mut self, formula: &Formula, timeout: core::time::Duration) -> Outcome;
}

/// Always reports `unknown`, emitting no model. Lets the pipeline (parse →
/// encode → reconstruct) be exercised end to end without a real solver
/// backing it, and is the CLI's default when no other oracle is wired in.
#[derive(Debug, Default)]
pub struct NullOracle;

impl Oracle for NullOracle {
    fn check(&mut self, _formula: &Formula, _timeout: core::time::Duration) -> Outcome {
        Outcome::Unknown
    }
}

/// A test-only oracle that returns a pre-built [`Model`] without inspecting
/// the formula at all — useful for exercising the result reconstructor (C7)
/// in isolation from any real solve.
#[derive(Debug)]
pub struct StubOracle {
    outcome: Outcome,
}

impl StubOracle {
    #[must_use]
    pub const fn new(outcome: Outcome) -> Self {
        Self { outcome }
    }
}

impl Oracle for StubOracle {
    fn check(&mut self, _formula: &Formula, _timeout: core::time::Duration) -> Outcome {
        self.outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_oracle_always_reports_unknown() {
        let mut oracle = NullOracle;
        let outcome = oracle.check(&Formula::Bool(true), core::time::Duration::from_secs(1));
        assert_eq!(outcome, Outcome::Unknown);
    }

    #[test]
    fn stub_oracle_replays_its_configured_outcome() {
        let mut model = Model::new();
        model.set_int(Symbol::Boundary, Vec::from([Term::Session(crate::history::SessionId(0))]), 2);
        let mut oracle = StubOracle::new(Outcome::Sat(model));
        let outcome = oracle.check(&Formula::Bool(true), core::time::Duration::from_secs(1));
        match outcome {
            Outcome::Sat(m) => {
                assert_eq!(
                    m.int(&Symbol::Boundary, &[Term::Session(crate::history::SessionId(0))]),
                    Some(2)
                );
            }
            _ => panic!("expected sat"),
        }
    }
}
