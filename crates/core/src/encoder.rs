//! Drives the whole pipeline end to end: C1 (already built by the caller)
//! → C2 → {C3, C4} → C5 → C6 → the injected [`Oracle`] → C7.

use crate::config::{Config, UnserializabilityShape};
use crate::formula::ConstraintBag;
use crate::history::HistoryStore;
use crate::oracle::{Oracle, Outcome};
use crate::reconstruct::{self, PredictedHistory};
use crate::symbolic::SymbolicContext;
use crate::{axioms, boundary, relations, unserializable};

/// The outcome of one `predict` invocation: the oracle's verdict, plus the
/// reconstructed history when it was `sat` (§4.7, §7).
#[derive(Debug, Clone, PartialEq)]
pub enum PredictResult {
    Unserializable(PredictedHistory),
    AlreadySerializable,
    Unknown,
}

/// Owns one analysis invocation's configuration and assembles its
/// constraint bag; stateless otherwise (§5: purely functional over the
/// history store after construction).
#[derive(Debug, Clone)]
pub struct Encoder {
    config: Config,
}

impl Encoder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the full constraint bag (C2–C6) for `store` under this
    /// encoder's configuration, without calling the oracle.
    #[must_use]
    pub fn build_constraints(&self, store: &HistoryStore) -> ConstraintBag {
        let ctx = SymbolicContext::new(self.config.strategy.boundary());
        let mut bag = ConstraintBag::new();

        relations::build(ctx, store, &mut bag);
        boundary::build(ctx, store, &mut bag);
        axioms::build(ctx, self.config.level, store, &mut bag);

        match self.config.strategy.unserializability() {
            UnserializabilityShape::Full => unserializable::build_full(ctx, store, &mut bag),
            UnserializabilityShape::Express => unserializable::build_express(ctx, store, &mut bag),
        }

        bag
    }

    /// Runs the whole pipeline: builds the constraint bag, calls `oracle`,
    /// and reconstructs the predicted history on `sat` (§4.7).
    pub fn predict(&self, store: &HistoryStore, oracle: &mut dyn Oracle) -> PredictResult {
        let bag = self.build_constraints(store);
        let ctx = SymbolicContext::new(self.config.strategy.boundary());

        match oracle.check(&bag.into_formula(), self.config.oracle_timeout) {
            Outcome::Sat(model) => {
                PredictResult::Unserializable(reconstruct::reconstruct(&model, store, ctx))
            }
            Outcome::Unsat => PredictResult::AlreadySerializable,
            Outcome::Unknown => PredictResult::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IsolationLevel, Strategy};
    use crate::history::HistoryBuilder;
    use crate::oracle::{Model, StubOracle};

    #[test]
    fn unknown_oracle_result_never_reconstructs() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        let store = b.finish().unwrap();
        let encoder = Encoder::new(Config {
            level: IsolationLevel::Causal,
            strategy: Strategy::Full,
            ..Config::default()
        });
        let mut oracle = crate::oracle::NullOracle;
        let result = encoder.predict(&store, &mut oracle);
        assert_eq!(result, PredictResult::Unknown);
    }

    #[test]
    fn unsat_oracle_result_reports_already_serializable() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        let store = b.finish().unwrap();
        let encoder = Encoder::new(Config::default());
        let mut oracle = StubOracle::new(crate::oracle::Outcome::Unsat);
        let result = encoder.predict(&store, &mut oracle);
        assert_eq!(result, PredictResult::AlreadySerializable);
    }

    #[test]
    fn sat_oracle_result_reconstructs_a_predicted_history() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        let store = b.finish().unwrap();
        let encoder = Encoder::new(Config::default());
        let mut oracle = StubOracle::new(crate::oracle::Outcome::Sat(Model::new()));
        let result = encoder.predict(&store, &mut oracle);
        assert!(matches!(result, PredictResult::Unserializable(_)));
    }
}
