//! C2: Symbolic Context.
//!
//! Owns the boundary-predicate strategy knob and the two helpers every
//! encoder (C3–C6) builds its formulas through. The uninterpreted symbols
//! themselves (`so`, `wr`, `wrₖ`, …) are not materialized as Rust values —
//! they are named deterministically by [`crate::formula::Symbol`] and
//! referenced by every encoder through that shared naming scheme, per the
//! "symbols are created once, owned by the Symbolic Context, referenced
//! never copied" design note.

use alloc::vec::Vec;

use crate::config::BoundaryStrategy;
use crate::formula::{Formula, IntExpr, Term};
use crate::history::{Event, HistoryStore, TransactionId};

/// The symbol table and boundary-predicate strategy shared by every
/// encoder stage.
#[derive(Debug, Clone, Copy)]
pub struct SymbolicContext {
    boundary: BoundaryStrategy,
}

impl SymbolicContext {
    #[must_use]
    pub const fn new(boundary: BoundaryStrategy) -> Self {
        Self { boundary }
    }

    #[must_use]
    pub const fn boundary_strategy(self) -> BoundaryStrategy {
        self.boundary
    }

    /// `event_in_boundary(e)` of §4.2.
    #[must_use]
    pub fn event_in_boundary(self, store: &HistoryStore, event: Event) -> Formula {
        let session = store.session_of(event.tx());
        let boundary = boundary_fn(session);
        match self.boundary {
            BoundaryStrategy::Strict => lt(IntExpr::Const(i64::from(event.seq())), boundary),
            BoundaryStrategy::Relaxed => {
                let first = store.first_event_in_tx(event.tx());
                lt(IntExpr::Const(i64::from(first)), boundary)
            }
        }
    }

    /// `event_on_boundary(e)` of §4.2.
    #[must_use]
    pub fn event_on_boundary(self, store: &HistoryStore, event: Event) -> Formula {
        let session = store.session_of(event.tx());
        let boundary = boundary_fn(session);
        match self.boundary {
            BoundaryStrategy::Strict => Formula::IntEq(
                IntExpr::Const(i64::from(event.seq()) + 1),
                boundary,
            ),
            BoundaryStrategy::Relaxed => {
                let first = store.first_event_in_tx(event.tx());
                let count = store.transaction_event_count(event.tx());
                let upper = i64::from(first) + i64::from(count);
                Formula::and(Vec::from([
                    lt(IntExpr::Const(i64::from(first)), boundary.clone()),
                    le(boundary, IntExpr::Const(upper)),
                ]))
            }
        }
    }
}

/// `boundary[s]`.
pub(crate) fn boundary_fn(session: crate::history::SessionId) -> IntExpr {
    IntExpr::Fun(
        crate::formula::Symbol::Boundary,
        Vec::from([Term::Session(session)]),
    )
}

/// `choice[(t, seq)]`.
pub(crate) fn choice_fn(tx: TransactionId, seq: u32) -> IntExpr {
    IntExpr::Fun(crate::formula::Symbol::Choice, Vec::from([Term::Read(tx, seq)]))
}

pub(crate) fn lt(a: IntExpr, b: IntExpr) -> Formula {
    Formula::IntLt(a, b)
}

pub(crate) fn le(a: IntExpr, b: IntExpr) -> Formula {
    Formula::Or(Vec::from([
        Formula::IntLt(a.clone(), b.clone()),
        Formula::IntEq(a, b),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryBuilder;

    #[test]
    fn strict_in_boundary_compares_seq() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        let store = b.finish().unwrap();
        let ctx = SymbolicContext::new(BoundaryStrategy::Strict);
        let tx = store.transactions().next().unwrap();
        let event = store.events_of(tx)[0];
        let f = ctx.event_in_boundary(&store, event);
        assert_eq!(f.to_string(), "(< 0 (Boundary S0))");
    }

    #[test]
    fn strict_on_boundary_is_seq_plus_one_eq_boundary() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        let store = b.finish().unwrap();
        let ctx = SymbolicContext::new(BoundaryStrategy::Strict);
        let tx = store.transactions().next().unwrap();
        let event = store.events_of(tx)[0];
        let f = ctx.event_on_boundary(&store, event);
        assert_eq!(f.to_string(), "(= 1 (Boundary S0))");
    }
}
