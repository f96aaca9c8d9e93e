//! C4: Boundary & Choice Encoder.
//!
//! Asserts the admissible values of `boundary[s]` (§4.4: a truncation cuts
//! immediately after a read, or keeps the session whole) and the admissible
//! values of `choice[(r.tx, r.seq)]` for every read (one of `W[k]`'s indices
//! whose write is itself in-boundary, never a write that is in the future of
//! the reader's own session).

use alloc::vec::Vec;

use crate::formula::{ConstraintBag, Formula, IntExpr};
use crate::history::HistoryStore;
use crate::symbolic::{boundary_fn, choice_fn, SymbolicContext};

/// `boundary[s] = session_event_count[s] + 1 ∨ ⋁_{e ∈ reads(s)} boundary[s] = e.seq + 1`.
fn emit_session_boundary(store: &HistoryStore, bag: &mut ConstraintBag) {
    for (session, _) in store.sessions() {
        let whole = Formula::IntEq(
            boundary_fn(session),
            IntExpr::Const(i64::from(store.session_event_count(session)) + 1),
        );
        let after_a_read = store
            .session_read_events(session)
            .iter()
            .map(|&seq| {
                Formula::IntEq(boundary_fn(session), IntExpr::Const(i64::from(seq) + 1))
            })
            .collect::<Vec<_>>();

        let mut disjuncts = Vec::with_capacity(after_a_read.len() + 1);
        disjuncts.push(whole);
        disjuncts.extend(after_a_read);
        bag.assert(Formula::or(disjuncts));
    }
}

/// For every read `r ∈ R[k]`: `choice[(r.tx,r.seq)]` names an in-boundary
/// write of `W[k]`, and never a write from later in `r`'s own session.
fn emit_read_choice(store: &HistoryStore, ctx: SymbolicContext, bag: &mut ConstraintBag) {
    for key in store.keys() {
        let writes = store.write_history(key);
        for r in store.read_history(key) {
            let choice = choice_fn(r.tx, r.seq);

            let mut candidates = Vec::with_capacity(writes.len());
            for (i, w) in writes.iter().enumerate() {
                let in_boundary = ctx.event_in_boundary(store, crate::history::Event::Write(*w));
                candidates.push(Formula::and(Vec::from([
                    Formula::IntEq(choice.clone(), IntExpr::Const(i as i64)),
                    in_boundary,
                ])));
            }
            bag.assert(Formula::or(candidates));

            let reader_session = store.session_of(r.tx);
            for (i, w) in writes.iter().enumerate() {
                let same_session = store.session_of(w.tx) == reader_session;
                if same_session && w.seq > r.seq {
                    bag.assert(
                        Formula::IntEq(choice.clone(), IntExpr::Const(i as i64)).not(),
                    );
                }
            }
        }
    }
}

/// Runs the whole boundary/choice pass (C4).
pub fn build(ctx: SymbolicContext, store: &HistoryStore, bag: &mut ConstraintBag) {
    emit_session_boundary(store, bag);
    emit_read_choice(store, ctx, bag);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryStrategy;
    use crate::history::HistoryBuilder;

    #[test]
    fn session_boundary_allows_whole_session_or_after_a_read() {
        let mut b = HistoryBuilder::new();
        b.add_read("1", "1", "x", "0", "0");
        b.add_write("1", "2", "y", false);
        let store = b.finish().unwrap();
        let mut bag = ConstraintBag::new();
        emit_session_boundary(&store, &mut bag);
        let rendered = bag.render();
        assert!(rendered.contains("(= (Boundary S0) 3)"));
        assert!(rendered.contains("(= (Boundary S0) 1)"));
    }

    #[test]
    fn read_choice_excludes_future_writes_in_own_session() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        b.add_read("1", "2", "x", "1", "1");
        b.add_write("1", "3", "x", false);
        let store = b.finish().unwrap();
        let ctx = SymbolicContext::new(BoundaryStrategy::Strict);
        let mut bag = ConstraintBag::new();
        emit_read_choice(&store, ctx, &mut bag);
        let rendered = bag.render();
        assert!(rendered.contains("(not (= (Choice"));
    }
}
