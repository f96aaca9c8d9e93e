//! C3: Relation Builder.
//!
//! Emits, for every ordered pair of transactions, the defining equation of
//! each uninterpreted relation the Symbolic Context declared: the relation
//! holds iff one of its syntactically enumerated candidates holds. `hb` and
//! `ar` are expressed over `so`/`wr` by reference (`Formula::Rel`), never by
//! re-deriving their candidates — only this module ever builds `so`/`wrₖ`
//! candidates directly.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use crate::formula::{ConstraintBag, Formula, IntExpr, Symbol, Term};
use crate::history::{Event, HistoryStore, Key, TransactionId, WriteEvent};
use crate::symbolic::{boundary_fn, choice_fn, SymbolicContext};

/// `tx_in_boundary(t)` of §4.3: either `t`'s session is kept whole, or `t`'s
/// first event still falls before the cut.
#[must_use]
pub fn tx_in_boundary(ctx: SymbolicContext, store: &HistoryStore, tx: TransactionId) -> Formula {
    let session = store.session_of(tx);
    let whole_session = Formula::IntEq(
        boundary_fn(session),
        IntExpr::Const(i64::from(store.session_event_count(session)) + 1),
    );
    let first_seq = store.first_event_in_tx(tx);
    let straddles = ctx.event_in_boundary(store, Event::Write(WriteEvent { tx, seq: first_seq }));
    Formula::or(Vec::from([whole_session, straddles]))
}

/// so-candidates: `(T0, first_tx_of(s))` for each session `s` and each
/// synthesized initial transaction `T0`, plus `(prev, next)` within every
/// session.
fn so_candidates(store: &HistoryStore) -> HashSet<(TransactionId, TransactionId)> {
    let mut candidates = HashSet::new();
    for init_tx in store.init_transactions() {
        for (_, session) in store.sessions() {
            if let Some(&first) = session.transactions.first() {
                if first != *init_tx {
                    candidates.insert((*init_tx, first));
                }
            }
        }
    }
    for (_, session) in store.sessions() {
        for pair in session.transactions.windows(2) {
            candidates.insert((pair[0], pair[1]));
        }
    }
    candidates
}

/// Asserts the `so` defining equation for every pair of distinct
/// transactions, and `¬so(t,t)` for every transaction.
fn emit_so(store: &HistoryStore, bag: &mut ConstraintBag) {
    let candidates = so_candidates(store);
    tracing::trace!(candidates = candidates.len(), "so: candidates built");
    for t1 in store.transactions() {
        bag.assert(rel(Symbol::So, t1, t1).not());
        for t2 in store.transactions() {
            if t1 == t2 {
                continue;
            }
            let holds = candidates.contains(&(t1, t2));
            bag.assert(rel(Symbol::So, t1, t2).iff(Formula::Bool(holds)));
        }
    }
}

/// The index of `w` within `W[k]`, as `idx(w)` of §4.3.
fn write_index(store: &HistoryStore, key: &Key, tx: TransactionId) -> Option<i64> {
    store.write_index(key, tx).map(|i| i as i64)
}

/// Builds, per key, the `wrₖ` candidate disjunction for every `(t1, t2)`
/// pair that has at least one, and asserts the defining equations for
/// `wrₖ` and `wr` over every pair of distinct transactions.
fn emit_wr(ctx: SymbolicContext, store: &HistoryStore, bag: &mut ConstraintBag) {
    let keys: Vec<Key> = store.keys().cloned().collect();
    let mut per_key: HashMap<Key, HashMap<(TransactionId, TransactionId), Vec<Formula>>> =
        HashMap::new();

    for key in &keys {
        let writes = store.write_history(key);
        let reads = store.read_history(key);
        tracing::trace!(
            key = %key,
            writes = writes.len(),
            reads = reads.len(),
            "wr: building candidates for key"
        );
        let bucket = per_key.entry(key.clone()).or_default();

        for w in writes {
            let Some(idx) = write_index(store, key, w.tx) else {
                continue;
            };
            for r in reads {
                if r.tx == w.tx {
                    continue;
                }
                let read_event = Event::Read(*r);
                let on_boundary = ctx.event_on_boundary(store, read_event);
                let in_boundary = ctx.event_in_boundary(store, read_event);
                let chosen = Formula::IntEq(choice_fn(r.tx, r.seq), IntExpr::Const(idx));

                let candidate = if w.tx == r.from_tx && w.seq == r.from_seq {
                    Formula::or(Vec::from([
                        on_boundary.implies(chosen),
                        in_boundary,
                    ]))
                } else {
                    Formula::and(Vec::from([on_boundary, chosen]))
                };

                bucket.entry((w.tx, r.tx)).or_default().push(candidate);
            }
        }
    }

    for t1 in store.transactions() {
        bag.assert(rel(Symbol::Wr, t1, t1).not());
        for key in &keys {
            bag.assert(Formula::Rel(Symbol::WrK(key.clone()), Term::Tx(t1), Term::Tx(t1)).not());
        }
        for t2 in store.transactions() {
            if t1 == t2 {
                continue;
            }
            let mut wr_disjuncts = Vec::new();
            for key in &keys {
                let candidates = per_key
                    .get(key)
                    .and_then(|m| m.get(&(t1, t2)))
                    .cloned()
                    .unwrap_or_default();
                let defined = if candidates.is_empty() {
                    Formula::Bool(false)
                } else {
                    Formula::or(candidates)
                };
                bag.assert(
                    Formula::Rel(Symbol::WrK(key.clone()), Term::Tx(t1), Term::Tx(t2)).iff(defined),
                );
                wr_disjuncts.push(Formula::Rel(Symbol::WrK(key.clone()), Term::Tx(t1), Term::Tx(t2)));
            }
            let wr_defined = if wr_disjuncts.is_empty() {
                Formula::Bool(false)
            } else {
                Formula::or(wr_disjuncts)
            };
            bag.assert(rel(Symbol::Wr, t1, t2).iff(wr_defined));
        }
    }
}

/// `hb` one-step expansion of §4.3, emitted verbatim for the oracle to
/// fix-point.
fn emit_hb(store: &HistoryStore, bag: &mut ConstraintBag) {
    let txs: Vec<TransactionId> = store.transactions().collect();
    tracing::trace!(transactions = txs.len(), "hb: one-step expansion");
    for &t1 in &txs {
        bag.assert(rel(Symbol::Hb, t1, t1).not());
        for &t2 in &txs {
            if t1 == t2 {
                continue;
            }
            let mut via_t3 = Vec::new();
            for &t3 in &txs {
                if t3 == t1 || t3 == t2 {
                    continue;
                }
                via_t3.push(Formula::and(Vec::from([
                    rel(Symbol::Hb, t1, t3),
                    Formula::or(Vec::from([rel(Symbol::Wr, t3, t2), rel(Symbol::So, t3, t2)])),
                ])));
            }
            let rhs = Formula::or(Vec::from([
                rel(Symbol::Wr, t1, t2),
                rel(Symbol::So, t1, t2),
                Formula::or(via_t3),
            ]));
            bag.assert(rel(Symbol::Hb, t1, t2).iff(rhs));
        }
    }
}

/// Builds the `arₖ`/`ar` defining equations of §4.3.
fn emit_ar(ctx: SymbolicContext, store: &HistoryStore, bag: &mut ConstraintBag) {
    let keys: Vec<Key> = store.keys().cloned().collect();
    let mut per_key: HashMap<Key, HashMap<(TransactionId, TransactionId), Vec<Formula>>> =
        HashMap::new();

    for key in &keys {
        let writes = store.write_history(key);
        let reads = store.read_history(key);
        tracing::trace!(
            key = %key,
            writes = writes.len(),
            reads = reads.len(),
            "ar: building candidates for key"
        );
        let bucket = per_key.entry(key.clone()).or_default();

        for conflict in writes {
            for write in writes {
                if conflict.tx == write.tx {
                    continue;
                }
                for r in reads {
                    let candidate = Formula::and(Vec::from([
                        ctx.event_in_boundary(store, Event::Write(*conflict)),
                        tx_in_boundary(ctx, store, conflict.tx),
                        tx_in_boundary(ctx, store, r.tx),
                        tx_in_boundary(ctx, store, write.tx),
                        Formula::Rel(Symbol::WrK(key.clone()), Term::Tx(write.tx), Term::Tx(r.tx)),
                        rel(Symbol::Hb, conflict.tx, r.tx),
                    ]));
                    bucket
                        .entry((conflict.tx, write.tx))
                        .or_default()
                        .push(candidate);
                }
            }
        }
    }

    for t1 in store.transactions() {
        bag.assert(rel(Symbol::Ar, t1, t1).not());
        for t2 in store.transactions() {
            if t1 == t2 {
                continue;
            }
            let mut ar_disjuncts = Vec::new();
            for key in &keys {
                let candidates = per_key
                    .get(key)
                    .and_then(|m| m.get(&(t1, t2)))
                    .cloned()
                    .unwrap_or_default();
                let defined = if candidates.is_empty() {
                    Formula::Bool(false)
                } else {
                    Formula::or(candidates)
                };
                bag.assert(
                    Formula::Rel(Symbol::ArK(key.clone()), Term::Tx(t1), Term::Tx(t2)).iff(defined),
                );
                ar_disjuncts.push(Formula::Rel(Symbol::ArK(key.clone()), Term::Tx(t1), Term::Tx(t2)));
            }
            let ar_defined = if ar_disjuncts.is_empty() {
                Formula::Bool(false)
            } else {
                Formula::or(ar_disjuncts)
            };
            bag.assert(rel(Symbol::Ar, t1, t2).iff(ar_defined));
        }
    }
}

fn rel(symbol: Symbol, t1: TransactionId, t2: TransactionId) -> Formula {
    Formula::Rel(symbol, Term::Tx(t1), Term::Tx(t2))
}

/// Runs the whole relation-building pass (C3): `so`, `wrₖ`/`wr`, `hb`,
/// `arₖ`/`ar`, in that dependency order.
pub fn build(ctx: SymbolicContext, store: &HistoryStore, bag: &mut ConstraintBag) {
    tracing::debug!(
        transactions = store.transaction_count(),
        keys = store.keys().count(),
        "relations: building so/wr/hb/ar"
    );
    emit_so(store, bag);
    emit_wr(ctx, store, bag);
    emit_hb(store, bag);
    emit_ar(ctx, store, bag);
    tracing::debug!(assertions = bag.len(), "relations: done");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryStrategy;
    use crate::history::HistoryBuilder;

    #[test]
    fn so_links_init_tx_to_first_of_other_sessions_and_chains_within_session() {
        let mut b = HistoryBuilder::new();
        b.add_read("1", "1", "x", "0", "0");
        b.add_write("1", "2", "x", false);
        let store = b.finish().unwrap();

        let candidates = so_candidates(&store);
        let init = *store.init_transactions().iter().next().unwrap();
        let txs: Vec<_> = store.transactions().collect();
        let reader_tx = txs[0];
        let second_tx_same_session = txs[2];
        assert!(candidates.contains(&(init, reader_tx)));
        assert!(candidates.contains(&(reader_tx, second_tx_same_session)));
    }

    #[test]
    fn wr_disjoins_over_keys() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        b.add_read("2", "1", "x", "1", "1");
        let store = b.finish().unwrap();
        let ctx = SymbolicContext::new(BoundaryStrategy::Strict);
        let mut bag = ConstraintBag::new();
        emit_wr(ctx, &store, &mut bag);
        assert!(bag.len() > 0);
    }

    #[test]
    fn self_pairs_are_always_false() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        let store = b.finish().unwrap();
        let ctx = SymbolicContext::new(BoundaryStrategy::Strict);
        let mut bag = ConstraintBag::new();
        build(ctx, &store, &mut bag);
        let rendered = bag.render();
        assert!(rendered.contains("(not (Session-Order T0 T0))"));
        assert!(rendered.contains("(not (Write-Read T0 T0))"));
        assert!(rendered.contains("(not (Happens-Before T0 T0))"));
        assert!(rendered.contains("(not (Causal-Arbitration T0 T0))"));
    }
}
