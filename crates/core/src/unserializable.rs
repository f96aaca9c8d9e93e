//! C6: Unserializability Encoder.
//!
//! Introduces a fresh serial commit order `co_S` and asserts that no such
//! order exists consistent with `wr ∨ so ∨ ww` — i.e. the predicted history
//! is *not* serializable. Two equi-satisfiable shapes are offered (§4.6):
//! `Full` states the non-existence as a literal negation; `Express` replaces
//! the existential with a `rank`/`reachable` fixed point and asserts a cycle
//! in the serialization graph directly.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::formula::{ConstraintBag, Formula, IntExpr, Symbol, Term};
use crate::history::{HistoryStore, Key, TransactionId};
use crate::symbolic::SymbolicContext;
use crate::relations::tx_in_boundary;

fn rel(symbol: Symbol, t1: TransactionId, t2: TransactionId) -> Formula {
    Formula::Rel(symbol, Term::Tx(t1), Term::Tx(t2))
}

fn co_s(tx: TransactionId) -> IntExpr {
    IntExpr::Fun(Symbol::CommitOrder(String::from("Serial")), Vec::from([Term::Tx(tx)]))
}

fn rank(t1: TransactionId, t2: TransactionId) -> IntExpr {
    IntExpr::Fun(Symbol::Rank, Vec::from([Term::Tx(t1), Term::Tx(t2)]))
}

/// Builds, per key, the `wwₖ` candidates shared by both shapes: for each
/// ordered pair `(conflict, w)` of `k`'s writers, one candidate per reader
/// of `k` that observed `w` while `conflict` is still in-boundary.
fn ww_candidates(
    ctx: SymbolicContext,
    store: &HistoryStore,
    key: &Key,
    order: impl Fn(TransactionId, TransactionId, TransactionId) -> Formula,
) -> HashMap<(TransactionId, TransactionId), Vec<Formula>> {
    let mut candidates: HashMap<(TransactionId, TransactionId), Vec<Formula>> = HashMap::new();
    let writers = store.write_history(key);
    let readers = store.read_history(key);
    tracing::trace!(
        key = %key,
        writers = writers.len(),
        readers = readers.len(),
        "ww: building candidates for key"
    );

    for conflict in writers {
        for w in writers {
            if conflict.tx == w.tx {
                continue;
            }
            for r in readers {
                let candidate = Formula::and(Vec::from([
                    ctx.event_in_boundary(store, crate::history::Event::Write(*conflict)),
                    tx_in_boundary(ctx, store, conflict.tx),
                    tx_in_boundary(ctx, store, w.tx),
                    tx_in_boundary(ctx, store, r.tx),
                    Formula::Rel(Symbol::WrK(key.clone()), Term::Tx(w.tx), Term::Tx(r.tx)),
                    order(conflict.tx, w.tx, r.tx),
                ]));
                candidates
                    .entry((conflict.tx, w.tx))
                    .or_default()
                    .push(candidate);
            }
        }
    }
    candidates
}

fn emit_ww(
    ctx: SymbolicContext,
    store: &HistoryStore,
    bag: &mut ConstraintBag,
    order: impl Fn(TransactionId, TransactionId, TransactionId) -> Formula + Copy,
) {
    let keys: Vec<Key> = store.keys().cloned().collect();
    let per_key: Vec<_> = keys
        .iter()
        .map(|k| (k.clone(), ww_candidates(ctx, store, k, order)))
        .collect();

    for t1 in store.transactions() {
        for t2 in store.transactions() {
            if t1 == t2 {
                continue;
            }
            let mut ww_disjuncts = Vec::new();
            for (key, candidates) in &per_key {
                let defined = candidates
                    .get(&(t1, t2))
                    .cloned()
                    .map_or(Formula::Bool(false), Formula::or);
                bag.assert(
                    Formula::Rel(Symbol::WwK(key.clone()), Term::Tx(t1), Term::Tx(t2)).iff(defined),
                );
                ww_disjuncts.push(Formula::Rel(Symbol::WwK(key.clone()), Term::Tx(t1), Term::Tx(t2)));
            }
            let ww_defined = if ww_disjuncts.is_empty() {
                Formula::Bool(false)
            } else {
                Formula::or(ww_disjuncts)
            };
            bag.assert(rel(Symbol::Ww, t1, t2).iff(ww_defined));
        }
    }
}

/// Full form (§4.6): asserts the serialization axiom over a literal fresh
/// `co_S`, then negates its existence by asserting `Distinct(co_S)` together
/// with the axioms — an unsatisfiable `co_S` means no serial order exists.
pub fn build_full(ctx: SymbolicContext, store: &HistoryStore, bag: &mut ConstraintBag) {
    tracing::debug!(transactions = store.transaction_count(), "unserializable: full form");
    emit_ww(ctx, store, bag, |conflict, _w, r| {
        Formula::IntLt(co_s(conflict), co_s(r))
    });

    let txs: Vec<TransactionId> = store.transactions().collect();
    bag.assert(Formula::Distinct(txs.iter().map(|&t| co_s(t)).collect()));

    for &t1 in &txs {
        for &t2 in &txs {
            if t1 == t2 {
                continue;
            }
            let trigger = Formula::or(Vec::from([
                rel(Symbol::Wr, t1, t2),
                rel(Symbol::So, t1, t2),
                rel(Symbol::Ww, t1, t2),
            ]));
            bag.assert(trigger.implies(Formula::IntLt(co_s(t1), co_s(t2))));
        }
    }
}

/// Express form (§4.6): `rank`-bounded `ww`/`rw` and a `reachable` fixed
/// point replace the existential `co_S`; the encoder asserts a cycle in
/// `reachable` directly.
pub fn build_express(ctx: SymbolicContext, store: &HistoryStore, bag: &mut ConstraintBag) {
    let txs: Vec<TransactionId> = store.transactions().collect();
    let bound = (txs.len() as i64) * (txs.len() as i64);
    tracing::debug!(transactions = txs.len(), bound, "unserializable: express form");

    for &t1 in &txs {
        for &t2 in &txs {
            if t1 == t2 {
                continue;
            }
            bag.assert(Formula::and(Vec::from([
                Formula::IntLt(IntExpr::Const(-1), rank(t1, t2)),
                Formula::IntLt(rank(t1, t2), IntExpr::Const(bound)),
            ])));
        }
    }

    emit_ww(ctx, store, bag, |conflict, w, r| {
        Formula::and(Vec::from([
            Formula::IntLt(rank(conflict, r), rank(conflict, w)),
            rel(Symbol::Reachable, conflict, r),
        ]))
    });

    emit_rw(ctx, store, bag);

    for &t1 in &txs {
        bag.assert(rel(Symbol::Reachable, t1, t1).not());
        for &t2 in &txs {
            if t1 == t2 {
                continue;
            }
            let direct = Formula::or(Vec::from([
                rel(Symbol::Hb, t1, t2),
                rel(Symbol::Ar, t1, t2),
                rel(Symbol::Ww, t1, t2),
                rel(Symbol::Rw, t1, t2),
            ]));
            let mut via_t3 = Vec::new();
            for &t3 in &txs {
                if t3 == t1 || t3 == t2 {
                    continue;
                }
                let t3_edge = Formula::or(Vec::from([
                    rel(Symbol::Hb, t3, t2),
                    rel(Symbol::Ar, t3, t2),
                    rel(Symbol::Ww, t3, t2),
                    rel(Symbol::Rw, t3, t2),
                ]));
                via_t3.push(Formula::and(Vec::from([
                    rel(Symbol::Reachable, t1, t3),
                    Formula::IntLt(rank(t1, t3), rank(t1, t2)),
                    Formula::IntLt(rank(t3, t2), rank(t1, t2)),
                    t3_edge,
                ])));
            }
            let rhs = Formula::or(Vec::from([direct, Formula::or(via_t3)]));
            bag.assert(rel(Symbol::Reachable, t1, t2).iff(rhs));
        }
    }

    let mut cycle = Vec::new();
    for &t1 in &txs {
        for &t2 in &txs {
            if t1 == t2 {
                continue;
            }
            cycle.push(Formula::and(Vec::from([
                rel(Symbol::Reachable, t1, t2),
                rel(Symbol::Reachable, t2, t1),
            ])));
        }
    }
    tracing::debug!(assertions = bag.len(), "unserializable: express form done");
    bag.assert(Formula::or(cycle));
}

/// `rwₖ`/`rw` candidates of §4.6's Express form.
fn emit_rw(ctx: SymbolicContext, store: &HistoryStore, bag: &mut ConstraintBag) {
    let keys: Vec<Key> = store.keys().cloned().collect();
    let mut per_key: HashMap<Key, HashMap<(TransactionId, TransactionId), Vec<Formula>>> =
        HashMap::new();

    for key in &keys {
        let writers = store.write_history(key);
        let readers = store.read_history(key);
        tracing::trace!(
            key = %key,
            writers = writers.len(),
            readers = readers.len(),
            "rw: building candidates for key"
        );
        let bucket = per_key.entry(key.clone()).or_default();

        for read in readers {
            for conflict in writers {
                for write in writers {
                    let candidate = Formula::and(Vec::from([
                        ctx.event_in_boundary(store, crate::history::Event::Write(*conflict)),
                        tx_in_boundary(ctx, store, conflict.tx),
                        tx_in_boundary(ctx, store, write.tx),
                        tx_in_boundary(ctx, store, read.tx),
                        Formula::Rel(Symbol::WrK(key.clone()), Term::Tx(write.tx), Term::Tx(read.tx)),
                        Formula::IntLt(rank(write.tx, conflict.tx), rank(read.tx, conflict.tx)),
                        rel(Symbol::Reachable, write.tx, conflict.tx),
                    ]));
                    bucket
                        .entry((read.tx, conflict.tx))
                        .or_default()
                        .push(candidate);
                }
            }
        }
    }

    for t1 in store.transactions() {
        for t2 in store.transactions() {
            if t1 == t2 {
                continue;
            }
            let mut rw_disjuncts = Vec::new();
            for key in &keys {
                let defined = per_key
                    .get(key)
                    .and_then(|m| m.get(&(t1, t2)))
                    .cloned()
                    .map_or(Formula::Bool(false), Formula::or);
                bag.assert(
                    Formula::Rel(Symbol::RwK(key.clone()), Term::Tx(t1), Term::Tx(t2)).iff(defined),
                );
                rw_disjuncts.push(Formula::Rel(Symbol::RwK(key.clone()), Term::Tx(t1), Term::Tx(t2)));
            }
            let rw_defined = if rw_disjuncts.is_empty() {
                Formula::Bool(false)
            } else {
                Formula::or(rw_disjuncts)
            };
            bag.assert(rel(Symbol::Rw, t1, t2).iff(rw_defined));
        }
    }
}
