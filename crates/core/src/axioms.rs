//! C5: Isolation Axiom Encoder.
//!
//! Introduces the per-level commit-order function `co_W` and asserts the
//! inequalities the target [`crate::config::IsolationLevel`] requires of it.
//! `wr`/`so` constrain `co_W` at every level; `ar` additionally constrains it
//! under Causal Consistency, and the Read Committed "no two keys read from
//! an overtaken writer" rule constrains it under Read Committed.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::IsolationLevel;
use crate::formula::{ConstraintBag, Formula, IntExpr, Symbol, Term};
use crate::history::{Event, HistoryStore, TransactionId};
use crate::symbolic::{choice_fn, SymbolicContext};

fn co_w(level: IsolationLevel, tx: TransactionId) -> IntExpr {
    let label = match level {
        IsolationLevel::Causal => String::from("Causal"),
        IsolationLevel::ReadCommitted => String::from("ReadCommitted"),
    };
    IntExpr::Fun(Symbol::CommitOrder(label), Vec::from([Term::Tx(tx)]))
}

fn rel(symbol: Symbol, t1: TransactionId, t2: TransactionId) -> Formula {
    Formula::Rel(symbol, Term::Tx(t1), Term::Tx(t2))
}

/// `Distinct` over `co_W` across every parsed transaction, and the
/// level-independent `wr`/`so` inequalities.
fn emit_common(level: IsolationLevel, store: &HistoryStore, bag: &mut ConstraintBag) {
    let txs: Vec<TransactionId> = store.transactions().collect();
    bag.assert(Formula::Distinct(
        txs.iter().map(|&t| co_w(level, t)).collect(),
    ));

    for &t1 in &txs {
        for &t2 in &txs {
            if t1 == t2 {
                continue;
            }
            let lt = Formula::IntLt(co_w(level, t1), co_w(level, t2));
            bag.assert(rel(Symbol::Wr, t1, t2).implies(lt.clone()));
            bag.assert(rel(Symbol::So, t1, t2).implies(lt));
        }
    }
}

fn emit_causal(store: &HistoryStore, bag: &mut ConstraintBag) {
    let txs: Vec<TransactionId> = store.transactions().collect();
    for &t1 in &txs {
        for &t2 in &txs {
            if t1 == t2 {
                continue;
            }
            bag.assert(
                rel(Symbol::Ar, t1, t2)
                    .implies(Formula::IntLt(co_w(IsolationLevel::Causal, t1), co_w(IsolationLevel::Causal, t2))),
            );
        }
    }
}

/// Read Committed's extra rule (§4.5): if `r1` reads `t1` on key `k`, and
/// some earlier read in the same transaction as `r1` read `t2` on its own
/// key, then `t2` must not have been overtaken by `t1` in commit order.
fn emit_read_committed(ctx: SymbolicContext, store: &HistoryStore, bag: &mut ConstraintBag) {
    for key in store.keys() {
        let writers: Vec<TransactionId> = store
            .write_history(key)
            .iter()
            .map(|w| w.tx)
            .collect();
        tracing::trace!(key = %key, writers = writers.len(), "read-committed: scanning key");

        for &t1 in &writers {
            for &t2 in &writers {
                if t1 == t2 {
                    continue;
                }
                for r1 in store.read_history(key) {
                    let earlier_sibling_read_from_t2 = store.keys().any(|other_key| {
                        other_key != key
                            && store.read_history(other_key).iter().any(|r| {
                                r.tx == r1.tx && r.seq < r1.seq && r.from_tx == t2
                            })
                    });
                    if !earlier_sibling_read_from_t2 {
                        continue;
                    }

                    let a = reads_from_candidate(ctx, store, key, t1, r1.tx, r1.seq);
                    bag.assert(a.implies(Formula::IntLt(
                        co_w(IsolationLevel::ReadCommitted, t2),
                        co_w(IsolationLevel::ReadCommitted, t1),
                    )));
                }
            }
        }
    }
}

/// The boundary-guarded "`r` reads from `t1` on `key`" disjunction that
/// underlies both `wrₖ` (§4.3) and this level's `A` (§4.5), recomputed here
/// rather than referencing the `WrK` symbol directly so it can be keyed to
/// one specific writer rather than disjoined over every write of `t1`.
fn reads_from_candidate(
    ctx: SymbolicContext,
    store: &HistoryStore,
    key: &crate::history::Key,
    writer: TransactionId,
    reader_tx: TransactionId,
    reader_seq: u32,
) -> Formula {
    let Some(idx) = store.write_index(key, writer) else {
        return Formula::Bool(false);
    };
    let read_event = store
        .read_history(key)
        .iter()
        .find(|r| r.tx == reader_tx && r.seq == reader_seq)
        .copied()
        .map(Event::Read);
    let Some(read_event) = read_event else {
        return Formula::Bool(false);
    };
    let on_boundary = ctx.event_on_boundary(store, read_event);
    let in_boundary = ctx.event_in_boundary(store, read_event);
    let chosen = Formula::IntEq(choice_fn(reader_tx, reader_seq), IntExpr::Const(idx as i64));

    if let Event::Read(r) = read_event {
        if r.from_tx == writer {
            return Formula::or(Vec::from([on_boundary.implies(chosen), in_boundary]));
        }
    }
    Formula::and(Vec::from([on_boundary, chosen]))
}

/// Runs the whole isolation-axiom pass (C5) for `level`.
pub fn build(ctx: SymbolicContext, level: IsolationLevel, store: &HistoryStore, bag: &mut ConstraintBag) {
    tracing::debug!(?level, transactions = store.transaction_count(), "axioms: building");
    emit_common(level, store, bag);
    match level {
        IsolationLevel::Causal => emit_causal(store, bag),
        IsolationLevel::ReadCommitted => emit_read_committed(ctx, store, bag),
    }
    tracing::debug!(assertions = bag.len(), "axioms: done");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryStrategy;
    use crate::history::HistoryBuilder;

    #[test]
    fn commit_order_values_are_asserted_distinct() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        b.add_write("2", "1", "y", false);
        let store = b.finish().unwrap();
        let mut bag = ConstraintBag::new();
        emit_common(IsolationLevel::Causal, &store, &mut bag);
        assert!(bag.render().contains("(distinct"));
    }

    #[test]
    fn causal_level_constrains_ar() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        b.add_write("2", "1", "x", false);
        let store = b.finish().unwrap();
        let ctx = SymbolicContext::new(BoundaryStrategy::Strict);
        let mut bag = ConstraintBag::new();
        build(ctx, IsolationLevel::Causal, &store, &mut bag);
        assert!(bag.render().contains("Causal-Arbitration"));
    }
}
