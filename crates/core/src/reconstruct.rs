//! C7: Result Reconstructor.
//!
//! Runs only on `sat` (§4.7, §7: never on `unsat`/`unknown`). Reads the
//! oracle's [`crate::oracle::Model`] back against the [`HistoryStore`] and
//! produces the predicted history: a per-session truncation, reads rewritten
//! to their chosen writer, and a transaction order that is `observed_co` for
//! the kept interior of each session and the model's own commit order for
//! the transaction straddling the cut.

use alloc::vec::Vec;

use crate::formula::{Symbol, Term};
use crate::history::{Event, HistoryStore, Key, ReadEvent, SessionId, TransactionId};
use crate::oracle::Model;
use crate::symbolic::SymbolicContext;

/// A read whose rewritten writer differs from the one it originally
/// observed, reported in the console diff of §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenRead {
    pub key: Key,
    pub tx: TransactionId,
    pub seq: u32,
    pub original_writer: TransactionId,
    pub new_writer: TransactionId,
}

/// The predicted history (§4.7, §6): an ordered list of transactions, each
/// with its kept events in `seq` order, plus the rewrites applied along the
/// way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PredictedHistory {
    pub transactions: Vec<TransactionId>,
    pub events: alloc::collections::BTreeMap<TransactionId, Vec<Event>>,
    pub rewrites: Vec<RewrittenRead>,
}

/// Evaluates `boundary[s]` from the model, defaulting to "keep the whole
/// session" if the model has no explicit value for it (an invariant
/// violation in a well-formed `sat` model, but harmless to default past).
fn boundary_of(model: &Model, store: &HistoryStore, session: SessionId) -> u32 {
    model
        .int(&Symbol::Boundary, &[Term::Session(session)])
        .map_or_else(|| store.session_event_count(session), |v| v as u32)
}

fn choice_of(model: &Model, tx: TransactionId, seq: u32) -> Option<usize> {
    model
        .int(&Symbol::Choice, &[Term::Read(tx, seq)])
        .and_then(|v| usize::try_from(v).ok())
}

/// Step 2: an event is kept iff `event_in_boundary` (§4.2) holds, evaluated
/// directly against the model's concrete `boundary[s]` under the active
/// [`crate::config::BoundaryStrategy`].
fn event_kept(model: &Model, store: &HistoryStore, ctx: SymbolicContext, event: Event) -> bool {
    let boundary = boundary_of(model, store, store.session_of(event.tx()));
    match ctx.boundary_strategy() {
        crate::config::BoundaryStrategy::Strict => event.seq() < boundary,
        crate::config::BoundaryStrategy::Relaxed => {
            i64::from(store.first_event_in_tx(event.tx())) < i64::from(boundary)
        }
    }
}

/// Evaluates `event_on_boundary` (§4.2) directly against concrete model
/// values, mirroring [`SymbolicContext::event_on_boundary`]'s two cases
/// without re-deriving a [`crate::formula::Formula`] to interpret.
fn on_boundary(store: &HistoryStore, ctx: SymbolicContext, boundary: u32, tx: TransactionId, seq: u32) -> bool {
    match ctx.boundary_strategy() {
        crate::config::BoundaryStrategy::Strict => seq + 1 == boundary,
        crate::config::BoundaryStrategy::Relaxed => {
            let first = store.first_event_in_tx(tx);
            let count = store.transaction_event_count(tx);
            first < boundary && boundary <= first + count
        }
    }
}

/// Step 3: rewrite a kept read that sits on its session's boundary to the
/// writer `choice` selected, if that differs from what it originally
/// observed.
fn rewrite_read(
    model: &Model,
    store: &HistoryStore,
    ctx: SymbolicContext,
    key: &Key,
    read: ReadEvent,
) -> (ReadEvent, Option<RewrittenRead>) {
    let boundary = boundary_of(model, store, store.session_of(read.tx));
    if !on_boundary(store, ctx, boundary, read.tx, read.seq) {
        return (read, None);
    }

    let Some(idx) = choice_of(model, read.tx, read.seq) else {
        return (read, None);
    };
    let writes = store.write_history(key);
    let Some(chosen) = writes.get(idx) else {
        return (read, None);
    };

    if chosen.tx == read.from_tx {
        return (read, None);
    }

    let rewritten = ReadEvent {
        from_tx: chosen.tx,
        from_seq: chosen.seq,
        ..read
    };
    let diff = RewrittenRead {
        key: key.clone(),
        tx: read.tx,
        seq: read.seq,
        original_writer: read.from_tx,
        new_writer: chosen.tx,
    };
    (rewritten, Some(diff))
}

/// Step 4: for non-boundary transactions, observed commit order, skipping
/// anything strictly after the cut (`hb(boundary_tx, t)` true in the
/// model); for boundary transactions, the model's own `co_W` order.
fn transaction_order(model: &Model, store: &HistoryStore, kept: &[TransactionId]) -> Vec<TransactionId> {
    let boundary_txs: Vec<TransactionId> = kept
        .iter()
        .copied()
        .filter(|&tx| {
            let session = store.session_of(tx);
            let boundary = boundary_of(model, store, session);
            let first = store.first_event_in_tx(tx);
            let count = store.transaction_event_count(tx);
            first < boundary && boundary <= first + count
        })
        .collect();

    let mut interior: Vec<TransactionId> = kept
        .iter()
        .copied()
        .filter(|tx| !boundary_txs.contains(tx))
        .filter(|&t| {
            !boundary_txs
                .iter()
                .any(|&b| model.holds(Symbol::Hb, b, t) == Some(true))
        })
        .collect();
    interior.sort_by_key(|t| t.observed_co());

    let mut boundary_sorted = boundary_txs;
    boundary_sorted.sort_by_key(|&tx| {
        model
            .int(&Symbol::CommitOrder(alloc::string::String::from("Causal")), &[Term::Tx(tx)])
            .or_else(|| {
                model.int(
                    &Symbol::CommitOrder(alloc::string::String::from("ReadCommitted")),
                    &[Term::Tx(tx)],
                )
            })
            .unwrap_or_else(|| i64::from(tx.observed_co()))
    });

    interior.into_iter().chain(boundary_sorted).collect()
}

/// Runs the whole reconstruction (C7) against a `sat` model.
pub fn reconstruct(model: &Model, store: &HistoryStore, ctx: SymbolicContext) -> PredictedHistory {
    let kept_txs: Vec<TransactionId> = store.transactions().collect();
    let order = transaction_order(model, store, &kept_txs);

    let mut rewrites = Vec::new();
    let mut events: alloc::collections::BTreeMap<TransactionId, Vec<Event>> =
        alloc::collections::BTreeMap::new();

    for &tx in &order {
        let mut kept_events = Vec::new();
        for event in store.events_of(tx) {
            if !event_kept(model, store, ctx, event) {
                continue;
            }
            match event {
                Event::Write(w) => kept_events.push(Event::Write(w)),
                Event::Read(r) => {
                    let key = store
                        .keys()
                        .find(|k| store.read_history(k).iter().any(|e| e.tx == r.tx && e.seq == r.seq))
                        .cloned();
                    if let Some(key) = key {
                        let (rewritten, diff) = rewrite_read(model, store, ctx, &key, r);
                        if let Some(diff) = diff {
                            rewrites.push(diff);
                        }
                        kept_events.push(Event::Read(rewritten));
                    } else {
                        kept_events.push(Event::Read(r));
                    }
                }
            }
        }
        kept_events.sort_by_key(Event::seq);
        events.insert(tx, kept_events);
    }

    PredictedHistory {
        transactions: order,
        events,
        rewrites,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryStrategy;
    use crate::history::HistoryBuilder;

    #[test]
    fn unmodified_model_reconstructs_the_full_observed_history() {
        let mut b = HistoryBuilder::new();
        b.add_write("1", "1", "x", false);
        b.add_read("2", "1", "x", "1", "1");
        let store = b.finish().unwrap();
        let ctx = SymbolicContext::new(BoundaryStrategy::Strict);

        let mut model = Model::new();
        for (session, _) in store.sessions() {
            model.set_int(
                Symbol::Boundary,
                Vec::from([Term::Session(session)]),
                i64::from(store.session_event_count(session)) + 1,
            );
        }

        let predicted = reconstruct(&model, &store, ctx);
        assert_eq!(predicted.transactions.len(), 2);
        assert!(predicted.rewrites.is_empty());
        for events in predicted.events.values() {
            assert!(!events.is_empty());
        }
    }
}
