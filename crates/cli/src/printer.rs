//! Renders a [`PredictedHistory`] back into the log record shapes of §6,
//! plus a console diff of rewritten reads and a DOT relation graph for
//! `--visualize`.

use predicate_core::history::{Event, HistoryStore, Key, TransactionId};
use predicate_core::oracle::Model;
use predicate_core::reconstruct::PredictedHistory;

fn key_of(store: &HistoryStore, tx: TransactionId, seq: u32, event: &Event) -> Option<Key> {
    store
        .keys()
        .find(|k| match event {
            Event::Read(_) => store
                .read_history(k)
                .iter()
                .any(|e| e.tx == tx && e.seq == seq),
            Event::Write(_) => store
                .write_history(k)
                .iter()
                .any(|w| w.tx == tx && w.seq == seq),
        })
        .cloned()
}

fn format_event(store: &HistoryStore, event: Event) -> String {
    let tx = store.transaction_label(event.tx());
    let Some(key) = key_of(store, event.tx(), event.seq(), &event) else {
        return String::from("; <unresolvable event>");
    };
    match event {
        Event::Write(_) => format!("WRITE KEY[{key}] Txn({tx})"),
        Event::Read(r) => {
            let from = store.transaction_label(r.from_tx);
            format!("READ KEY[{key}] Txn({tx}) From({from})")
        }
    }
}

/// Renders the predicted history in transaction order, each transaction's
/// kept events in `seq` order.
#[must_use]
pub fn format_predicted_history(store: &HistoryStore, predicted: &PredictedHistory) -> String {
    let mut out = String::new();
    for &tx in &predicted.transactions {
        let Some(events) = predicted.events.get(&tx) else {
            continue;
        };
        for event in events {
            out.push_str(&format_event(store, *event));
            out.push('\n');
        }
    }
    out
}

/// Renders the console diff of reads whose writer was rewritten.
#[must_use]
pub fn format_rewrites(store: &HistoryStore, predicted: &PredictedHistory) -> String {
    let mut out = String::new();
    for rewrite in &predicted.rewrites {
        let tx = store.transaction_label(rewrite.tx);
        let original = store.transaction_label(rewrite.original_writer);
        let new = store.transaction_label(rewrite.new_writer);
        out.push_str(&format!(
            "Txn({tx}) read {}: Txn({original}) -> Txn({new})\n",
            rewrite.key
        ));
    }
    out
}

/// A DOT multigraph whose edges are the keyed `wr`/`ar`/`ww`/`rw` relations
/// and the unkeyed `so` relation that the model makes true, per §6.
#[must_use]
pub fn dot_graph(store: &HistoryStore, model: &Model) -> String {
    use petgraph::dot::Dot;
    use petgraph::graph::{Graph, NodeIndex};
    use predicate_core::formula::Symbol;

    let transactions: Vec<TransactionId> = store.transactions().collect();
    let mut graph: Graph<String, String> = Graph::new();
    let mut nodes: Vec<NodeIndex> = Vec::with_capacity(transactions.len());

    for &tx in &transactions {
        nodes.push(graph.add_node(format!("{tx} ({})", store.transaction_label(tx))));
    }

    for (i, &t1) in transactions.iter().enumerate() {
        for (j, &t2) in transactions.iter().enumerate() {
            if t1 == t2 {
                continue;
            }
            if model.holds(Symbol::So, t1, t2) == Some(true) {
                graph.add_edge(nodes[i], nodes[j], String::from("so"));
            }
            for key in store.keys() {
                for (sym, label) in [
                    (Symbol::WrK(key.clone()), "wr"),
                    (Symbol::ArK(key.clone()), "ar"),
                    (Symbol::WwK(key.clone()), "ww"),
                    (Symbol::RwK(key.clone()), "rw"),
                ] {
                    if model.holds(sym, t1, t2) == Some(true) {
                        graph.add_edge(nodes[i], nodes[j], format!("{label}[{key}]"));
                    }
                }
            }
        }
    }

    format!("{}", Dot::new(&graph))
}
