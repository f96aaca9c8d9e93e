//! End-to-end scenarios straight out of the testable-properties table:
//! each builds a history directly through [`predicate_core::HistoryBuilder`]
//! (never through the parser) and drives it through [`predicate_core::Encoder`].
//!
//! Scenarios 1-3 additionally hand-author a [`predicate_core::oracle::StubOracle`]
//! model representing the documented reconstruction (which boundary each
//! session is cut at, which write each straddling read is rebound to) and
//! assert [`predicate_core::Encoder::predict`] actually performs that swap --
//! not just that the constraint bag came out non-empty.

use predicate_core::formula::{Symbol, Term};
use predicate_core::oracle::{Model, StubOracle};
use predicate_core::{
    Config, Encoder, HistoryBuilder, IsolationLevel, Outcome, PredictResult, Strategy,
};

/// Sets `boundary[s]` to "keep the whole session" for every session in
/// `store`, the baseline a scenario then overrides at the sessions it wants
/// to cut short.
fn whole_session_boundaries(model: &mut Model, store: &predicate_core::HistoryStore) {
    for (session, _) in store.sessions() {
        model.set_int(
            Symbol::Boundary,
            vec![Term::Session(session)],
            i64::from(store.session_event_count(session)) + 1,
        );
    }
}

#[test]
fn write_skew_two_sessions_swaps_a_read_to_the_other_sessions_write() {
    // S1: READ x From(T0); WRITE y. S2: READ y From(T0); WRITE x.
    let mut b = HistoryBuilder::new();
    b.add_read("1", "1", "x", "0", "0");
    b.add_write("1", "2", "y", false);
    b.add_read("2", "1", "y", "0", "0");
    b.add_write("2", "2", "x", false);
    let store = b.finish().expect("non-empty history");

    assert_eq!(store.transaction_count(), 5);

    let encoder = Encoder::new(Config {
        level: IsolationLevel::Causal,
        strategy: Strategy::Full,
        ..Config::default()
    });
    let bag = encoder.build_constraints(&store);
    assert!(!bag.is_empty());

    let s1_read = store.read_history(&"x".into())[0];
    let s2_write_x = store
        .write_history(&"x".into())
        .iter()
        .find(|w| w.tx != s1_read.from_tx)
        .copied()
        .expect("S2's write of x");

    let mut model = Model::new();
    whole_session_boundaries(&mut model, &store);
    // Cut S1 right after its read so the read lands on the boundary and S1's
    // own write of y is truncated away.
    model.set_int(
        Symbol::Boundary,
        vec![Term::Session(store.session_of(s1_read.tx))],
        i64::from(s1_read.seq) + 1,
    );
    let chosen_idx = store
        .write_history(&"x".into())
        .iter()
        .position(|w| w.tx == s2_write_x.tx)
        .expect("S2's write is indexed");
    model.set_int(
        Symbol::Choice,
        vec![Term::Read(s1_read.tx, s1_read.seq)],
        chosen_idx as i64,
    );

    let mut oracle = StubOracle::new(Outcome::Sat(model));
    let PredictResult::Unserializable(predicted) = encoder.predict(&store, &mut oracle) else {
        panic!("expected an unserializable prediction");
    };

    assert_eq!(predicted.rewrites.len(), 1);
    let rewrite = &predicted.rewrites[0];
    assert_eq!(rewrite.tx, s1_read.tx);
    assert_eq!(rewrite.original_writer, s1_read.from_tx);
    assert_eq!(rewrite.new_writer, s2_write_x.tx);
}

#[test]
fn lost_update_is_sat_under_read_committed_with_both_reads_left_at_the_initial_value() {
    // S1: READ x From(T0); WRITE x. S2: READ x From(T0); WRITE x. Neither
    // read needs to move for the lost update to be unserializable: both
    // sessions read the same initial write and each overwrites it.
    let mut b = HistoryBuilder::new();
    b.add_read("1", "1", "x", "0", "0");
    b.add_write("1", "2", "x", false);
    b.add_read("2", "1", "x", "0", "0");
    b.add_write("2", "2", "x", false);
    let store = b.finish().expect("non-empty history");

    assert_eq!(store.write_history(&"x".into()).len(), 3);

    let encoder = Encoder::new(Config {
        level: IsolationLevel::ReadCommitted,
        strategy: Strategy::Full,
        ..Config::default()
    });
    let bag = encoder.build_constraints(&store);
    assert!(!bag.is_empty());

    let mut model = Model::new();
    whole_session_boundaries(&mut model, &store);

    let mut oracle = StubOracle::new(Outcome::Sat(model));
    let PredictResult::Unserializable(predicted) = encoder.predict(&store, &mut oracle) else {
        panic!("expected an unserializable prediction");
    };

    assert!(predicted.rewrites.is_empty());
    for tx in store.transactions() {
        assert!(!predicted.events[&tx].is_empty());
    }
}

#[test]
fn read_only_anomaly_routes_s3s_x_read_to_s1() {
    // S1: WRITE x. S2: WRITE y. S3: READ x From(T0); READ y From(S2).
    let mut b = HistoryBuilder::new();
    b.add_write("1", "1", "x", false);
    b.add_write("2", "1", "y", false);
    b.add_read("3", "1", "x", "0", "0");
    b.add_read("3", "2", "y", "2", "1");
    let store = b.finish().expect("non-empty history");

    assert_eq!(store.transaction_count(), 5);
    let x_read = store.read_history(&"x".into())[0];
    assert!(store.init_transactions().contains(&x_read.from_tx));

    let s1_write_x = store
        .write_history(&"x".into())
        .iter()
        .find(|w| !store.init_transactions().contains(&w.tx))
        .copied()
        .expect("S1's write of x");

    let encoder = Encoder::new(Config {
        level: IsolationLevel::Causal,
        strategy: Strategy::Full,
        ..Config::default()
    });
    let bag = encoder.build_constraints(&store);
    assert!(!bag.is_empty());

    let mut model = Model::new();
    whole_session_boundaries(&mut model, &store);
    // Cut S3 right after its x read, dropping its y read, so the x read can
    // be rebound to S1's write instead of the initial one.
    model.set_int(
        Symbol::Boundary,
        vec![Term::Session(store.session_of(x_read.tx))],
        i64::from(x_read.seq) + 1,
    );
    let s1_idx = store
        .write_history(&"x".into())
        .iter()
        .position(|w| w.tx == s1_write_x.tx)
        .expect("S1's write is indexed");
    model.set_int(
        Symbol::Choice,
        vec![Term::Read(x_read.tx, x_read.seq)],
        s1_idx as i64,
    );

    let mut oracle = StubOracle::new(Outcome::Sat(model));
    let PredictResult::Unserializable(predicted) = encoder.predict(&store, &mut oracle) else {
        panic!("expected an unserializable prediction");
    };

    assert_eq!(predicted.rewrites.len(), 1);
    let rewrite = &predicted.rewrites[0];
    assert_eq!(rewrite.tx, x_read.tx);
    assert_eq!(rewrite.original_writer, x_read.from_tx);
    assert_eq!(rewrite.new_writer, s1_write_x.tx);
}

#[test]
fn already_serializable_history_is_unsat_at_every_level() {
    let mut b = HistoryBuilder::new();
    b.add_write("1", "1", "x", false);
    b.add_read("2", "1", "x", "1", "1");
    let store = b.finish().expect("non-empty history");

    assert!(store.init_transactions().is_empty());

    for level in [IsolationLevel::Causal, IsolationLevel::ReadCommitted] {
        let encoder = Encoder::new(Config {
            level,
            ..Config::default()
        });
        let mut oracle = StubOracle::new(Outcome::Unsat);
        let result = encoder.predict(&store, &mut oracle);
        assert_eq!(result, PredictResult::AlreadySerializable);
    }
}

#[test]
fn corrupt_log_with_zero_transactions_is_rejected() {
    let builder = HistoryBuilder::new();
    assert!(builder.finish().is_err());
}

#[test]
fn set_semantics_behave_as_reads_and_writes_on_a_synthetic_key() {
    // INSERT[a] to Set[q] Txn(S1) and CONTAINS[a] in Set[q] From(S1) Txn(S2)
    // both reduce, at the core layer, to ordinary writes/reads on the
    // synthetic key `Set(q:a)` -- the parser's job is only to name that key;
    // once built, the history store cannot tell a set op from a plain one.
    let mut b = HistoryBuilder::new();
    b.add_write("1", "1", "Set(q:a)", false);
    b.add_read("2", "1", "Set(q:a)", "1", "1");
    b.add_write("2", "2", "Set(q:a)", false);
    let store = b.finish().expect("non-empty history");

    assert_eq!(store.transaction_count(), 3);
    assert_eq!(store.write_history(&"Set(q:a)".into()).len(), 2);
    assert_eq!(store.read_history(&"Set(q:a)".into()).len(), 1);
}
