//! C1: in-memory representation of a parsed log, and the builder that
//! accumulates it record by record.
//!
//! Grounded directly in the reference `DataStore`/`add_read`/`add_write`
//! accumulation order: a read that observes an uncommitted local write is
//! dropped before any bookkeeping mutates; a dangling read (no write found
//! anywhere for its named writer) synthesizes that writer's write instead of
//! failing, so only a stream that yields zero transactions is corrupt.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};

use super::types::{
    Event, Key, ReadEvent, Session, SessionId, Transaction, TransactionId, TransactionLabel,
    WriteEvent,
};

/// Why a history failed to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The record stream yielded zero transactions.
    Empty,
}

impl core::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "log contained no transactions"),
        }
    }
}

impl core::error::Error for HistoryError {}

/// Accumulates log records into a [`HistoryStore`].
#[derive(Debug, Default)]
pub struct HistoryBuilder {
    sessions: Vec<Session>,
    session_index: HashMap<String, SessionId>,
    tx_labels: Vec<TransactionLabel>,
    tx_session: Vec<SessionId>,
    tx_index: HashMap<(String, String), TransactionId>,
    write_history: HashMap<Key, Vec<WriteEvent>>,
    read_history: HashMap<Key, Vec<ReadEvent>>,
    session_event_count: Vec<u32>,
    first_event_in_tx: HashMap<TransactionId, u32>,
    transaction_event_count: HashMap<TransactionId, u32>,
    session_read_events: HashMap<SessionId, Vec<u32>>,
    init_txs: HashSet<TransactionId>,
}

impl HistoryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn session_id(&mut self, label: &str) -> SessionId {
        if let Some(&id) = self.session_index.get(label) {
            return id;
        }
        let id = SessionId(self.sessions.len() as u32);
        self.sessions.push(Session {
            label: String::from(label),
            transactions: Vec::new(),
        });
        self.session_event_count.push(0);
        self.session_index.insert(String::from(label), id);
        id
    }

    fn tx_id(&mut self, session: &str, local: &str) -> TransactionId {
        let key = (String::from(session), String::from(local));
        if let Some(&id) = self.tx_index.get(&key) {
            return id;
        }
        let session_id = self.session_id(session);
        let id = TransactionId(self.tx_labels.len() as u32);
        self.tx_labels.push(TransactionLabel {
            session: key.0.clone(),
            local: key.1.clone(),
        });
        self.tx_session.push(session_id);
        self.tx_index.insert(key, id);
        id
    }

    /// Find the `seq` of the most recent write on `key` by `tx`, or `None`.
    fn find_write_seq(&self, key: &Key, tx: TransactionId) -> Option<u32> {
        self.write_history
            .get(key)
            .and_then(|writes| writes.iter().filter(|w| w.tx == tx).map(|w| w.seq).max())
    }

    fn note_first_event(&mut self, tx: TransactionId, seq: u32) {
        if !self.transaction_event_count.contains_key(&tx) {
            let session = self.tx_session[tx.0 as usize];
            self.sessions[session.0 as usize].transactions.push(tx);
            self.first_event_in_tx.insert(tx, seq);
            self.transaction_event_count.insert(tx, 0);
        }
    }

    /// Record `WRITE KEY[<key>] Txn(<session>, <local>)`.
    ///
    /// `init` marks the synthesized write of the initial transaction: unlike
    /// an ordinary write it is inserted at index 0 of `W[k]` rather than
    /// appended, and only if `W[k]` has no entry from this transaction yet.
    pub fn add_write(&mut self, session: &str, local: &str, key: impl Into<Key>, init: bool) {
        let key = key.into();
        let tx = self.tx_id(session, local);
        let session_id = self.tx_session[tx.0 as usize];

        let seq = self.session_event_count[session_id.0 as usize];
        self.note_first_event(tx, seq);

        let history = self.write_history.entry(key).or_default();
        history.retain(|w| w.tx != tx);
        let event = WriteEvent { tx, seq };
        if init {
            history.insert(0, event);
            self.init_txs.insert(tx);
        } else {
            history.push(event);
        }

        self.session_event_count[session_id.0 as usize] = seq + 1;
        *self.transaction_event_count.entry(tx).or_insert(0) += 1;
    }

    /// Record `READ KEY[<key>] Txn(<session>, <local>) From(<from_session>, <from_local>)`.
    ///
    /// `ignore_po` is used only for the once-considered universal sink (see
    /// `SPEC_FULL.md` §9 Open Questions (b)); this builder never sets it.
    pub fn add_read(
        &mut self,
        session: &str,
        local: &str,
        key: impl Into<Key>,
        from_session: &str,
        from_local: &str,
    ) {
        let key = key.into();
        let tx = self.tx_id(session, local);

        // Local read-after-write on the same key: never recorded.
        if self.find_write_seq(&key, tx).is_some() {
            return;
        }

        let from_tx = self.tx_id(from_session, from_local);
        let from_seq = match self.find_write_seq(&key, from_tx) {
            Some(seq) => seq,
            None => {
                // Reading from the initial state: synthesize it.
                self.add_write(from_session, from_local, key.clone(), true);
                self.find_write_seq(&key, from_tx)
                    .expect("just synthesized")
            }
        };

        let session_id = self.tx_session[tx.0 as usize];
        let seq = self.session_event_count[session_id.0 as usize];
        self.note_first_event(tx, seq);

        self.read_history.entry(key).or_default().push(ReadEvent {
            tx,
            seq,
            from_tx,
            from_seq,
        });
        self.session_read_events
            .entry(session_id)
            .or_default()
            .push(seq);

        self.session_event_count[session_id.0 as usize] = seq + 1;
        *self.transaction_event_count.entry(tx).or_insert(0) += 1;
    }

    /// Consume the builder, producing a [`HistoryStore`], or report that the
    /// log was corrupt (zero transactions).
    ///
    /// Every key that ever gets a dangling read has its writer's write
    /// synthesized inline by `add_read`, which already establishes
    /// invariant 3 of `SPEC_FULL.md` §3; there is no separate synthesis pass
    /// to run here.
    pub fn finish(self) -> Result<HistoryStore, HistoryError> {
        if self.tx_labels.is_empty() {
            return Err(HistoryError::Empty);
        }

        Ok(HistoryStore {
            sessions: self.sessions,
            tx_labels: self.tx_labels,
            tx_session: self.tx_session,
            write_history: self.write_history,
            read_history: self.read_history,
            session_event_count: self.session_event_count,
            first_event_in_tx: self.first_event_in_tx,
            transaction_event_count: self.transaction_event_count,
            session_read_events: self.session_read_events,
            init_txs: self.init_txs,
        })
    }
}

/// The published, read-only history store (C1).
#[derive(Debug)]
pub struct HistoryStore {
    sessions: Vec<Session>,
    tx_labels: Vec<TransactionLabel>,
    tx_session: Vec<SessionId>,
    write_history: HashMap<Key, Vec<WriteEvent>>,
    read_history: HashMap<Key, Vec<ReadEvent>>,
    session_event_count: Vec<u32>,
    first_event_in_tx: HashMap<TransactionId, u32>,
    transaction_event_count: HashMap<TransactionId, u32>,
    session_read_events: HashMap<SessionId, Vec<u32>>,
    init_txs: HashSet<TransactionId>,
}

impl HistoryStore {
    #[must_use]
    pub fn sessions(&self) -> impl Iterator<Item = (SessionId, &Session)> {
        self.sessions
            .iter()
            .enumerate()
            .map(|(i, s)| (SessionId(i as u32), s))
    }

    #[must_use]
    pub fn session(&self, id: SessionId) -> &Session {
        &self.sessions[id.0 as usize]
    }

    #[must_use]
    pub fn transactions(&self) -> impl Iterator<Item = TransactionId> {
        (0..self.tx_labels.len() as u32).map(TransactionId)
    }

    #[must_use]
    pub fn transaction_label(&self, tx: TransactionId) -> &TransactionLabel {
        &self.tx_labels[tx.0 as usize]
    }

    #[must_use]
    pub fn transaction(&self, tx: TransactionId) -> Transaction {
        Transaction {
            session: self.tx_session[tx.0 as usize],
            label: Some(self.tx_labels[tx.0 as usize].clone()),
        }
    }

    #[must_use]
    pub fn session_of(&self, tx: TransactionId) -> SessionId {
        self.tx_session[tx.0 as usize]
    }

    #[must_use]
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.write_history.keys()
    }

    #[must_use]
    pub fn write_history(&self, key: &Key) -> &[WriteEvent] {
        self.write_history.get(key).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn read_history(&self, key: &Key) -> &[ReadEvent] {
        self.read_history.get(key).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn write_index(&self, key: &Key, tx: TransactionId) -> Option<usize> {
        self.write_history(key).iter().position(|w| w.tx == tx)
    }

    #[must_use]
    pub fn session_event_count(&self, session: SessionId) -> u32 {
        self.session_event_count[session.0 as usize]
    }

    #[must_use]
    pub fn first_event_in_tx(&self, tx: TransactionId) -> u32 {
        self.first_event_in_tx.get(&tx).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn transaction_event_count(&self, tx: TransactionId) -> u32 {
        self.transaction_event_count.get(&tx).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn session_read_events(&self, session: SessionId) -> &[u32] {
        self.session_read_events
            .get(&session)
            .map_or(&[], Vec::as_slice)
    }

    /// Every event of `tx`, in the order the builder saw them, read out of
    /// the read/write histories it ended up filed into. `O(keys)`; used only
    /// by the result reconstructor, once per emitted transaction.
    #[must_use]
    pub fn events_of(&self, tx: TransactionId) -> Vec<Event> {
        let mut events = Vec::new();
        for writes in self.write_history.values() {
            events.extend(writes.iter().filter(|w| w.tx == tx).map(|w| Event::Write(*w)));
        }
        for reads in self.read_history.values() {
            events.extend(reads.iter().filter(|r| r.tx == tx).map(|r| Event::Read(*r)));
        }
        events.sort_by_key(Event::seq);
        events
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.tx_labels.len()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.read_count() + self.write_count()
    }

    #[must_use]
    pub fn read_count(&self) -> usize {
        self.read_history.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        self.write_history.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn conflicts_count(&self) -> usize {
        self.write_history.values().filter(|w| w.len() > 2).count()
    }

    #[must_use]
    pub fn max_conflicting_write_count(&self) -> usize {
        self.write_history
            .values()
            .map(|w| w.len().saturating_sub(2))
            .max()
            .unwrap_or(0)
    }

    /// The absolute distance between two transactions' observed commit
    /// order; `TransactionId` doubles as `observed_co`, so this is just
    /// `|t1.0 - t2.0|`.
    #[must_use]
    pub fn observed_distance(&self, t1: TransactionId, t2: TransactionId) -> u32 {
        t1.0.abs_diff(t2.0)
    }

    /// Every transaction that exists only because some read dangled and had
    /// its writer synthesized (§9 design note on initial-transaction
    /// identification). Empty when the history has no dangling reads at
    /// all — e.g. the already-serializable scenario of `SPEC_FULL.md` §8.
    #[must_use]
    pub fn init_transactions(&self) -> &HashSet<TransactionId> {
        &self.init_txs
    }

    /// The first transaction of `session` in session order, or `None` for
    /// an empty session (which cannot actually occur once built, since
    /// `finish` only ever rejects an entirely empty store).
    #[must_use]
    pub fn first_tx_of_session(&self, session: SessionId) -> Option<TransactionId> {
        self.sessions[session.0 as usize].transactions.first().copied()
    }
}
