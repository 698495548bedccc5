//! The transaction nexus
//!
//! Owns the one open transaction (if any) and the undo/redo history of one
//! project. All commits, undos and redos run under the project's
//! [`CommitGate`], and their change notifications are delivered only after
//! the gate is released.
//!
//! Lock order is gate, then nexus state. Staging only takes the state lock,
//! so a reader holding the gate may stage from any thread. Committing,
//! undoing or redoing while the same thread holds the gate deadlocks.

use crate::config::NexusConfig;
use crate::gate::CommitGate;
use crate::history::{History, HistoryChange, HistoryChangeKind, HistoryEntry};
use crate::operation::{apply_backward, apply_forward, Dispatch};
use crate::transaction::{OpenTransaction, Transaction, TransactionId, DEFAULT_LABEL};
use arbor_core::{Error, Result};
use arbor_event::Event;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Whether a transaction is being built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NexusStatus {
    /// No open transaction
    Idle,
    /// A transaction is open and accepting operations
    Open,
}

pub(crate) struct NexusState {
    pub(crate) open: Option<OpenTransaction>,
    history: History,
    next_id: u64,
}

pub(crate) struct NexusShared {
    gate: CommitGate,
    pub(crate) state: Mutex<NexusState>,
    on_status_change: Event<NexusStatus>,
    on_history_change: Event<HistoryChange>,
}

/// The commit log of one project
#[derive(Clone)]
pub struct Nexus {
    shared: Arc<NexusShared>,
}

impl Nexus {
    /// Create a nexus with its own commit gate
    pub fn new(config: NexusConfig) -> Self {
        Self::with_gate(config, CommitGate::new())
    }

    /// Create a nexus that commits under an existing gate
    pub fn with_gate(config: NexusConfig, gate: CommitGate) -> Self {
        Self {
            shared: Arc::new(NexusShared {
                gate,
                state: Mutex::new(NexusState {
                    open: None,
                    history: History::new(config.history_bound()),
                    next_id: 1,
                }),
                on_status_change: Event::new(),
                on_history_change: Event::new(),
            }),
        }
    }

    /// The gate readers must hold to observe committed state
    pub fn gate(&self) -> &CommitGate {
        &self.shared.gate
    }

    /// Fired with the new status whenever a transaction opens or closes
    pub fn on_status_change(&self) -> &Event<NexusStatus> {
        &self.shared.on_status_change
    }

    /// Fired after every commit, undo, redo and redo discard
    pub fn on_history_change(&self) -> &Event<HistoryChange> {
        &self.shared.on_history_change
    }

    /// Current status
    pub fn status(&self) -> NexusStatus {
        if self.shared.state.lock().open.is_some() {
            NexusStatus::Open
        } else {
            NexusStatus::Idle
        }
    }

    /// Open a new transaction.
    ///
    /// Fails with [`Error::TransactionAlreadyOpen`] if one is open already.
    /// Opening discards the redo stack.
    pub fn open(&self) -> Result<Transaction> {
        let (id, discarded) = {
            let mut state = self.shared.state.lock();
            if state.open.is_some() {
                return Err(Error::TransactionAlreadyOpen);
            }
            let id = TransactionId(state.next_id);
            state.next_id += 1;
            state.open = Some(OpenTransaction::new(id));
            (id, state.history.clear_redo())
        };

        log::trace!("Opened {}", id);
        if discarded > 0 {
            log::debug!("Diverging edit discarded {} redo entries", discarded);
            self.shared.on_history_change.fire(&HistoryChange {
                kind: HistoryChangeKind::RedoDiscarded,
                id: None,
                label: String::new(),
            });
        }
        self.shared.on_status_change.fire(&NexusStatus::Open);

        Ok(Transaction::new(id, Arc::downgrade(&self.shared)))
    }

    /// Validate and apply the open transaction.
    ///
    /// Every staged operation is applied in log order under the commit gate.
    /// If any precondition fails, the operations applied so far are reverted,
    /// no notification is delivered, and the failure is returned. Either way
    /// the nexus is idle afterwards.
    pub fn commit(&self) -> Result<TransactionId> {
        let mut dispatch = Dispatch::new();
        let (id, label, outcome) = {
            let _gate = self.shared.gate.write();
            let mut state = self.shared.state.lock();
            let OpenTransaction { id, label, mut log } =
                state.open.take().ok_or(Error::NoActiveTransaction)?;
            let label = label.unwrap_or_else(|| DEFAULT_LABEL.to_string());

            let outcome = apply_forward(&mut log, &mut dispatch).map(|()| {
                let recorded = !log.is_empty();
                if recorded {
                    log::debug!("Committed '{}' ({}, {} operations)", label, id, log.len());
                    state.history.push_committed(HistoryEntry {
                        id,
                        label: label.clone(),
                        ops: log,
                    });
                } else {
                    log::trace!("Committed empty {}", id);
                }
                recorded
            });
            (id, label, outcome)
        };

        let recorded = match outcome {
            Ok(recorded) => recorded,
            Err(err) => {
                log::warn!("Transaction '{}' ({}) aborted: {}", label, id, err);
                self.shared.on_status_change.fire(&NexusStatus::Idle);
                return Err(err);
            }
        };

        dispatch.run();
        if recorded {
            self.shared.on_history_change.fire(&HistoryChange {
                kind: HistoryChangeKind::Committed,
                id: Some(id),
                label,
            });
        }
        self.shared.on_status_change.fire(&NexusStatus::Idle);
        Ok(id)
    }

    /// Drop the open transaction without applying anything
    pub fn abort(&self) -> Result<()> {
        let open = self
            .shared
            .state
            .lock()
            .open
            .take()
            .ok_or(Error::NoActiveTransaction)?;
        log::debug!(
            "Aborted '{}' ({}, {} staged operations discarded)",
            open.label.as_deref().unwrap_or(DEFAULT_LABEL),
            open.id,
            open.log.len()
        );
        self.shared.on_status_change.fire(&NexusStatus::Idle);
        Ok(())
    }

    /// Revert the most recent committed transaction
    pub fn undo(&self) -> Result<()> {
        let mut dispatch = Dispatch::new();
        let change = {
            let _gate = self.shared.gate.write();
            let mut state = self.shared.state.lock();
            if state.open.is_some() {
                return Err(Error::TransactionAlreadyOpen);
            }
            let mut entry = state.history.pop_undo().ok_or(Error::NothingToUndo)?;

            if let Err(err) = apply_backward(&mut entry.ops, &mut dispatch) {
                log::warn!("Undo of '{}' ({}) failed: {}", entry.label, entry.id, err);
                state.history.restore_undo(entry);
                return Err(err);
            }

            log::debug!("Undid '{}' ({})", entry.label, entry.id);
            let change = HistoryChange {
                kind: HistoryChangeKind::Undone,
                id: Some(entry.id),
                label: entry.label.clone(),
            };
            state.history.push_redo(entry);
            change
        };

        dispatch.run();
        self.shared.on_history_change.fire(&change);
        Ok(())
    }

    /// Re-apply the most recently undone transaction
    pub fn redo(&self) -> Result<()> {
        let mut dispatch = Dispatch::new();
        let change = {
            let _gate = self.shared.gate.write();
            let mut state = self.shared.state.lock();
            if state.open.is_some() {
                return Err(Error::TransactionAlreadyOpen);
            }
            let mut entry = state.history.pop_redo().ok_or(Error::NothingToRedo)?;

            if let Err(err) = apply_forward(&mut entry.ops, &mut dispatch) {
                log::warn!("Redo of '{}' ({}) failed: {}", entry.label, entry.id, err);
                state.history.restore_redo(entry);
                return Err(err);
            }

            log::debug!("Redid '{}' ({})", entry.label, entry.id);
            let change = HistoryChange {
                kind: HistoryChangeKind::Redone,
                id: Some(entry.id),
                label: entry.label.clone(),
            };
            state.history.push_undo(entry);
            change
        };

        dispatch.run();
        self.shared.on_history_change.fire(&change);
        Ok(())
    }

    /// Run `f` inside a fresh transaction labelled `label`.
    ///
    /// Commits when `f` returns `Ok`, aborts when it returns `Err`.
    pub fn transact<R, E, F>(&self, label: impl Into<String>, f: F) -> std::result::Result<R, E>
    where
        F: FnOnce(&Transaction) -> std::result::Result<R, E>,
        E: From<Error>,
    {
        let tx = self.open()?;
        tx.describe(label)?;
        match f(&tx) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if tx.is_open() {
                    self.abort()?;
                }
                Err(err)
            }
        }
    }

    /// Check whether there is anything to undo
    pub fn can_undo(&self) -> bool {
        self.shared.state.lock().history.undo_count() > 0
    }

    /// Check whether there is anything to redo
    pub fn can_redo(&self) -> bool {
        self.shared.state.lock().history.redo_count() > 0
    }

    /// Number of entries on the undo stack
    pub fn undo_count(&self) -> usize {
        self.shared.state.lock().history.undo_count()
    }

    /// Number of entries on the redo stack
    pub fn redo_count(&self) -> usize {
        self.shared.state.lock().history.redo_count()
    }

    /// Undo labels, most recent first
    pub fn undo_labels(&self) -> Vec<String> {
        self.shared.state.lock().history.undo_labels()
    }

    /// Redo labels, most recent first
    pub fn redo_labels(&self) -> Vec<String> {
        self.shared.state.lock().history.redo_labels()
    }

    /// Forget all history. Fails while a transaction is open.
    pub fn clear_history(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.open.is_some() {
            return Err(Error::TransactionAlreadyOpen);
        }
        let dropped = state.history.undo_count() + state.history.redo_count();
        state.history.clear();
        drop(state);

        log::debug!("Cleared history ({} entries)", dropped);
        self.shared.on_history_change.fire(&HistoryChange {
            kind: HistoryChangeKind::Cleared,
            id: None,
            label: String::new(),
        });
        Ok(())
    }
}

impl Default for Nexus {
    fn default() -> Self {
        Self::new(NexusConfig::default())
    }
}

impl fmt::Debug for Nexus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Nexus")
            .field("open", &state.open.as_ref().map(|o| o.id))
            .field("history", &state.history)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;

    /// A shared integer register; `Set` stores a value and remembers the old one.
    #[derive(Clone, Default)]
    struct Register(Arc<Mutex<i32>>);

    struct Set {
        reg: Register,
        value: i32,
        old: i32,
        changes: Option<Arc<Mutex<Vec<i32>>>>,
    }

    impl Set {
        fn new(reg: &Register, value: i32) -> Self {
            Self {
                reg: reg.clone(),
                value,
                old: 0,
                changes: None,
            }
        }

        fn observed(mut self, changes: &Arc<Mutex<Vec<i32>>>) -> Self {
            self.changes = Some(changes.clone());
            self
        }

        fn notify(&self, out: &mut Dispatch, value: i32) {
            if let Some(changes) = self.changes.clone() {
                out.defer(move || changes.lock().push(value));
            }
        }
    }

    impl Operation for Set {
        fn apply(&mut self, out: &mut Dispatch) -> Result<()> {
            self.old = std::mem::replace(&mut *self.reg.0.lock(), self.value);
            self.notify(out, self.value);
            Ok(())
        }

        fn revert(&mut self, out: &mut Dispatch) -> Result<()> {
            *self.reg.0.lock() = self.old;
            self.notify(out, self.old);
            Ok(())
        }

        fn describe(&self) -> String {
            format!("set {}", self.value)
        }
    }

    struct Reject;

    impl Operation for Reject {
        fn apply(&mut self, _out: &mut Dispatch) -> Result<()> {
            Err(Error::AssetNotFound("gone".into()))
        }

        fn revert(&mut self, _out: &mut Dispatch) -> Result<()> {
            Ok(())
        }

        fn describe(&self) -> String {
            "reject".into()
        }
    }

    fn value(reg: &Register) -> i32 {
        *reg.0.lock()
    }

    #[test]
    fn test_commit_applies_in_log_order() {
        let nexus = Nexus::default();
        let reg = Register::default();

        let tx = nexus.open().unwrap();
        tx.describe("Set twice").unwrap();
        tx.push(Set::new(&reg, 1)).unwrap();
        tx.push(Set::new(&reg, 2)).unwrap();

        // Staged, not applied
        assert_eq!(value(&reg), 0);
        assert_eq!(tx.staged().unwrap(), 2);

        nexus.commit().unwrap();
        assert_eq!(value(&reg), 2);
        assert_eq!(nexus.undo_labels(), vec!["Set twice"]);
        assert_eq!(nexus.status(), NexusStatus::Idle);
    }

    #[test]
    fn test_failed_commit_applies_nothing() {
        let nexus = Nexus::default();
        let reg = Register::default();
        let changes = Arc::new(Mutex::new(Vec::new()));

        let tx = nexus.open().unwrap();
        tx.push(Set::new(&reg, 7).observed(&changes)).unwrap();
        tx.push(Reject).unwrap();

        let err = nexus.commit().unwrap_err();
        assert_eq!(err, Error::AssetNotFound("gone".into()));
        assert_eq!(value(&reg), 0);
        assert!(changes.lock().is_empty());
        assert!(!nexus.can_undo());
        assert_eq!(nexus.status(), NexusStatus::Idle);
        assert!(!tx.is_open());
    }

    #[test]
    fn test_notifications_follow_commit() {
        let nexus = Nexus::default();
        let reg = Register::default();
        let changes = Arc::new(Mutex::new(Vec::new()));

        let tx = nexus.open().unwrap();
        tx.push(Set::new(&reg, 3).observed(&changes)).unwrap();
        tx.push(Set::new(&reg, 4).observed(&changes)).unwrap();
        assert!(changes.lock().is_empty());
        nexus.commit().unwrap();

        assert_eq!(*changes.lock(), vec![3, 4]);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let nexus = Nexus::default();
        let reg = Register::default();

        nexus
            .transact("first", |tx| tx.push(Set::new(&reg, 10)))
            .unwrap();
        nexus
            .transact("second", |tx| tx.push(Set::new(&reg, 20)))
            .unwrap();

        nexus.undo().unwrap();
        assert_eq!(value(&reg), 10);
        assert_eq!(nexus.redo_labels(), vec!["second"]);

        nexus.undo().unwrap();
        assert_eq!(value(&reg), 0);
        assert_eq!(nexus.undo().unwrap_err(), Error::NothingToUndo);

        nexus.redo().unwrap();
        nexus.redo().unwrap();
        assert_eq!(value(&reg), 20);
        assert_eq!(nexus.redo().unwrap_err(), Error::NothingToRedo);
    }

    #[test]
    fn test_open_discards_redo() {
        let nexus = Nexus::default();
        let reg = Register::default();
        let discards = Arc::new(Mutex::new(0));
        let discards_clone = discards.clone();
        let _watch = nexus.on_history_change().watch(move |change| {
            if change.kind == HistoryChangeKind::RedoDiscarded {
                *discards_clone.lock() += 1;
            }
        });

        nexus.transact("a", |tx| tx.push(Set::new(&reg, 1))).unwrap();
        nexus.undo().unwrap();
        assert!(nexus.can_redo());

        let _tx = nexus.open().unwrap();
        assert!(!nexus.can_redo());
        assert_eq!(*discards.lock(), 1);
    }

    #[test]
    fn test_state_errors() {
        let nexus = Nexus::default();
        let reg = Register::default();

        assert_eq!(nexus.commit().unwrap_err(), Error::NoActiveTransaction);
        assert_eq!(nexus.abort().unwrap_err(), Error::NoActiveTransaction);

        let tx = nexus.open().unwrap();
        assert_eq!(nexus.open().unwrap_err(), Error::TransactionAlreadyOpen);
        assert_eq!(nexus.undo().unwrap_err(), Error::TransactionAlreadyOpen);
        nexus.abort().unwrap();

        // Stale handle
        assert_eq!(
            tx.push(Set::new(&reg, 1)).unwrap_err(),
            Error::NoActiveTransaction
        );
        assert_eq!(tx.describe("late").unwrap_err(), Error::NoActiveTransaction);
    }

    #[test]
    fn test_transact_aborts_on_error() {
        let nexus = Nexus::default();
        let reg = Register::default();

        let result: Result<()> = nexus.transact("doomed", |tx| {
            tx.push(Set::new(&reg, 5))?;
            Err(Error::NameInUse("x".into()))
        });

        assert_eq!(result.unwrap_err(), Error::NameInUse("x".into()));
        assert_eq!(value(&reg), 0);
        assert_eq!(nexus.status(), NexusStatus::Idle);
        assert!(!nexus.can_undo());
    }

    #[test]
    fn test_empty_commit_not_recorded() {
        let nexus = Nexus::default();
        nexus.transact("nothing", |_| Ok::<_, Error>(())).unwrap();
        assert_eq!(nexus.undo_count(), 0);
    }

    #[test]
    fn test_default_label() {
        let nexus = Nexus::default();
        let reg = Register::default();
        let tx = nexus.open().unwrap();
        tx.push(Set::new(&reg, 1)).unwrap();
        nexus.commit().unwrap();
        assert_eq!(nexus.undo_labels(), vec![DEFAULT_LABEL]);
    }

    #[test]
    fn test_history_bound() {
        let nexus = Nexus::new(NexusConfig { max_history: 2 });
        let reg = Register::default();
        for i in 1..=3 {
            nexus
                .transact(format!("set {i}"), |tx| tx.push(Set::new(&reg, i)))
                .unwrap();
        }
        assert_eq!(nexus.undo_labels(), vec!["set 3", "set 2"]);
    }

    #[test]
    fn test_status_events() {
        let nexus = Nexus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _watch = nexus
            .on_status_change()
            .watch(move |status| seen_clone.lock().push(*status));

        nexus.open().unwrap();
        nexus.abort().unwrap();

        assert_eq!(*seen.lock(), vec![NexusStatus::Open, NexusStatus::Idle]);
    }

    #[test]
    fn test_handler_may_reenter_nexus() {
        let nexus = Nexus::default();
        let reg = Register::default();
        let nexus_clone = nexus.clone();
        let undo_counts = Arc::new(Mutex::new(Vec::new()));
        let undo_counts_clone = undo_counts.clone();
        let _watch = nexus.on_history_change().watch(move |_| {
            undo_counts_clone.lock().push(nexus_clone.undo_count());
        });

        nexus.transact("a", |tx| tx.push(Set::new(&reg, 1))).unwrap();
        assert_eq!(*undo_counts.lock(), vec![1]);
    }

    #[test]
    fn test_clear_history_notifies() {
        let nexus = Nexus::default();
        let reg = Register::default();
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let kinds_clone = kinds.clone();
        let _watch = nexus
            .on_history_change()
            .watch(move |change| kinds_clone.lock().push(change.kind));

        nexus.transact("a", |tx| tx.push(Set::new(&reg, 1))).unwrap();
        nexus.transact("b", |tx| tx.push(Set::new(&reg, 2))).unwrap();
        nexus.undo().unwrap();
        nexus.clear_history().unwrap();

        assert!(!nexus.can_undo());
        assert!(!nexus.can_redo());
        assert_eq!(
            *kinds.lock(),
            vec![
                HistoryChangeKind::Committed,
                HistoryChangeKind::Committed,
                HistoryChangeKind::Undone,
                HistoryChangeKind::Cleared,
            ]
        );
        assert_eq!(value(&reg), 1);
    }

    #[test]
    fn test_reader_may_stage_while_commit_waits() {
        let nexus = Nexus::default();
        let reg = Register::default();
        let tx = nexus.open().unwrap();
        tx.push(Set::new(&reg, 1)).unwrap();

        std::thread::scope(|scope| {
            let reading = nexus.gate().read();
            let committer = nexus.clone();
            let commit = scope.spawn(move || committer.commit());
            std::thread::sleep(std::time::Duration::from_millis(20));

            // The commit is parked on the gate without holding the state lock
            tx.push(Set::new(&reg, 2)).unwrap();
            assert_eq!(value(&reg), 0);
            drop(reading);

            commit.join().unwrap().unwrap();
        });

        assert_eq!(value(&reg), 2);
        assert_eq!(nexus.undo_count(), 1);
    }
}
