//! Commit gate
//!
//! Readers (property reads, reference resolution, namespace traversal) hold
//! the gate shared; the nexus holds it exclusively for the duration of a
//! commit, undo or redo. A reader therefore sees either the state before a
//! commit or the state after it, never a mix.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// Shared read/exclusive commit lock for one project
#[derive(Clone, Default)]
pub struct CommitGate {
    lock: Arc<RwLock<()>>,
}

impl CommitGate {
    /// Create a new gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter as a reader.
    ///
    /// Recursive: a reader may re-enter while it already holds the gate.
    /// Staging into an open transaction while holding the guard is fine. Never
    /// commit, undo or redo on the same thread while the guard is alive: the
    /// nexus waits for every reader to leave.
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read_recursive()
    }

    /// Enter as the committer
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }

    /// Check whether two handles refer to the same gate
    pub fn same_as(&self, other: &CommitGate) -> bool {
        Arc::ptr_eq(&self.lock, &other.lock)
    }
}

impl fmt::Debug for CommitGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitGate")
            .field("locked", &self.lock.is_locked_exclusive())
            .finish()
    }
}
