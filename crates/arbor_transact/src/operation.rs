//! Operations - reversible mutation primitives
//!
//! An operation is staged into an open transaction and applied when the
//! transaction commits. Each operation checks its own precondition at apply
//! time; the nexus rolls back everything applied before a failing one.

use arbor_core::Result;
use std::fmt;

/// A single reversible mutation.
///
/// `apply` and `revert` must each be all-or-nothing: check the
/// precondition first and return the error before touching any state.
/// Change notifications are never fired directly; they are deferred into
/// the [`Dispatch`] and delivered only once the whole entry has applied.
pub trait Operation: Send {
    /// Perform the mutation (commit and redo)
    fn apply(&mut self, out: &mut Dispatch) -> Result<()>;

    /// Perform the inverse mutation (undo and rollback)
    fn revert(&mut self, out: &mut Dispatch) -> Result<()>;

    /// Short human-readable summary for logs
    fn describe(&self) -> String;
}

type Notice = Box<dyn FnOnce() + Send>;

/// Change notifications queued during a commit.
///
/// The queue is run in order after the nexus has released the commit gate,
/// or dropped unrun if the commit is rolled back.
#[derive(Default)]
pub struct Dispatch {
    pending: Vec<Notice>,
}

impl Dispatch {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification
    pub fn defer<F>(&mut self, notice: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pending.push(Box::new(notice));
    }

    /// Number of queued notifications
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every queued notification without running it
    pub(crate) fn discard(&mut self) {
        self.pending.clear();
    }

    /// Deliver every queued notification, in queue order
    pub(crate) fn run(self) {
        for notice in self.pending {
            notice();
        }
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Apply `ops` in log order. On the first failure, revert the applied
/// prefix in reverse order and drop every queued notification.
pub(crate) fn apply_forward(ops: &mut [Box<dyn Operation>], out: &mut Dispatch) -> Result<()> {
    for i in 0..ops.len() {
        if let Err(err) = ops[i].apply(out) {
            log::trace!("Operation '{}' rejected: {}", ops[i].describe(), err);
            let mut scratch = Dispatch::new();
            for op in ops[..i].iter_mut().rev() {
                if let Err(rollback) = op.revert(&mut scratch) {
                    log::error!("Rollback of '{}' failed: {}", op.describe(), rollback);
                }
            }
            out.discard();
            return Err(err);
        }
    }
    Ok(())
}

/// Revert `ops` in reverse log order. On the first failure, re-apply the
/// already reverted suffix and drop every queued notification.
pub(crate) fn apply_backward(ops: &mut [Box<dyn Operation>], out: &mut Dispatch) -> Result<()> {
    for i in (0..ops.len()).rev() {
        if let Err(err) = ops[i].revert(out) {
            log::trace!("Inverse of '{}' rejected: {}", ops[i].describe(), err);
            let mut scratch = Dispatch::new();
            for op in ops[i + 1..].iter_mut() {
                if let Err(rollforward) = op.apply(&mut scratch) {
                    log::error!("Re-apply of '{}' failed: {}", op.describe(), rollforward);
                }
            }
            out.discard();
            return Err(err);
        }
    }
    Ok(())
}
