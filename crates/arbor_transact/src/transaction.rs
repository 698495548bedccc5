//! Transactions - handles for staging operations
//!
//! A [`Transaction`] is what mutation primitives take as their first
//! argument. It is only a ticket: the staged log lives inside the nexus,
//! and the ticket stops working as soon as its transaction is committed or
//! aborted.

use crate::nexus::NexusShared;
use crate::operation::Operation;
use arbor_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Weak;

/// Label used when a transaction is never described
pub const DEFAULT_LABEL: &str = "Untitled transaction";

/// Unique identifier for a transaction within one nexus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub(crate) u64);

impl TransactionId {
    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

/// The staged, not yet committed, part of a transaction
pub(crate) struct OpenTransaction {
    pub(crate) id: TransactionId,
    pub(crate) label: Option<String>,
    pub(crate) log: Vec<Box<dyn Operation>>,
}

impl OpenTransaction {
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            label: None,
            log: Vec::new(),
        }
    }
}

/// Handle to an open transaction
#[derive(Clone)]
pub struct Transaction {
    id: TransactionId,
    nexus: Weak<NexusShared>,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId, nexus: Weak<NexusShared>) -> Self {
        Self { id, nexus }
    }

    /// The transaction's ID
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Check whether this transaction is still the open one
    pub fn is_open(&self) -> bool {
        self.with_open(|_| ()).is_ok()
    }

    /// Set the human-readable label recorded in the history
    pub fn describe(&self, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        self.with_open(|open| open.label = Some(label))
    }

    /// Append an operation to the mutation log
    pub fn stage(&self, op: Box<dyn Operation>) -> Result<()> {
        self.with_open(|open| {
            log::trace!("{} staged '{}'", open.id, op.describe());
            open.log.push(op);
        })
    }

    /// Append an operation (by value)
    pub fn push<O: Operation + 'static>(&self, op: O) -> Result<()> {
        self.stage(Box::new(op))
    }

    /// Number of operations staged so far
    pub fn staged(&self) -> Result<usize> {
        self.with_open(|open| open.log.len())
    }

    fn with_open<R>(&self, f: impl FnOnce(&mut OpenTransaction) -> R) -> Result<R> {
        let shared = self.nexus.upgrade().ok_or(Error::NoActiveTransaction)?;
        let mut state = shared.state.lock();
        match state.open.as_mut() {
            Some(open) if open.id == self.id => Ok(f(open)),
            _ => Err(Error::NoActiveTransaction),
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
