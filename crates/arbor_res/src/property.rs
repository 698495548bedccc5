//! Properties - transactional, observable asset fields

use crate::asset::{AssetCore, PropertyChanged};
use arbor_core::{Error, Result};
use arbor_event::Event;
use arbor_transact::{Dispatch, Operation, Transaction};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

struct PropertyCell<T> {
    name: &'static str,
    owner: Arc<AssetCore>,
    value: RwLock<T>,
    on_change: Event<T>,
}

/// A typed field of an asset.
///
/// Reads need no transaction. Writes are staged into a transaction and take
/// effect when it commits; subscribers of [`on_change`](Self::on_change)
/// then receive the new value, followed by the owning asset's
/// [`PropertyChanged`] event.
pub struct Property<T> {
    cell: Arc<PropertyCell<T>>,
}

impl<T> Property<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(owner: Arc<AssetCore>, name: &'static str, default: T) -> Self {
        Self {
            cell: Arc::new(PropertyCell {
                name,
                owner,
                value: RwLock::new(default),
                on_change: Event::new(),
            }),
        }
    }

    /// The property's name
    pub fn name(&self) -> &'static str {
        self.cell.name
    }

    /// A copy of the committed value
    pub fn get(&self) -> T {
        let _gate = self.cell.owner.gate().read();
        self.cell.value.read().clone()
    }

    /// Inspect the committed value without copying it.
    ///
    /// `f` runs inside the commit gate, so it must not commit, undo or redo.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let _gate = self.cell.owner.gate().read();
        f(&self.cell.value.read())
    }

    /// Stage a new value into `tx`
    pub fn set(&self, tx: &Transaction, value: T) -> Result<()> {
        tx.push(SetOp {
            cell: Arc::clone(&self.cell),
            value,
        })
    }

    /// Fired with the new value after each committed change, undo and redo
    pub fn on_change(&self) -> &Event<T> {
        &self.cell.on_change
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.cell.name)
            .field("value", &*self.cell.value.read())
            .finish()
    }
}

/// Swaps the staged value with the stored one. Applying and reverting are
/// the same swap, so `value` always holds whichever side is not current.
struct SetOp<T> {
    cell: Arc<PropertyCell<T>>,
    value: T,
}

impl<T> SetOp<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn swap(&mut self, out: &mut Dispatch) -> Result<()> {
        let owner = &self.cell.owner;
        if !owner.is_alive() {
            return Err(Error::AssetNotFound(owner.atom().full_path()));
        }
        std::mem::swap(&mut *self.cell.value.write(), &mut self.value);

        let cell = Arc::clone(&self.cell);
        let current = cell.value.read().clone();
        let changed = PropertyChanged {
            atom: owner.atom(),
            name: cell.name,
        };
        out.defer(move || {
            cell.on_change.fire(&current);
            cell.owner.on_change().fire(&changed);
        });
        Ok(())
    }
}

impl<T> Operation for SetOp<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn apply(&mut self, out: &mut Dispatch) -> Result<()> {
        self.swap(out)
    }

    fn revert(&mut self, out: &mut Dispatch) -> Result<()> {
        self.swap(out)
    }

    fn describe(&self) -> String {
        format!("set {}.{}", self.cell.owner.atom(), self.cell.name)
    }
}
