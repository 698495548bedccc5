//! References - late-bound, type-checked asset lookup
//!
//! A [`Reference`] is a weak namespace handle plus an atom. It owns nothing
//! and caches nothing; every access re-resolves the atom through the
//! namespace. Assets may store references to each other without keeping
//! their namespace alive.

use crate::asset::{downcast, Asset, AssetType};
use crate::atom::Atom;
use crate::namespace::{Namespace, NamespaceInner};
use arbor_core::{Error, Result};
use arbor_transact::Transaction;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// Resolution outcome of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefStatus {
    /// A live asset of the expected type
    Ok,
    /// A live asset of another type
    WrongType,
    /// Nothing live at the atom, or the namespace is closed
    Absent,
}

impl fmt::Display for RefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RefStatus::Ok => "OK",
            RefStatus::WrongType => "Wrong Type!",
            RefStatus::Absent => "Not Found",
        })
    }
}

/// "The asset of type `T` at this atom, if any"
pub struct Reference<T> {
    ns: Weak<NamespaceInner>,
    atom: Atom,
    _marker: PhantomData<fn() -> T>,
}

impl<T: AssetType> Reference<T> {
    /// Create a reference. Never fails.
    pub fn new(ns: &Namespace, atom: Atom) -> Self {
        Self {
            ns: ns.downgrade(),
            atom,
            _marker: PhantomData,
        }
    }

    /// The referenced atom
    pub fn atom(&self) -> &Atom {
        &self.atom
    }

    /// The namespace the atom is resolved in, while it is open
    pub fn namespace(&self) -> Option<Namespace> {
        self.ns.upgrade().map(Namespace::from_inner)
    }

    /// Human-readable path, live or not
    pub fn full_path(&self) -> String {
        self.atom.full_path()
    }

    /// Whatever is live at the atom, of any type
    pub fn get(&self) -> Option<Arc<dyn Asset>> {
        self.namespace()?.asset_at(&self.atom)
    }

    /// Resolve and classify
    pub fn status(&self) -> RefStatus {
        match self.get() {
            None => RefStatus::Absent,
            Some(asset) if asset.base().tag() == T::TYPE => RefStatus::Ok,
            Some(_) => RefStatus::WrongType,
        }
    }

    /// Check whether a live `T` is at the atom
    pub fn ok(&self) -> bool {
        self.status() == RefStatus::Ok
    }

    /// The live `T` at the atom, if any
    pub fn resolve(&self) -> Option<Arc<T>> {
        self.get().as_ref().and_then(downcast::<T>)
    }

    /// The same atom, expecting another type
    pub fn cast<U: AssetType>(&self) -> Reference<U> {
        Reference {
            ns: Weak::clone(&self.ns),
            atom: self.atom.clone(),
            _marker: PhantomData,
        }
    }

    /// Stage creation of a `T` at the atom. Fails with
    /// [`Error::AssetNotFound`] once the namespace is closed.
    pub fn create(&self, tx: &Transaction) -> Result<Arc<T>> {
        let ns = self
            .namespace()
            .ok_or_else(|| Error::AssetNotFound(self.full_path()))?;
        ns.create::<T>(tx, &self.atom)
    }

    /// Stage destruction of the `T` at the atom
    pub fn destroy(&self, tx: &Transaction) -> Result<()> {
        let not_found = || Error::AssetNotFound(self.full_path());
        let ns = self.namespace().ok_or_else(not_found)?;
        let asset = self.resolve().ok_or_else(not_found)?;
        ns.destroy(tx, asset)
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Self {
            ns: Weak::clone(&self.ns),
            atom: self.atom.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.atom == other.atom && Weak::ptr_eq(&self.ns, &other.ns)
    }
}

impl<T> Eq for Reference<T> {}

impl<T: AssetType> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("type", &T::TYPE)
            .field("atom", &self.atom)
            .finish()
    }
}
