//! Namespace mutation primitives
//!
//! These run inside [`Nexus`](arbor_transact::Nexus) commits while the
//! commit gate is held exclusively, so they touch the asset map directly
//! and never go through the gated read paths of [`Namespace`](crate::Namespace).

use crate::asset::Asset;
use crate::atom::Atom;
use crate::namespace::{AssetEvent, NamespaceInner};
use arbor_core::{Error, Result};
use arbor_transact::{Dispatch, Operation};
use std::sync::Arc;

impl NamespaceInner {
    fn bind(&self, asset: &Arc<dyn Asset>, out: &mut Dispatch) -> Result<()> {
        let base = asset.base();
        let atom = base.atom();
        let mut assets = self.assets.write();
        if assets.contains_key(&atom) {
            return Err(Error::NameInUse(atom.full_path()));
        }
        assets.insert(atom.clone(), Arc::clone(asset));
        base.core().set_alive(true);

        let on_appear = self.on_appear.clone();
        let event = AssetEvent {
            atom,
            asset: Arc::clone(asset),
        };
        out.defer(move || on_appear.fire(&event));
        Ok(())
    }

    fn unbind(&self, asset: &Arc<dyn Asset>, out: &mut Dispatch) -> Result<()> {
        let base = asset.base();
        let atom = base.atom();
        let mut assets = self.assets.write();
        match assets.get(&atom) {
            Some(bound) if bound.base().same_as(base) => {}
            _ => return Err(Error::AssetNotFound(atom.full_path())),
        }
        assets.remove(&atom);
        base.core().set_alive(false);

        let on_disappear = self.on_disappear.clone();
        let event = AssetEvent {
            atom,
            asset: Arc::clone(asset),
        };
        out.defer(move || on_disappear.fire(&event));
        Ok(())
    }

    /// Rebind a live asset at `to`. Checks both ends before touching either.
    fn relocate(&self, asset: &Arc<dyn Asset>, to: &Atom, out: &mut Dispatch) -> Result<Atom> {
        let base = asset.base();
        let from = base.atom();
        {
            let assets = self.assets.read();
            match assets.get(&from) {
                Some(bound) if bound.base().same_as(base) => {}
                _ => return Err(Error::AssetNotFound(from.full_path())),
            }
            if assets.contains_key(to) {
                return Err(Error::NameInUse(to.full_path()));
            }
        }
        self.unbind(asset, out)?;
        base.core().set_atom(to.clone());
        self.bind(asset, out)?;
        Ok(from)
    }
}

/// Bind a freshly constructed asset; inverse unbinds it
pub(crate) struct CreateOp {
    pub(crate) ns: Arc<NamespaceInner>,
    pub(crate) asset: Arc<dyn Asset>,
}

impl Operation for CreateOp {
    fn apply(&mut self, out: &mut Dispatch) -> Result<()> {
        self.ns.bind(&self.asset, out)
    }

    fn revert(&mut self, out: &mut Dispatch) -> Result<()> {
        self.ns.unbind(&self.asset, out)
    }

    fn describe(&self) -> String {
        format!("create {} at {}", self.asset.base().tag(), self.asset.base().atom())
    }
}

/// Unbind a live asset; inverse binds the same object again, property
/// values included
pub(crate) struct DestroyOp {
    pub(crate) ns: Arc<NamespaceInner>,
    pub(crate) asset: Arc<dyn Asset>,
}

impl Operation for DestroyOp {
    fn apply(&mut self, out: &mut Dispatch) -> Result<()> {
        self.ns.unbind(&self.asset, out)
    }

    fn revert(&mut self, out: &mut Dispatch) -> Result<()> {
        self.ns.bind(&self.asset, out)
    }

    fn describe(&self) -> String {
        format!("destroy {}", self.asset.base().atom())
    }
}

/// Move a live asset to another atom. The source is whatever the asset's
/// atom is when the move applies, so several moves of one asset may be
/// staged in a row.
pub(crate) struct MoveOp {
    pub(crate) ns: Arc<NamespaceInner>,
    pub(crate) asset: Arc<dyn Asset>,
    pub(crate) to: Atom,
    pub(crate) from: Option<Atom>,
}

impl Operation for MoveOp {
    fn apply(&mut self, out: &mut Dispatch) -> Result<()> {
        let from = self.ns.relocate(&self.asset, &self.to, out)?;
        self.from = Some(from);
        Ok(())
    }

    fn revert(&mut self, out: &mut Dispatch) -> Result<()> {
        let from = self
            .from
            .clone()
            .ok_or_else(|| Error::AssetNotFound(self.asset.base().atom().full_path()))?;
        self.ns.relocate(&self.asset, &from, out)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("move {} to {}", self.asset.base().atom(), self.to)
    }
}
