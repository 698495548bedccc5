//! Namespaces - the atom to asset mapping of one project
//!
//! The namespace exclusively owns every live asset. Readers go through the
//! project's commit gate; the mapping itself only changes inside nexus
//! commits, through the operations staged by [`Namespace::create`],
//! [`Namespace::destroy`] and [`Namespace::rename`].

use crate::asset::{Asset, AssetBase, AssetType, TypeTag};
use crate::atom::Atom;
use crate::ops::{CreateOp, DestroyOp, MoveOp};
use crate::reference::Reference;
use crate::registry::AssetRegistry;
use arbor_core::{Error, Result};
use arbor_event::{Event, Watch};
use arbor_transact::{CommitGate, Transaction};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::sync::{Arc, Weak};

/// An asset appearing at or disappearing from an atom
#[derive(Clone)]
pub struct AssetEvent {
    /// The atom involved
    pub atom: Atom,
    /// The asset that appeared or disappeared
    pub asset: Arc<dyn Asset>,
}

impl fmt::Debug for AssetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetEvent")
            .field("atom", &self.atom)
            .field("tag", &self.asset.base().tag())
            .finish()
    }
}

pub(crate) struct NamespaceInner {
    pub(crate) gate: CommitGate,
    pub(crate) assets: RwLock<BTreeMap<Atom, Arc<dyn Asset>>>,
    pub(crate) on_appear: Event<AssetEvent>,
    pub(crate) on_disappear: Event<AssetEvent>,
    pub(crate) registry: AssetRegistry,
}

/// Handle to a project's namespace
#[derive(Clone)]
pub struct Namespace {
    inner: Arc<NamespaceInner>,
}

impl Namespace {
    /// Create an empty namespace whose readers use `gate`
    pub fn new(gate: CommitGate, registry: AssetRegistry) -> Self {
        Self {
            inner: Arc::new(NamespaceInner {
                gate,
                assets: RwLock::new(BTreeMap::new()),
                on_appear: Event::new(),
                on_disappear: Event::new(),
                registry,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<NamespaceInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<NamespaceInner> {
        Arc::downgrade(&self.inner)
    }

    /// Turn a path into an atom. Never fails.
    pub fn resolve(&self, path: &str) -> Atom {
        Atom::resolve(path)
    }

    /// The asset at `atom`, if one is live there
    pub fn asset_at(&self, atom: &Atom) -> Option<Arc<dyn Asset>> {
        let _gate = self.inner.gate.read();
        self.inner.assets.read().get(atom).cloned()
    }

    /// Check whether an asset is live at `atom`
    pub fn contains(&self, atom: &Atom) -> bool {
        let _gate = self.inner.gate.read();
        self.inner.assets.read().contains_key(atom)
    }

    /// Immediate children of `atom` with a live asset at them, in name order
    pub fn children_of(&self, atom: &Atom) -> Vec<Atom> {
        let _gate = self.inner.gate.read();
        let assets = self.inner.assets.read();
        subtree(&assets, atom)
            .filter(|key| key.parent().as_ref() == Some(atom))
            .cloned()
            .collect()
    }

    /// Immediate children of `atom` that have a live asset somewhere in
    /// their subtree, in name order. A branch need not be live itself.
    pub fn branches_of(&self, atom: &Atom) -> Vec<Atom> {
        let _gate = self.inner.gate.read();
        let assets = self.inner.assets.read();
        let mut branches: Vec<Atom> = Vec::new();
        for key in subtree(&assets, atom) {
            if let Some(branch) = atom.child_toward(key) {
                if branches.last() != Some(&branch) {
                    branches.push(branch);
                }
            }
        }
        branches
    }

    /// Every live asset strictly below `atom`, in path order
    pub fn descendants(&self, atom: &Atom) -> Vec<(Atom, Arc<dyn Asset>)> {
        let _gate = self.inner.gate.read();
        let assets = self.inner.assets.read();
        subtree(&assets, atom)
            .filter(|key| *key != atom)
            .map(|key| (key.clone(), Arc::clone(&assets[key])))
            .collect()
    }

    /// Every live asset, in path order
    pub fn assets(&self) -> Vec<(Atom, Arc<dyn Asset>)> {
        let _gate = self.inner.gate.read();
        self.inner
            .assets
            .read()
            .iter()
            .map(|(atom, asset)| (atom.clone(), Arc::clone(asset)))
            .collect()
    }

    /// Number of live assets
    pub fn len(&self) -> usize {
        let _gate = self.inner.gate.read();
        self.inner.assets.read().len()
    }

    /// Check if no asset is live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The registered asset types
    pub fn registry(&self) -> &AssetRegistry {
        &self.inner.registry
    }

    /// The gate this namespace's readers hold
    pub fn gate(&self) -> &CommitGate {
        &self.inner.gate
    }

    /// Fired for every asset that appears, after its commit
    pub fn on_appear(&self) -> &Event<AssetEvent> {
        &self.inner.on_appear
    }

    /// Fired for every asset that disappears, after its commit
    pub fn on_disappear(&self) -> &Event<AssetEvent> {
        &self.inner.on_disappear
    }

    /// Watch for an asset appearing at exactly `atom`
    #[must_use = "dropping the Watch immediately unsubscribes the handler"]
    pub fn on_asset_appear<F>(&self, atom: &Atom, handler: F) -> Watch
    where
        F: Fn(&AssetEvent) + Send + Sync + 'static,
    {
        let atom = atom.clone();
        self.inner.on_appear.watch(move |event| {
            if event.atom == atom {
                handler(event);
            }
        })
    }

    /// Watch for the asset at exactly `atom` disappearing
    #[must_use = "dropping the Watch immediately unsubscribes the handler"]
    pub fn on_asset_disappear<F>(&self, atom: &Atom, handler: F) -> Watch
    where
        F: Fn(&AssetEvent) + Send + Sync + 'static,
    {
        let atom = atom.clone();
        self.inner.on_disappear.watch(move |event| {
            if event.atom == atom {
                handler(event);
            }
        })
    }

    /// Stage creation of a default-initialized `T` at `atom`.
    ///
    /// The returned asset is not live until `tx` commits; property writes
    /// staged on it after this call apply once it is bound. Fails at commit
    /// with [`Error::NameInUse`] if the atom is occupied by then.
    pub fn create<T: AssetType>(&self, tx: &Transaction, atom: &Atom) -> Result<Arc<T>> {
        let asset = Arc::new(T::construct(self.new_base(atom, T::TYPE)));
        tx.push(CreateOp {
            ns: Arc::clone(&self.inner),
            asset: asset.clone(),
        })?;
        Ok(asset)
    }

    /// Stage creation of an asset of a registered type, by tag name
    pub fn create_dynamic(
        &self,
        tx: &Transaction,
        atom: &Atom,
        tag: &str,
    ) -> Result<Arc<dyn Asset>> {
        let kind = self
            .inner
            .registry
            .get(tag)
            .ok_or_else(|| Error::UnknownAssetType(tag.to_string()))?;
        let asset = kind.construct(self.new_base(atom, kind.tag));
        tx.push(CreateOp {
            ns: Arc::clone(&self.inner),
            asset: Arc::clone(&asset),
        })?;
        Ok(asset)
    }

    /// Stage destruction of `asset`. Fails at commit with
    /// [`Error::AssetNotFound`] if it is no longer live.
    pub fn destroy(&self, tx: &Transaction, asset: Arc<dyn Asset>) -> Result<()> {
        tx.push(DestroyOp {
            ns: Arc::clone(&self.inner),
            asset,
        })
    }

    /// Stage destruction of whatever is live at `atom` now
    pub fn destroy_at(&self, tx: &Transaction, atom: &Atom) -> Result<()> {
        let asset = self
            .asset_at(atom)
            .ok_or_else(|| Error::AssetNotFound(atom.full_path()))?;
        self.destroy(tx, asset)
    }

    /// Stage a move of `asset` to `to`. Watchers see it disappear from its
    /// old atom, then appear at the new one.
    pub fn rename(&self, tx: &Transaction, asset: Arc<dyn Asset>, to: &Atom) -> Result<()> {
        tx.push(MoveOp {
            ns: Arc::clone(&self.inner),
            asset,
            to: to.clone(),
            from: None,
        })
    }

    /// A typed reference to `path`
    pub fn reference<T: AssetType>(&self, path: &str) -> Reference<T> {
        Reference::new(self, Atom::resolve(path))
    }

    /// A typed reference to `atom`
    pub fn reference_at<T: AssetType>(&self, atom: &Atom) -> Reference<T> {
        Reference::new(self, atom.clone())
    }

    /// Check whether two handles refer to the same namespace
    pub fn same_as(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn new_base(&self, atom: &Atom, tag: TypeTag) -> AssetBase {
        AssetBase::new(atom.clone(), tag, &self.inner)
    }
}

/// `atom` and every key below it
fn subtree<'a>(
    assets: &'a BTreeMap<Atom, Arc<dyn Asset>>,
    atom: &'a Atom,
) -> impl Iterator<Item = &'a Atom> + 'a {
    assets
        .range::<Atom, _>((Bound::Included(atom), Bound::Unbounded))
        .map(|(key, _)| key)
        .take_while(move |key| atom.contains(key))
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("assets", &self.inner.assets.read().len())
            .field("registry", &self.inner.registry)
            .finish()
    }
}
