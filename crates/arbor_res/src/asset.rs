//! Assets - typed, named, transactable objects
//!
//! Every concrete asset type embeds an [`AssetBase`] (its atom, type tag,
//! liveness flag and asset-level change event) and builds its
//! [`Property`] fields from it in [`AssetType::construct`].
//!
//! Polymorphic dispatch goes through the [`TypeTag`]: callers compare tags
//! (or look the tag up in the [`AssetRegistry`](crate::AssetRegistry)) and
//! only then downcast.

use crate::atom::Atom;
use crate::namespace::{Namespace, NamespaceInner};
use crate::property::Property;
use arbor_event::Event;
use arbor_transact::CommitGate;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Stable name of a concrete asset type, e.g. `"misc::raw_data"`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Declare a tag
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The tag's name
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Fired on an asset after one of its properties changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChanged {
    /// Where the asset lived when the change applied
    pub atom: Atom,
    /// The property's name
    pub name: &'static str,
}

/// Upcast an `Arc` of a concrete asset to `Arc<dyn Any>`
pub trait AsAnyArc {
    /// Convert to an `Any` handle
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// An object owned by a namespace
pub trait Asset: AsAnyArc + Send + Sync + 'static {
    /// The embedded base record
    fn base(&self) -> &AssetBase;
}

/// A concrete asset type that can be created by tag
pub trait AssetType: Asset + Sized {
    /// The type's tag
    const TYPE: TypeTag;

    /// Human-readable type name
    const TITLE: &'static str;

    /// Build a default-initialized instance around `base`
    fn construct(base: AssetBase) -> Self;
}

/// Downcast an asset after checking its tag
pub fn downcast<T: AssetType>(asset: &Arc<dyn Asset>) -> Option<Arc<T>> {
    if asset.base().tag() != T::TYPE {
        return None;
    }
    Arc::clone(asset).into_any().downcast::<T>().ok()
}

pub(crate) struct AssetCore {
    atom: RwLock<Atom>,
    tag: TypeTag,
    alive: AtomicBool,
    gate: CommitGate,
    ns: Weak<NamespaceInner>,
    on_change: Event<PropertyChanged>,
}

impl AssetCore {
    pub(crate) fn atom(&self) -> Atom {
        self.atom.read().clone()
    }

    pub(crate) fn set_atom(&self, atom: Atom) {
        *self.atom.write() = atom;
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub(crate) fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    pub(crate) fn gate(&self) -> &CommitGate {
        &self.gate
    }

    pub(crate) fn on_change(&self) -> &Event<PropertyChanged> {
        &self.on_change
    }
}

/// State shared by every asset regardless of type
#[derive(Clone)]
pub struct AssetBase {
    core: Arc<AssetCore>,
}

impl AssetBase {
    pub(crate) fn new(atom: Atom, tag: TypeTag, ns: &Arc<NamespaceInner>) -> Self {
        Self {
            core: Arc::new(AssetCore {
                atom: RwLock::new(atom),
                tag,
                alive: AtomicBool::new(false),
                gate: ns.gate.clone(),
                ns: Arc::downgrade(ns),
                on_change: Event::new(),
            }),
        }
    }

    /// Declare a property owned by this asset
    pub fn property<T>(&self, name: &'static str, default: T) -> Property<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        Property::new(Arc::clone(&self.core), name, default)
    }

    /// Where the asset currently lives
    pub fn atom(&self) -> Atom {
        self.core.atom()
    }

    /// The concrete type's tag
    pub fn tag(&self) -> TypeTag {
        self.core.tag
    }

    /// Check whether the asset is bound in its namespace
    pub fn is_alive(&self) -> bool {
        self.core.is_alive()
    }

    /// The namespace that owns the asset (`None` once it is gone)
    pub fn namespace(&self) -> Option<Namespace> {
        self.core.ns.upgrade().map(Namespace::from_inner)
    }

    /// Fired after any property of this asset changes
    pub fn on_change(&self) -> &Event<PropertyChanged> {
        self.core.on_change()
    }

    /// Check whether two bases belong to the same asset
    pub fn same_as(&self, other: &AssetBase) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    pub(crate) fn core(&self) -> &Arc<AssetCore> {
        &self.core
    }
}

impl fmt::Debug for AssetBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetBase")
            .field("atom", &self.core.atom())
            .field("tag", &self.core.tag)
            .field("alive", &self.core.is_alive())
            .finish()
    }
}

impl fmt::Debug for dyn Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.base(), f)
    }
}
