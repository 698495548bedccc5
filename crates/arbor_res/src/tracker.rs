//! Trackers - live handles that follow a reference
//!
//! A [`Tracker`] keeps a typed handle to whatever `T` currently lives at its
//! reference's atom. It listens to the namespace for assets appearing and
//! disappearing at that atom, and to the bound target's own change event,
//! and re-publishes all three through its own events.
//!
//! Every subscription a tracker holds is a [`Watch`] stored inside it, and
//! every handler it installs only holds a weak pointer back. Dropping the
//! tracker therefore detaches everything, and nothing is delivered to it
//! afterwards.

use crate::asset::{Asset, AssetType, PropertyChanged};
use crate::atom::Atom;
use crate::namespace::Namespace;
use crate::reference::Reference;
use arbor_event::{Event, Watch};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

struct Binding<T> {
    reference: Reference<T>,
    target: Option<Arc<T>>,
    target_watch: Option<Watch>,
    /// Appear and disappear watches; `None` if the namespace was already closed
    _lifecycle: Option<(Watch, Watch)>,
}

struct TrackerShared<T> {
    binding: Mutex<Option<Binding<T>>>,
    on_acquire: Event<Arc<T>>,
    on_lose: Event<Atom>,
    on_change: Event<PropertyChanged>,
}

/// What a rebind changed
enum Transition<T> {
    None,
    Lost(Atom),
    Acquired(Arc<T>),
    Replaced(Atom, Arc<T>),
}

impl<T: AssetType> TrackerShared<T> {
    /// Re-resolve the reference and fix up the target subscription.
    /// Events are fired after the binding lock is released.
    fn rebind(self: &Arc<Self>) {
        let transition = {
            let mut binding = self.binding.lock();
            match binding.as_mut() {
                Some(binding) => self.refresh(binding),
                None => Transition::None,
            }
        };
        self.announce(transition);
    }

    fn refresh(self: &Arc<Self>, binding: &mut Binding<T>) -> Transition<T> {
        let next = binding.reference.resolve();
        let unchanged = match (&binding.target, &next) {
            (Some(current), Some(next)) => Arc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Transition::None;
        }

        binding.target_watch = next.as_ref().map(|target| self.forward(target));
        let previous = std::mem::replace(&mut binding.target, next.clone());
        let atom = binding.reference.atom().clone();
        match (previous, next) {
            (Some(_), Some(next)) => Transition::Replaced(atom, next),
            (Some(_), None) => Transition::Lost(atom),
            (None, Some(next)) => Transition::Acquired(next),
            (None, None) => Transition::None,
        }
    }

    fn forward(self: &Arc<Self>, target: &Arc<T>) -> Watch {
        let weak: Weak<Self> = Arc::downgrade(self);
        target.base().on_change().watch(move |change| {
            if let Some(shared) = weak.upgrade() {
                shared.on_change.fire(change);
            }
        })
    }

    fn announce(&self, transition: Transition<T>) {
        match transition {
            Transition::None => {}
            Transition::Lost(atom) => {
                log::trace!("Tracker lost {}", atom);
                self.on_lose.fire(&atom);
            }
            Transition::Acquired(target) => {
                log::trace!("Tracker acquired {}", target.base().atom());
                self.on_acquire.fire(&target);
            }
            Transition::Replaced(atom, target) => {
                log::trace!("Tracker target at {} replaced", atom);
                self.on_lose.fire(&atom);
                self.on_acquire.fire(&target);
            }
        }
    }
}

/// A live, type-checked handle to the asset behind a [`Reference`]
pub struct Tracker<T: AssetType> {
    shared: Arc<TrackerShared<T>>,
}

impl<T: AssetType> Tracker<T> {
    /// Create an unbound tracker
    pub fn new() -> Self {
        Self {
            shared: Arc::new(TrackerShared {
                binding: Mutex::new(None),
                on_acquire: Event::new(),
                on_lose: Event::new(),
                on_change: Event::new(),
            }),
        }
    }

    /// Create a tracker bound to `reference`
    pub fn tracking(reference: Reference<T>) -> Self {
        let tracker = Self::new();
        tracker.track(reference);
        tracker
    }

    /// Follow `reference` from now on. Fires `on_lose` for the previous
    /// target and `on_acquire` for the new one as appropriate.
    pub fn track(&self, reference: Reference<T>) {
        let lifecycle = reference
            .namespace()
            .map(|ns| self.watch_lifecycle(&ns, reference.atom()));

        let previous = {
            let mut binding = self.shared.binding.lock();
            let previous = binding.take();
            *binding = Some(Binding {
                reference,
                target: None,
                target_watch: None,
                _lifecycle: lifecycle,
            });
            previous
        };
        if let Some(previous) = previous {
            if previous.target.is_some() {
                self.shared.announce(Transition::Lost(previous.reference.atom().clone()));
            }
        }
        self.shared.rebind();
    }

    fn watch_lifecycle(&self, ns: &Namespace, atom: &Atom) -> (Watch, Watch) {
        let weak = Arc::downgrade(&self.shared);
        let appear = ns.on_asset_appear(atom, move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.rebind();
            }
        });
        let weak = Arc::downgrade(&self.shared);
        let disappear = ns.on_asset_disappear(atom, move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.rebind();
            }
        });
        (appear, disappear)
    }

    /// Stop following anything
    pub fn clear(&self) {
        let previous = self.shared.binding.lock().take();
        if let Some(previous) = previous {
            if previous.target.is_some() {
                self.shared.announce(Transition::Lost(previous.reference.atom().clone()));
            }
        }
    }

    /// The current target, if a live `T` is at the tracked atom
    pub fn get(&self) -> Option<Arc<T>> {
        self.shared
            .binding
            .lock()
            .as_ref()
            .and_then(|binding| binding.target.clone())
    }

    /// Check whether a target is bound
    pub fn ok(&self) -> bool {
        self.get().is_some()
    }

    /// The tracked reference
    pub fn reference(&self) -> Option<Reference<T>> {
        self.shared
            .binding
            .lock()
            .as_ref()
            .map(|binding| binding.reference.clone())
    }

    /// Fired with the new target whenever one is bound
    pub fn on_acquire(&self) -> &Event<Arc<T>> {
        &self.shared.on_acquire
    }

    /// Fired with the tracked atom whenever the target goes away
    pub fn on_lose(&self) -> &Event<Atom> {
        &self.shared.on_lose
    }

    /// Fired whenever a property of the current target changes
    pub fn on_change(&self) -> &Event<PropertyChanged> {
        &self.shared.on_change
    }
}

impl<T: AssetType> Default for Tracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: AssetType> fmt::Debug for Tracker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = self.shared.binding.lock();
        f.debug_struct("Tracker")
            .field("type", &T::TYPE)
            .field("atom", &binding.as_ref().map(|b| b.reference.atom().clone()))
            .field("bound", &binding.as_ref().is_some_and(|b| b.target.is_some()))
            .finish()
    }
}
