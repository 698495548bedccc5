//! # arbor_event - Observer Lists
//!
//! Explicit, per-source observer lists with:
//! - Synchronous delivery on the firing thread
//! - Deterministic order (subscription order)
//! - Scoped subscriptions (`Watch` guards unsubscribe on drop)
//!
//! There is no global bus. Every property, namespace and nexus owns the
//! events it fires, and observers subscribe to exactly the source they care
//! about.
//!
//! A handler detached while a `fire` is in flight is skipped for the rest of
//! that dispatch, so nothing is ever delivered to an observer after its
//! `Watch` has been dropped.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Event handler function type
pub type Handler<A> = Box<dyn Fn(&A) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(pub u64);

struct Slot<A> {
    id: SubscriberId,
    live: AtomicBool,
    handler: Handler<A>,
}

struct EventInner<A> {
    slots: Mutex<Vec<Arc<Slot<A>>>>,
    next_id: AtomicU64,
}

impl<A> EventInner<A> {
    fn detach(&self, id: SubscriberId) {
        let mut slots = self.slots.lock();
        if let Some(pos) = slots.iter().position(|s| s.id == id) {
            let slot = slots.remove(pos);
            slot.live.store(false, Ordering::Release);
        }
    }
}

/// A list of observers for values of type `A`.
///
/// Cloning an `Event` yields another handle to the same observer list.
pub struct Event<A> {
    inner: Arc<EventInner<A>>,
}

impl<A: 'static> Event<A> {
    /// Create an event with no subscribers
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EventInner {
                slots: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribe a handler. The subscription lives as long as the returned
    /// [`Watch`].
    #[must_use = "dropping the Watch immediately unsubscribes the handler"]
    pub fn watch<F>(&self, handler: F) -> Watch
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.slots.lock().push(Arc::new(Slot {
            id,
            live: AtomicBool::new(true),
            handler: Box::new(handler),
        }));

        let weak: Weak<EventInner<A>> = Arc::downgrade(&self.inner);
        Watch {
            id,
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.detach(id);
                }
            })),
        }
    }

    /// Deliver `arg` to every live subscriber, in subscription order.
    ///
    /// The subscriber list is snapshotted before delivery, so handlers may
    /// subscribe or unsubscribe freely. Subscribers added during the dispatch
    /// are not called for this value.
    pub fn fire(&self, arg: &A) {
        let snapshot: Vec<Arc<Slot<A>>> = self.inner.slots.lock().clone();
        for slot in snapshot {
            if slot.live.load(Ordering::Acquire) {
                (slot.handler)(arg);
            }
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.slots.lock().len()
    }

    /// Check whether anything is subscribed
    pub fn has_subscribers(&self) -> bool {
        !self.inner.slots.lock().is_empty()
    }
}

impl<A: 'static> Default for Event<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for Event<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.inner.slots.lock().len())
            .finish()
    }
}

/// A live subscription. Dropping it unsubscribes the handler.
pub struct Watch {
    id: SubscriberId,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Watch {
    /// The subscriber ID of this watch
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Unsubscribe now (equivalent to dropping)
    pub fn detach(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl fmt::Debug for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Watch").field(&self.id).finish()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, SubscriberId, Watch};
}
