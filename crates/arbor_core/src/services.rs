//! Shared services
//!
//! Independent modules that need to share state (a camera, a selection, a
//! clipboard) declare a typed [`ServiceKey`] and register the value once,
//! while the application is being assembled. After [`ServicesBuilder::build`]
//! the set is frozen; lookups are typed through the key.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Typed key for a shared service
///
/// ```ignore
/// pub const CAMERA: ServiceKey<Camera> = ServiceKey::new("camera");
/// ```
pub struct ServiceKey<S> {
    name: &'static str,
    _marker: PhantomData<fn() -> S>,
}

impl<S> ServiceKey<S> {
    /// Declare a key
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The key's name
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<S> Clone for ServiceKey<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ServiceKey<S> {}

impl<S> fmt::Debug for ServiceKey<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceKey").field(&self.name).finish()
    }
}

struct ServiceEntry {
    type_id: TypeId,
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Startup-time registration of shared services
#[derive(Default)]
pub struct ServicesBuilder {
    entries: BTreeMap<&'static str, ServiceEntry>,
}

impl ServicesBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its key
    pub fn register<S: Send + Sync + 'static>(
        &mut self,
        key: ServiceKey<S>,
        service: S,
    ) -> Result<&mut Self> {
        if self.entries.contains_key(key.name) {
            return Err(Error::ServiceAlreadyRegistered(key.name));
        }
        log::debug!("Registered service '{}'", key.name);
        self.entries.insert(
            key.name,
            ServiceEntry {
                type_id: TypeId::of::<S>(),
                type_name: std::any::type_name::<S>(),
                value: Arc::new(service),
            },
        );
        Ok(self)
    }

    /// Register a service (builder pattern)
    pub fn with<S: Send + Sync + 'static>(mut self, key: ServiceKey<S>, service: S) -> Result<Self> {
        self.register(key, service)?;
        Ok(self)
    }

    /// Freeze the registrations
    pub fn build(self) -> Services {
        Services {
            entries: Arc::new(self.entries),
        }
    }
}

/// A frozen set of shared services
#[derive(Clone)]
pub struct Services {
    entries: Arc<BTreeMap<&'static str, ServiceEntry>>,
}

impl Services {
    /// An empty service set
    pub fn empty() -> Self {
        ServicesBuilder::new().build()
    }

    /// Look up a service by key
    pub fn get<S: Send + Sync + 'static>(&self, key: ServiceKey<S>) -> Result<Arc<S>> {
        let entry = self
            .entries
            .get(key.name)
            .filter(|e| e.type_id == TypeId::of::<S>())
            .ok_or(Error::ServiceMissing(key.name))?;
        Arc::clone(&entry.value)
            .downcast::<S>()
            .map_err(|_| Error::ServiceMissing(key.name))
    }

    /// Check whether a service is registered under the key
    pub fn contains<S: Send + Sync + 'static>(&self, key: ServiceKey<S>) -> bool {
        self.get(key).is_ok()
    }

    /// Names of all registered services, in name order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, e)| (k, e.type_name)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Default)]
    struct Camera {
        pitch: f32,
    }

    struct Counter(AtomicU32);

    const CAMERA: ServiceKey<Camera> = ServiceKey::new("camera");
    const COUNTER: ServiceKey<Counter> = ServiceKey::new("counter");
    const CAMERA_AS_COUNTER: ServiceKey<Counter> = ServiceKey::new("camera");

    #[test]
    fn test_register_and_get() {
        let services = ServicesBuilder::new()
            .with(CAMERA, Camera { pitch: 30.0 })
            .unwrap()
            .with(COUNTER, Counter(AtomicU32::new(0)))
            .unwrap()
            .build();

        assert_eq!(services.get(CAMERA).unwrap().pitch, 30.0);

        // Shared, not copied
        services.get(COUNTER).unwrap().0.fetch_add(1, Ordering::SeqCst);
        assert_eq!(services.get(COUNTER).unwrap().0.load(Ordering::SeqCst), 1);

        assert_eq!(services.names().collect::<Vec<_>>(), vec!["camera", "counter"]);
    }

    #[test]
    fn test_duplicate_key() {
        let mut builder = ServicesBuilder::new();
        builder.register(CAMERA, Camera::default()).unwrap();
        let err = builder.register(CAMERA, Camera::default()).err();
        assert_eq!(err, Some(Error::ServiceAlreadyRegistered("camera")));
    }

    #[test]
    fn test_missing_and_mistyped() {
        let services = ServicesBuilder::new()
            .with(CAMERA, Camera::default())
            .unwrap()
            .build();

        assert_eq!(services.get(COUNTER).err(), Some(Error::ServiceMissing("counter")));
        assert!(!services.contains(CAMERA_AS_COUNTER));
        assert!(services.contains(CAMERA));
    }
}
