//! Asset type registry
//!
//! A capability table keyed by [`TypeTag`]. Dynamic creation (importers,
//! "new asset" menus) looks the tag up here instead of inspecting types at
//! runtime.

use crate::asset::{Asset, AssetBase, AssetType, TypeTag};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Everything the namespace needs to know about one asset type
#[derive(Clone, Copy)]
pub struct AssetKind {
    /// The type's tag
    pub tag: TypeTag,
    /// Human-readable type name
    pub title: &'static str,
    construct: fn(AssetBase) -> Arc<dyn Asset>,
}

impl AssetKind {
    /// Describe a concrete asset type
    pub fn of<T: AssetType>() -> Self {
        Self {
            tag: T::TYPE,
            title: T::TITLE,
            construct: construct_erased::<T>,
        }
    }

    pub(crate) fn construct(&self, base: AssetBase) -> Arc<dyn Asset> {
        (self.construct)(base)
    }
}

fn construct_erased<T: AssetType>(base: AssetBase) -> Arc<dyn Asset> {
    Arc::new(T::construct(base))
}

impl fmt::Debug for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetKind")
            .field("tag", &self.tag)
            .field("title", &self.title)
            .finish()
    }
}

/// Registered asset types, by tag
#[derive(Clone, Default)]
pub struct AssetRegistry {
    kinds: BTreeMap<TypeTag, AssetKind>,
}

impl AssetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in asset types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register::<crate::misc::RawData>();
        registry
    }

    /// Register a type. Registering the same tag again replaces the entry.
    pub fn register<T: AssetType>(&mut self) -> &mut Self {
        let kind = AssetKind::of::<T>();
        if self.kinds.insert(kind.tag, kind).is_some() {
            log::debug!("Asset type '{}' registered again", kind.tag);
        }
        self
    }

    /// Look up a type by tag name
    pub fn get(&self, tag: &str) -> Option<&AssetKind> {
        self.kinds.values().find(|kind| kind.tag.name() == tag)
    }

    /// Look up a type by tag
    pub fn kind(&self, tag: TypeTag) -> Option<&AssetKind> {
        self.kinds.get(&tag)
    }

    /// Human-readable name for a tag, falling back to the tag itself
    pub fn title(&self, tag: TypeTag) -> &'static str {
        self.kind(tag).map(|kind| kind.title).unwrap_or(tag.name())
    }

    /// Check if a tag is registered
    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// All registered kinds, in tag order
    pub fn iter(&self) -> impl Iterator<Item = &AssetKind> {
        self.kinds.values()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds.keys()).finish()
    }
}
