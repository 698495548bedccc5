//! # arbor_res - Transactional Resource Graph
//!
//! The in-memory asset store of an editor project. Every asset lives at an
//! [`Atom`] in a [`Namespace`], exposes its state as [`Property`] fields, and
//! is only ever created, destroyed, moved or modified through a transaction
//! committed by the project's [`Nexus`](arbor_transact::Nexus).
//!
//! ## Access patterns
//!
//! ```text
//! reads:   Reference<T> / Tracker<T> ──► Namespace ──► Asset ──► Property::get
//! writes:  Transaction ──► Namespace::create / destroy / rename, Property::set
//! events:  Property::on_change ──► Asset::on_change ──► Tracker::on_change
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let project = Project::new(ProjectConfig::default(), AssetRegistry::with_builtins());
//! let blob = project.reference::<RawData>("root/blob");
//!
//! project.nexus().transact("Create blob", |tx| {
//!     let data = blob.create(tx)?;
//!     data.data.set(tx, vec![1, 2, 3])
//! })?;
//!
//! assert!(blob.ok());
//! ```

pub mod asset;
pub mod atom;
pub mod misc;
pub mod namespace;
mod ops;
pub mod project;
pub mod property;
pub mod reference;
pub mod registry;
pub mod tracker;

pub use asset::{downcast, AsAnyArc, Asset, AssetBase, AssetType, PropertyChanged, TypeTag};
pub use atom::Atom;
pub use misc::RawData;
pub use namespace::{AssetEvent, Namespace};
pub use project::{Project, ProjectConfig};
pub use property::Property;
pub use reference::{RefStatus, Reference};
pub use registry::{AssetKind, AssetRegistry};
pub use tracker::Tracker;

/// Prelude
pub mod prelude {
    pub use crate::{
        Asset, AssetBase, AssetRegistry, AssetType, Atom, Namespace, Project, ProjectConfig,
        Property, RawData, RefStatus, Reference, Tracker, TypeTag,
    };
    pub use arbor_core::{Error, Result};
    pub use arbor_transact::{Nexus, Transaction};
}
