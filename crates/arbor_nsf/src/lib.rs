//! # arbor_nsf - Page Container Codec
//!
//! Import and export of fixed-size 64 KiB pages. A page is decoded into a
//! [`Page`] asset whose header fields are properties and whose pagelets
//! are [`RawData`](arbor_res::RawData) children, all staged into a single
//! transaction. Export reads the committed state back.
//!
//! ```ignore
//! let mut registry = AssetRegistry::with_builtins();
//! arbor_nsf::register(&mut registry);
//! let project = Project::new(ProjectConfig::default(), registry);
//!
//! let page = project.reference::<Page>("pages/0");
//! project.nexus().transact("Create page", |tx| page.create(tx).map(|_| ()))?;
//! project.nexus().transact("Import page", |tx| {
//!     page.resolve().ok_or(Error::AssetNotFound(page.full_path()))?.import_file(tx, &bytes)
//! })?;
//! ```

pub mod binio;
pub mod error;
pub mod page;

pub use error::{ExportError, ImportError};
pub use page::{table_end, Page, PageContents, HEADER_SIZE, PAGE_MAGIC, PAGE_SIZE};

use arbor_res::{AssetRegistry, RawData};

/// Register the codec's asset types
pub fn register(registry: &mut AssetRegistry) -> &mut AssetRegistry {
    registry.register::<RawData>().register::<Page>()
}

/// A registry with the built-in types and the codec's types
pub fn registry() -> AssetRegistry {
    let mut registry = AssetRegistry::with_builtins();
    register(&mut registry);
    registry
}
