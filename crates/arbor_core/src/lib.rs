//! # arbor_core - Arbor Core
//!
//! Primitives shared by every layer of the asset graph:
//! - The precondition error taxonomy raised by the namespace and the nexus
//! - Typed shared services registered once at startup

pub mod error;
pub mod services;

pub use error::*;
pub use services::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::services::{ServiceKey, Services, ServicesBuilder};
}
