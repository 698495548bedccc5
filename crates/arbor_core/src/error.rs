//! Error types for the core library
//!
//! Every variant here is a precondition failure: it is detected before any
//! state is mutated and leaves the nexus idle. Format errors live with the
//! codecs that raise them.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// The core error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A live asset already occupies the atom
    #[error("name in use: {0}")]
    NameInUse(String),

    /// The asset was already destroyed, or never bound
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// A mutation was staged with a handle whose transaction is not open
    #[error("no active transaction")]
    NoActiveTransaction,

    /// A transaction was opened while another one is still open
    #[error("a transaction is already open")]
    TransactionAlreadyOpen,

    /// The undo stack is empty
    #[error("nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty
    #[error("nothing to redo")]
    NothingToRedo,

    /// Dynamic creation with a type tag nobody registered
    #[error("unknown asset type: {0}")]
    UnknownAssetType(String),

    /// No service registered under the key (or registered with another type)
    #[error("service '{0}' is not registered")]
    ServiceMissing(&'static str),

    /// A service key was registered twice
    #[error("service '{0}' is already registered")]
    ServiceAlreadyRegistered(&'static str),
}

impl Error {
    /// Check whether this error came from the undo/redo stacks
    pub fn is_history_error(&self) -> bool {
        matches!(self, Error::NothingToUndo | Error::NothingToRedo)
    }

    /// Check whether this error came from the open/commit state machine
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            Error::NoActiveTransaction | Error::TransactionAlreadyOpen
        )
    }
}
