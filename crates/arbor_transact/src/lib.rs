//! # arbor_transact - Transaction Nexus
//!
//! Every mutation of the asset graph is staged into a transaction and
//! committed atomically by the [`Nexus`]. Committed transactions form a
//! linear history that can be undone and redone.
//!
//! ## Architecture
//!
//! ```text
//! Panel / Importer ──► Transaction (staged ops) ──► Nexus::commit ──► Assets
//!                                                        │
//!                                                        └──► undo / redo stacks
//! ```
//!
//! ## Key Concepts
//!
//! - **Operation**: one reversible mutation primitive (create, destroy, set)
//! - **Transaction**: a handle used to stage operations while it is open
//! - **CommitGate**: the read/write gate that keeps readers out of a commit
//! - **Dispatch**: change notifications deferred until a commit succeeds
//!
//! ## State machine
//!
//! ```text
//! Idle ──open──► Open ──commit──► Validating ──► Committed ──► Idle
//!                  │                   └───────► Aborted ────► Idle
//!                  └──abort──────────────────────────────────► Idle
//! ```

pub mod config;
pub mod gate;
pub mod history;
pub mod nexus;
pub mod operation;
pub mod transaction;

pub use config::{NexusConfig, DEFAULT_MAX_HISTORY};
pub use gate::CommitGate;
pub use history::{HistoryChange, HistoryChangeKind};
pub use nexus::{Nexus, NexusStatus};
pub use operation::{Dispatch, Operation};
pub use transaction::{Transaction, TransactionId, DEFAULT_LABEL};
