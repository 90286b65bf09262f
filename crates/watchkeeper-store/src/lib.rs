//! # Watchkeeper Store
//!
//! Persisted alert deduplication state.
//!
//! ## Features
//!
//! - One record per alert key holding the time of the last successful dispatch
//! - Atomic whole-file replacement (temp file + rename)
//! - Advisory file lock serialising overlapping invocations
//! - Corrupt or unreadable stores load as empty

pub mod dedup;
pub mod error;
pub mod lock;
pub mod record;
pub mod store;

pub use dedup::{AlertState, Deduplicator};
pub use error::StoreError;
pub use lock::StoreLock;
pub use record::{AlertKey, AlertRecord};
pub use store::{AlertStore, FileAlertStore, MemoryAlertStore};
