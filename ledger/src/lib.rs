//! Height-versioned ledger state.
//!
//! [`LedgerState`] is the single ownership boundary around the persisted
//! ledger: it exclusively owns the in-memory height counter and the entity
//! caches, and exposes them only through the append/rollback/query surface.
//! No other code path can write storage, so the cache coherence contract
//! (every populated entry equals the latest committed value for its key)
//! holds by construction.
//!
//! The secondary transaction indexer runs as a tokio background task, woken
//! by a signal at the end of every successful append. It never blocks the
//! append path and readers never wait for it.

pub mod cache;
pub mod config;
pub mod error;
pub mod indexer;
pub mod state;

pub use cache::StateCaches;
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use indexer::{encode_transactions, index_next_batch};
pub use state::{AssetDescription, LeaseDetails, LedgerState};
