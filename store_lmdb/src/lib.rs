//! LMDB storage backend for the tidemark ledger store.
//!
//! Implements all storage traits from `tidemark-store` using the `heed` LMDB
//! bindings. Each entity family maps to one named LMDB database within a
//! single environment; history rows use composite keys with a big-endian
//! height suffix so that "latest at or below a height" is one reverse range
//! scan.
//!
//! Reads open their own short-lived read transactions (LMDB MVCC), so any
//! number of readers run concurrently with the single writer. All writes of
//! one block append go through [`WriteBatch`], which wraps a single LMDB
//! write transaction.

pub mod alias;
pub mod asset;
pub mod balance;
pub mod block;
pub mod environment;
pub mod error;
pub(crate) mod keys;
pub mod lease;
pub mod meta;
pub mod order;
pub mod tx_index;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use write_batch::WriteBatch;
