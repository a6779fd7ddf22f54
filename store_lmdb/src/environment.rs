//! LMDB environment setup.
//!
//! One `heed::Env` holds every named database. The environment hands out
//! cheap per-family store views (the `Env` handle and `Database` handles are
//! reference-counted/copyable) and write batches.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use tidemark_store::{MetaStore, StoreError};

use crate::alias::LmdbAliasStore;
use crate::asset::LmdbAssetStore;
use crate::balance::LmdbBalanceStore;
use crate::block::LmdbBlockStore;
use crate::lease::LmdbLeaseStore;
use crate::meta::LmdbMetaStore;
use crate::order::LmdbOrderFillStore;
use crate::tx_index::LmdbTxIndexStore;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Current on-disk schema version, written when a fresh environment is
/// created.
pub const SCHEMA_VERSION: u32 = 1;

const MAX_DBS: u32 = 20;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Env,

    // Block log.
    pub blocks_db: Database<Bytes, Bytes>,
    pub block_heights_db: Database<Bytes, Bytes>,

    // Height-versioned balance families.
    pub balances_db: Database<Bytes, Bytes>,
    pub asset_balances_db: Database<Bytes, Bytes>,
    pub lease_balances_db: Database<Bytes, Bytes>,

    // Assets.
    pub asset_info_db: Database<Bytes, Bytes>,
    pub asset_quantities_db: Database<Bytes, Bytes>,

    // Leases.
    pub lease_info_db: Database<Bytes, Bytes>,
    pub lease_status_db: Database<Bytes, Bytes>,

    // Order fills.
    pub filled_quantities_db: Database<Bytes, Bytes>,

    // Aliases, both directions.
    pub aliases_db: Database<Bytes, Bytes>,
    pub address_aliases_db: Database<Bytes, Bytes>,

    // Secondary transaction indices (built asynchronously).
    pub transactions_db: Database<Bytes, Bytes>,
    pub transfer_details_db: Database<Bytes, Bytes>,
    pub exchange_details_db: Database<Bytes, Bytes>,
    pub address_transactions_db: Database<Bytes, Bytes>,

    // Bookkeeping.
    pub meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(LmdbError::from)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)
                .map_err(LmdbError::from)?
        };

        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let blocks_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("blocks")).map_err(LmdbError::from)?;
        let block_heights_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("block_heights")).map_err(LmdbError::from)?;
        let balances_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("balances")).map_err(LmdbError::from)?;
        let asset_balances_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("asset_balances")).map_err(LmdbError::from)?;
        let lease_balances_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("lease_balances")).map_err(LmdbError::from)?;
        let asset_info_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("asset_info")).map_err(LmdbError::from)?;
        let asset_quantities_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("asset_quantities")).map_err(LmdbError::from)?;
        let lease_info_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("lease_info")).map_err(LmdbError::from)?;
        let lease_status_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("lease_status")).map_err(LmdbError::from)?;
        let filled_quantities_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("filled_quantities")).map_err(LmdbError::from)?;
        let aliases_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("aliases")).map_err(LmdbError::from)?;
        let address_aliases_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("address_aliases")).map_err(LmdbError::from)?;
        let transactions_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("transactions")).map_err(LmdbError::from)?;
        let transfer_details_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("transfer_details")).map_err(LmdbError::from)?;
        let exchange_details_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("exchange_details")).map_err(LmdbError::from)?;
        let address_transactions_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("address_transactions")).map_err(LmdbError::from)?;
        let meta_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("meta")).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        let environment = Self {
            env,
            blocks_db,
            block_heights_db,
            balances_db,
            asset_balances_db,
            lease_balances_db,
            asset_info_db,
            asset_quantities_db,
            lease_info_db,
            lease_status_db,
            filled_quantities_db,
            aliases_db,
            address_aliases_db,
            transactions_db,
            transfer_details_db,
            exchange_details_db,
            address_transactions_db,
            meta_db,
        };

        let meta = environment.meta_store();
        if meta.get_schema_version()?.is_none() {
            meta.set_schema_version(SCHEMA_VERSION)?;
        }

        Ok(environment)
    }

    /// The raw heed environment (for read transactions in tests and tools).
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Begin a write batch covering one block append (or one rollback).
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }

    // ── Per-family store views ──────────────────────────────────────────

    pub fn block_store(&self) -> LmdbBlockStore {
        LmdbBlockStore {
            env: self.env.clone(),
            blocks_db: self.blocks_db,
            block_heights_db: self.block_heights_db,
        }
    }

    pub fn balance_store(&self) -> LmdbBalanceStore {
        LmdbBalanceStore {
            env: self.env.clone(),
            balances_db: self.balances_db,
            asset_balances_db: self.asset_balances_db,
            lease_balances_db: self.lease_balances_db,
        }
    }

    pub fn asset_store(&self) -> LmdbAssetStore {
        LmdbAssetStore {
            env: self.env.clone(),
            asset_info_db: self.asset_info_db,
            asset_quantities_db: self.asset_quantities_db,
        }
    }

    pub fn lease_store(&self) -> LmdbLeaseStore {
        LmdbLeaseStore {
            env: self.env.clone(),
            lease_info_db: self.lease_info_db,
            lease_status_db: self.lease_status_db,
        }
    }

    pub fn order_fill_store(&self) -> LmdbOrderFillStore {
        LmdbOrderFillStore {
            env: self.env.clone(),
            filled_quantities_db: self.filled_quantities_db,
        }
    }

    pub fn alias_store(&self) -> LmdbAliasStore {
        LmdbAliasStore {
            env: self.env.clone(),
            aliases_db: self.aliases_db,
            address_aliases_db: self.address_aliases_db,
        }
    }

    pub fn tx_index_store(&self) -> LmdbTxIndexStore {
        LmdbTxIndexStore {
            env: self.env.clone(),
            transactions_db: self.transactions_db,
            transfer_details_db: self.transfer_details_db,
            exchange_details_db: self.exchange_details_db,
            address_transactions_db: self.address_transactions_db,
            meta_db: self.meta_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: self.env.clone(),
            meta_db: self.meta_db,
        }
    }
}
