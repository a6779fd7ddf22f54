//! Ledger configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::LedgerError;

/// Configuration for a [`crate::LedgerState`].
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Entries held by the regular/effective balance cache.
    #[serde(default = "default_balance_cache_size")]
    pub balance_cache_size: usize,

    /// Entries held by the per-asset balance cache.
    #[serde(default = "default_asset_balance_cache_size")]
    pub asset_balance_cache_size: usize,

    /// Entries held by each of the asset quantity and asset details caches.
    #[serde(default = "default_asset_cache_size")]
    pub asset_cache_size: usize,

    /// Blocks the transaction indexer processes per wake-up pass.
    #[serde(default = "default_index_batch_size")]
    pub index_batch_size: usize,
}

impl LedgerConfig {
    /// Load a configuration from a TOML file. Missing keys fall back to the
    /// same defaults as [`LedgerConfig::default`].
    pub fn from_toml_file(path: &Path) -> Result<Self, LedgerError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("read {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| LedgerError::Config(format!("parse {}: {e}", path.display())))
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            balance_cache_size: default_balance_cache_size(),
            asset_balance_cache_size: default_asset_balance_cache_size(),
            asset_cache_size: default_asset_cache_size(),
            index_batch_size: default_index_batch_size(),
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tidemark_data")
}

fn default_map_size() -> usize {
    8 * 1024 * 1024 * 1024
}

fn default_balance_cache_size() -> usize {
    100_000
}

fn default_asset_balance_cache_size() -> usize {
    100_000
}

fn default_asset_cache_size() -> usize {
    10_000
}

fn default_index_batch_size() -> usize {
    5
}
