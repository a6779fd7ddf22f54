//! LMDB implementation of AliasStore.
//!
//! Forward direction: `aliases` keyed by the alias's UTF-8 bytes. Reverse
//! direction: `address_aliases` keyed `addr(26) ++ alias`, value empty.
//! Alias keys were validated before they were written, so a key that fails
//! re-validation on read is a corruption error.

use heed::types::Bytes;
use heed::{Database, Env};

use tidemark_store::alias::{AliasRecord, AliasStore};
use tidemark_store::StoreError;
use tidemark_types::{Address, Alias};

use crate::keys::{prefix_bounds, prefix_upper_bound};
use crate::LmdbError;

pub struct LmdbAliasStore {
    pub(crate) env: Env,
    pub(crate) aliases_db: Database<Bytes, Bytes>,
    pub(crate) address_aliases_db: Database<Bytes, Bytes>,
}

impl AliasStore for LmdbAliasStore {
    fn resolve(&self, alias: &Alias) -> Result<Option<Address>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .aliases_db
            .get(&rtxn, alias.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let record: AliasRecord = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(record.address))
            }
            None => Ok(None),
        }
    }

    fn aliases_of(&self, address: &Address) -> Result<Vec<Alias>, StoreError> {
        let prefix = address.as_bytes().as_slice();
        let upper = prefix_upper_bound(prefix);
        let bounds = prefix_bounds(prefix, &upper);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .address_aliases_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut aliases = Vec::new();
        for entry in iter {
            let (key, _) = entry.map_err(LmdbError::from)?;
            let alias_bytes = key.get(Address::LENGTH..).ok_or_else(|| {
                StoreError::Corruption(format!("alias index key too short: {} bytes", key.len()))
            })?;
            let alias = Alias::from_utf8(alias_bytes)
                .map_err(|e| StoreError::Corruption(e.to_string()))?;
            aliases.push(alias);
        }
        Ok(aliases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use tidemark_types::AliasCreate;

    #[test]
    fn resolve_and_reverse_lookup() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("open env");

        let owner = Address::new([6; Address::LENGTH]);
        let other = Address::new([7; Address::LENGTH]);
        let first = Alias::new("merchant").expect("alias");
        let second = Alias::new("shop-01").expect("alias");

        let mut batch = env.write_batch().expect("write_batch");
        batch
            .put_alias(&AliasCreate { alias: first.clone(), address: owner }, 4)
            .expect("put_alias");
        batch
            .put_alias(&AliasCreate { alias: second.clone(), address: owner }, 4)
            .expect("put_alias");
        batch.commit().expect("commit");

        let store = env.alias_store();
        assert_eq!(store.resolve(&first).expect("resolve"), Some(owner));
        assert_eq!(
            store.resolve(&Alias::new("nobody").expect("alias")).expect("resolve"),
            None
        );

        let mut aliases = store.aliases_of(&owner).expect("aliases_of");
        aliases.sort();
        let mut expected = vec![first, second];
        expected.sort();
        assert_eq!(aliases, expected);
        assert!(store.aliases_of(&other).expect("aliases_of").is_empty());
    }
}
