//! LMDB implementation of LeaseStore.
//!
//! The status log keys are `lease_id(32) ++ height(8)`, so one lease's rows
//! are contiguous and a single pass over the database visits every lease's
//! history in order.

use heed::types::Bytes;
use heed::{Database, Env};

use tidemark_store::lease::{LeaseInfoRecord, LeaseStore};
use tidemark_store::StoreError;
use tidemark_types::LeaseId;

use crate::keys::{prefix_bounds, prefix_upper_bound};
use crate::LmdbError;

pub struct LmdbLeaseStore {
    pub(crate) env: Env,
    pub(crate) lease_info_db: Database<Bytes, Bytes>,
    pub(crate) lease_status_db: Database<Bytes, Bytes>,
}

impl LeaseStore for LmdbLeaseStore {
    fn lease_info(&self, lease: &LeaseId) -> Result<Option<LeaseInfoRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .lease_info_db
            .get(&rtxn, lease.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn is_active(&self, lease: &LeaseId) -> Result<bool, StoreError> {
        let prefix = lease.as_bytes().as_slice();
        let upper = prefix_upper_bound(prefix);
        let bounds = prefix_bounds(prefix, &upper);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .lease_status_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut seen = false;
        for entry in iter {
            let (_, value) = entry.map_err(LmdbError::from)?;
            if value != [1u8] {
                return Ok(false);
            }
            seen = true;
        }
        Ok(seen)
    }

    fn active_leases(&self) -> Result<Vec<LeaseId>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.lease_status_db.iter(&rtxn).map_err(LmdbError::from)?;

        let mut active = Vec::new();
        let mut current: Option<(LeaseId, bool)> = None;
        for entry in iter {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let id_bytes = key.get(..32).ok_or_else(|| {
                StoreError::Corruption(format!("lease status key too short: {} bytes", key.len()))
            })?;
            let id = LeaseId::from_bytes(id_bytes)
                .map_err(|e| StoreError::Corruption(e.to_string()))?;
            let row_active = value == [1u8];

            match &mut current {
                Some((open_id, all_active)) if *open_id == id => {
                    *all_active = *all_active && row_active;
                }
                _ => {
                    if let Some((done_id, true)) = current.take() {
                        active.push(done_id);
                    }
                    current = Some((id, row_active));
                }
            }
        }
        if let Some((done_id, true)) = current {
            active.push(done_id);
        }
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use tidemark_types::{Address, LeaseCreate};

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    fn create_lease(env: &LmdbEnvironment, id: LeaseId, height: u64) {
        let mut batch = env.write_batch().expect("write_batch");
        batch
            .put_lease_info(
                &LeaseCreate {
                    lease: id,
                    sender: Address::new([1; Address::LENGTH]),
                    recipient: Address::new([2; Address::LENGTH]),
                    amount: 1000,
                },
                height,
            )
            .expect("put_lease_info");
        batch.put_lease_status(&id, height, true).expect("status");
        batch.commit().expect("commit");
    }

    #[test]
    fn lease_is_active_until_any_cancellation_row() {
        let (_dir, env) = temp_env();
        let id = LeaseId::new([3; 32]);
        create_lease(&env, id, 1);

        let store = env.lease_store();
        assert!(store.is_active(&id).expect("query"));

        let mut batch = env.write_batch().expect("write_batch");
        batch.put_lease_status(&id, 2, false).expect("cancel");
        batch.commit().expect("commit");

        assert!(!store.is_active(&id).expect("query"));

        // A later active row cannot resurrect the lease: activity is the AND
        // over the whole history.
        let mut batch = env.write_batch().expect("write_batch");
        batch.put_lease_status(&id, 3, true).expect("toggle");
        batch.commit().expect("commit");
        assert!(!store.is_active(&id).expect("query"));
    }

    #[test]
    fn unknown_lease_is_not_active() {
        let (_dir, env) = temp_env();
        assert!(!env.lease_store().is_active(&LeaseId::new([9; 32])).expect("query"));
    }

    #[test]
    fn active_leases_lists_only_all_active_histories() {
        let (_dir, env) = temp_env();
        let kept = LeaseId::new([1; 32]);
        let cancelled = LeaseId::new([2; 32]);
        create_lease(&env, kept, 1);
        create_lease(&env, cancelled, 1);

        let mut batch = env.write_batch().expect("write_batch");
        batch.put_lease_status(&cancelled, 2, false).expect("cancel");
        batch.commit().expect("commit");

        let active = env.lease_store().active_leases().expect("query");
        assert_eq!(active, vec![kept]);
    }
}
