//! Background transaction indexer.
//!
//! A single tokio task decoupled from block ingestion: the append path only
//! raises a signal, and the indexer catches up on its own schedule, oldest
//! unindexed height first, a bounded batch per pass. Downstream consumers of
//! the transaction indices see eventual, not immediate, consistency.
//!
//! A block whose body fails to decode is logged and skipped — the watermark
//! still advances past it — so one malformed block cannot silently stop all
//! future indexing.

use std::sync::Arc;

use tokio::sync::broadcast;

use tidemark_store::tx_index::{AddressTxEntry, TransactionRecord};
use tidemark_store::{BlockStore, StoreError, TxIndexStore};
use tidemark_types::{Height, Transaction, TxData};

use crate::state::LedgerState;
use crate::LedgerError;

/// Encode a transaction list into a block body.
///
/// The real wire codec lives upstream of this workspace; diff producers and
/// tests use this helper so that [`LedgerState`]'s indexer can decode the
/// bodies it is handed.
pub fn encode_transactions(transactions: &[Transaction]) -> Result<Vec<u8>, LedgerError> {
    bincode::serialize(transactions).map_err(|e| LedgerError::Codec(e.to_string()))
}

fn decode_transactions(bytes: &[u8]) -> Result<Vec<Transaction>, LedgerError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    bincode::deserialize(bytes).map_err(|e| LedgerError::Codec(e.to_string()))
}

/// Indexer task body: wait for a signal (or shutdown), then index forward in
/// bounded batches until caught up.
pub(crate) async fn run(state: Arc<LedgerState>, mut shutdown: broadcast::Receiver<()>) {
    tracing::info!("transaction indexer started");
    loop {
        // Catch up first: a signal raised while indexing is retained by the
        // Notify permit, but the initial backlog predates any signal.
        loop {
            match index_next_batch(&state) {
                Ok(0) => break,
                Ok(blocks) => {
                    tracing::debug!(blocks, "indexed transaction batch");
                    tokio::task::yield_now().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "transaction indexing failed; will retry on next signal");
                    break;
                }
            }
        }

        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!("transaction indexer shutting down");
                break;
            }
            _ = state.index_signal().notified() => {}
        }
    }
}

/// Index up to one batch of unindexed blocks. Returns how many blocks were
/// processed (0 when caught up).
///
/// Each block commits in its own write batch together with the watermark
/// advance, so readers see a block's transactions all at once and a crash
/// between blocks loses nothing.
pub fn index_next_batch(state: &LedgerState) -> Result<usize, LedgerError> {
    let indexed = state.env().tx_index_store().indexed_height()?;
    let current = state.height();
    if indexed >= current {
        return Ok(0);
    }

    let upto = (indexed + state.index_batch_size() as Height).min(current);
    let block_store = state.env().block_store();
    for height in (indexed + 1)..=upto {
        let record = block_store.block_at(height)?.ok_or_else(|| {
            StoreError::Corruption(format!("no block row at height {height} below chain head"))
        })?;

        match decode_transactions(&record.bytes) {
            Ok(transactions) => index_block(state, height, &transactions)?,
            Err(e) => {
                // Isolate the failure to this block: skip it, keep going.
                tracing::error!(height, error = %e, "skipping block with undecodable body");
                let mut batch = state.env().write_batch()?;
                batch.set_indexed_height(height)?;
                batch.commit()?;
            }
        }
    }
    Ok((upto - indexed) as usize)
}

fn index_block(
    state: &LedgerState,
    height: Height,
    transactions: &[Transaction],
) -> Result<(), LedgerError> {
    let mut batch = state.env().write_batch()?;
    for tx in transactions {
        batch.put_transaction(&TransactionRecord {
            id: tx.id,
            signature: tx.signature.clone(),
            tx_type: tx.tx_type,
            height,
        })?;
        match &tx.data {
            Some(TxData::Transfer(details)) => batch.put_transfer_details(&tx.id, details)?,
            Some(TxData::Exchange(details)) => batch.put_exchange_details(&tx.id, details)?,
            None => {}
        }
        for address in tx.touched_addresses() {
            batch.put_address_tx(
                &address,
                &AddressTxEntry {
                    tx_id: tx.id,
                    signature: tx.signature.clone(),
                    height,
                },
            )?;
        }
    }
    batch.set_indexed_height(height)?;
    batch.commit()?;
    tracing::trace!(height, transactions = transactions.len(), "indexed block");
    Ok(())
}
