/*
[INPUT]:  Active read client and the target contract address
[OUTPUT]: Wholesale task-list replacement in the store
[POS]:    Read synchronizer - on-demand ledger reload, race-safe
[UPDATE]: When the read call or the stale-result fencing changes
*/

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use taskchain_adapter::Address;

use crate::session::ClientCell;
use crate::store::{Action, Store};

/// On-demand full reload of the task list; idempotent and cancel-safe.
pub struct ReadSynchronizer {
    store: Store,
    clients: ClientCell,
    contract: Address,
    seq: AtomicU64,
}

impl ReadSynchronizer {
    pub fn new(store: Store, clients: ClientCell, contract: Address) -> Self {
        Self {
            store,
            clients,
            contract,
            seq: AtomicU64::new(0),
        }
    }

    /// Reload the task collection from the ledger.
    ///
    /// No-op without a read client. Concurrent invocations are resolved by a
    /// monotonic sequence stamp: only the most recently started call applies
    /// its result. Results from before a connect/disconnect (store
    /// generation change) are likewise discarded.
    pub async fn load_tasks(&self) {
        let Some(read) = self.clients.read().await else {
            debug!("no read client installed; skipping task reload");
            return;
        };

        let my_seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let generation_at_start = self.store.generation().await;

        self.store.dispatch(Action::SetLoading(true)).await;
        self.store.dispatch(Action::ClearError).await;

        let result = read.get_tasks(&self.contract).await;

        let latest = self.seq.load(Ordering::SeqCst);
        let generation_now = self.store.generation().await;
        if my_seq == latest && generation_now == generation_at_start {
            match result {
                Ok(tasks) => {
                    debug!(count = tasks.len(), "task list reloaded");
                    self.store.dispatch(Action::SetTasks(tasks)).await;
                }
                Err(err) => {
                    // Task collection keeps its last-known value on failure.
                    self.store.dispatch(Action::Error(err.user_message())).await;
                }
            }
        } else {
            debug!(
                my_seq,
                latest,
                generation_at_start,
                generation_now,
                "discarding stale task reload result"
            );
        }

        self.store.dispatch(Action::SetLoading(false)).await;
    }
}
