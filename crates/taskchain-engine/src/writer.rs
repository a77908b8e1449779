/*
[INPUT]:  State-changing contract calls and a success continuation
[OUTPUT]: Confirmed transactions with the pending flag cleared on every path
[POS]:    Write orchestrator - submit, await receipt, settle
[UPDATE]: When submission, confirmation, or flag discipline changes
*/

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use taskchain_adapter::{Address, ChainError, ContractCall, ReceiptStatus, Result, WriteClient};

use crate::session::ClientCell;
use crate::store::{Action, Store};

/// Submits state-changing transactions and blocks on their confirmation.
pub struct WriteOrchestrator {
    store: Store,
    clients: ClientCell,
    contract: Address,
}

impl WriteOrchestrator {
    pub fn new(store: Store, clients: ClientCell, contract: Address) -> Self {
        Self {
            store,
            clients,
            contract,
        }
    }

    /// Submit `call`, await its receipt, and run `on_success` only when the
    /// receipt reports success.
    ///
    /// Fails with [`ChainError::NotConnected`] before setting the pending
    /// flag when no account or write client is held. At most one write may
    /// be pending at a time; callers must check `tx_pending` before invoking
    /// `submit` again (enforced by disabling the write affordance at the
    /// boundary, not here). The pending flag is cleared exactly once on
    /// every path.
    pub async fn submit<F, Fut>(&self, call: ContractCall, on_success: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let account = self.store.snapshot().await.account;
        let write = self.clients.write().await;
        let (Some(account), Some(write)) = (account, write) else {
            let err = ChainError::NotConnected;
            self.store.dispatch(Action::Error(err.user_message())).await;
            return Err(err);
        };

        self.store.dispatch(Action::SetTxPending(true)).await;
        self.store.dispatch(Action::ClearError).await;

        let outcome = match self.run(write, &account, &call).await {
            Ok(ReceiptStatus::Success) => {
                on_success().await;
                Ok(())
            }
            Ok(ReceiptStatus::Failure) => {
                let err = ChainError::TransactionFailed;
                self.store.dispatch(Action::Error(err.user_message())).await;
                Err(err)
            }
            Err(err) => {
                self.store.dispatch(Action::Error(err.user_message())).await;
                Err(err)
            }
        };

        self.store.dispatch(Action::SetTxPending(false)).await;
        outcome
    }

    async fn run(
        &self,
        write: Arc<dyn WriteClient>,
        account: &Address,
        call: &ContractCall,
    ) -> Result<ReceiptStatus> {
        let hash = write.write_contract(&self.contract, call, account).await?;
        debug!(hash = %hash, function = call.function_name(), "transaction submitted");
        let receipt = write.wait_for_receipt(&hash).await?;
        debug!(hash = %hash, status = ?receipt.status, "transaction settled");
        Ok(receipt.status)
    }
}
