/*
[INPUT]:  Wallet and ledger capabilities required by the engine
[OUTPUT]: Provider trait seams plus the subscription teardown handle
[POS]:    Provider layer - boundary between engine and chain transport
[UPDATE]: When the consumed wallet/ledger interface changes
*/

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::{
    Address,
    ContractCall,
    RawEvent,
    Receipt,
    RevokeOutcome,
    Task,
    TxHash,
    WalletNotification,
};

mod mock;

pub use mock::{
    completed_event,
    created_event,
    updated_event,
    MockLedger,
    MockWallet,
    MINT_AMOUNT,
};

/// Read-only ledger access; available independent of signer presence
#[async_trait]
pub trait ReadClient: Send + Sync {
    /// Full task list as of the latest block
    async fn get_tasks(&self, contract: &Address) -> Result<Vec<Task>>;

    /// Token balance of `owner`
    async fn balance_of(&self, contract: &Address, owner: &Address) -> Result<u128>;
}

/// State-changing ledger access; requires a held signer
#[async_trait]
pub trait WriteClient: Send + Sync {
    /// Submit a state-changing call and return its transaction hash
    async fn write_contract(
        &self,
        contract: &Address,
        call: &ContractCall,
        account: &Address,
    ) -> Result<TxHash>;

    /// Block until the transaction is included and return its receipt
    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt>;
}

/// Contract event notifications, live and historical
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Subscribe to decoded event batches for `contract`.
    ///
    /// The returned [`EventSubscription`] unsubscribes on drop; the channel
    /// closes once the subscription is torn down.
    async fn subscribe(
        &self,
        contract: &Address,
    ) -> Result<(EventSubscription, mpsc::Receiver<Vec<RawEvent>>)>;

    /// Historical events for `contract` from genesis to the latest block
    async fn fetch_past(&self, contract: &Address) -> Result<Vec<RawEvent>>;
}

/// Injected wallet provider (account access, revocation, notifications)
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request account access; first entry is the active account
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Currently selected chain id
    async fn chain_id(&self) -> Result<u64>;

    /// Ask the wallet to revoke previously granted account permissions
    async fn revoke_permissions(&self) -> Result<RevokeOutcome>;

    /// Stream of account/network change notifications
    async fn subscribe_notifications(&self) -> Result<mpsc::Receiver<WalletNotification>>;
}

/// Teardown handle for an event subscription.
///
/// `subscribe`/`unsubscribe` are paired and idempotent: dropping the handle
/// unsubscribes, and an explicit call after that is a no-op.
pub struct EventSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl EventSubscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(teardown) = self.unsubscribe.take() {
            teardown();
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(teardown) = self.unsubscribe.take() {
            teardown();
        }
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
