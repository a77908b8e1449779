/*
[INPUT]:  Injected wallet/ledger providers and the configured contract address
[OUTPUT]: UI-facing state snapshot plus the callable action surface
[POS]:    Application facade - wires store, managers, and orchestrators
[UPDATE]: When the view-layer surface gains or loses actions
*/

use std::sync::Arc;

use tracing::debug;

use taskchain_adapter::{
    chain,
    config,
    Address,
    ChainIdentity,
    ContractCall,
    EventSource,
    ReadClient,
    Result,
    WalletProvider,
    WriteClient,
};

use crate::connection::ConnectionManager;
use crate::session::ClientCell;
use crate::store::{AppState, Store};
use crate::sync::ReadSynchronizer;
use crate::watcher::EventWatcher;
use crate::writer::WriteOrchestrator;

/// The application facade handed to the view layer.
///
/// Created once at startup and alive for the process lifetime; all state
/// reaches the UI through [`TaskchainApp::snapshot`].
pub struct TaskchainApp {
    store: Store,
    clients: ClientCell,
    contract: Address,
    connection: ConnectionManager,
    sync: Arc<ReadSynchronizer>,
    watcher: EventWatcher,
    writer: WriteOrchestrator,
    read: Arc<dyn ReadClient>,
}

impl TaskchainApp {
    /// Wire the engine against injected providers.
    ///
    /// `configured_address` follows the config contract: malformed or unset
    /// values silently fall back to the default deployment.
    pub fn new(
        configured_address: Option<&str>,
        wallet: Arc<dyn WalletProvider>,
        read: Arc<dyn ReadClient>,
        write: Arc<dyn WriteClient>,
        events: Arc<dyn EventSource>,
    ) -> Self {
        let contract = config::contract_address(configured_address);
        let store = Store::new(contract.clone());
        let clients = ClientCell::new();
        let sync = Arc::new(ReadSynchronizer::new(
            store.clone(),
            clients.clone(),
            contract.clone(),
        ));
        let connection = ConnectionManager::new(
            store.clone(),
            clients.clone(),
            wallet,
            read.clone(),
            write,
        );
        let watcher = EventWatcher::new(store.clone(), sync.clone(), events);
        let writer = WriteOrchestrator::new(store.clone(), clients.clone(), contract.clone());

        Self {
            store,
            clients,
            contract,
            connection,
            sync,
            watcher,
            writer,
            read,
        }
    }

    /// Bring up the read-only session: install the read client, establish
    /// the event subscription, backfill history, and load the task list.
    /// Reads need no signer; `connect` only adds write capability.
    pub async fn start(&self) -> Result<()> {
        self.clients.set_read(Some(self.read.clone())).await;
        self.watcher.watch(&self.contract).await?;
        self.watcher.backfill(&self.contract).await;
        self.sync.load_tasks().await;
        debug!(contract = %self.contract, "engine started");
        Ok(())
    }

    /// Tear down background work (event subscription, wallet listener)
    pub async fn stop(&self) {
        self.watcher.unwatch().await;
        self.connection.shutdown().await;
    }

    pub async fn snapshot(&self) -> AppState {
        self.store.snapshot().await
    }

    pub fn contract_address(&self) -> &Address {
        &self.contract
    }

    /// Identity of the currently connected chain, for display and links
    pub async fn chain_identity(&self) -> ChainIdentity {
        let chain_id = self.store.snapshot().await.chain_id;
        chain::identify(chain_id, None)
    }

    pub async fn connect(&self) -> Result<()> {
        self.connection.connect().await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.connection.disconnect().await
    }

    pub async fn load_tasks(&self) {
        self.sync.load_tasks().await;
    }

    /// Create a task; the typical continuation is a task reload, see
    /// [`TaskchainApp::reload_on_success`]
    pub async fn create_task<F, Fut>(&self, description: String, on_success: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = ()> + Send,
    {
        self.writer
            .submit(ContractCall::CreateTask { description }, on_success)
            .await
    }

    pub async fn update_task<F, Fut>(
        &self,
        id: u64,
        description: String,
        on_success: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = ()> + Send,
    {
        self.writer
            .submit(ContractCall::UpdateTask { id, description }, on_success)
            .await
    }

    pub async fn complete_task<F, Fut>(&self, id: u64, on_success: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = ()> + Send,
    {
        self.writer
            .submit(ContractCall::CompleteTask { id }, on_success)
            .await
    }

    /// Mint tokens to `to`; no implicit reload, tokens are not tasks
    pub async fn mint<F, Fut>(&self, to: Address, on_success: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = ()> + Send,
    {
        self.writer.submit(ContractCall::Mint { to }, on_success).await
    }

    pub async fn transfer<F, Fut>(&self, to: Address, amount: u128, on_success: F) -> Result<()>
    where
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = ()> + Send,
    {
        self.writer
            .submit(ContractCall::Transfer { to, amount }, on_success)
            .await
    }

    /// Token balance of `owner`; degrades to 0 when disconnected or on any
    /// read failure rather than surfacing an error.
    pub async fn balance_of(&self, owner: &Address) -> u128 {
        if self.store.snapshot().await.account.is_none() {
            return 0;
        }
        let Some(read) = self.clients.read().await else {
            return 0;
        };
        match read.balance_of(&self.contract, owner).await {
            Ok(balance) => balance,
            Err(err) => {
                debug!(error = %err, "balance query failed");
                0
            }
        }
    }

    /// Convenience continuation that reloads the task list
    pub fn reload_on_success(&self) -> impl std::future::Future<Output = ()> + Send + use<> {
        let sync = self.sync.clone();
        async move {
            sync.load_tasks().await;
        }
    }
}
