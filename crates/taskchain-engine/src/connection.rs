/*
[INPUT]:  Injected wallet provider plus read/write client handles
[OUTPUT]: Connection identity transitions and wallet notification routing
[POS]:    Connection manager - wallet handshake and session lifecycle
[UPDATE]: When the wallet handshake or notification handling changes
*/

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use taskchain_adapter::{
    ChainError,
    ReadClient,
    Result,
    RevokeOutcome,
    RpcFault,
    WalletNotification,
    WalletProvider,
    WriteClient,
};

use crate::session::ClientCell;
use crate::store::{Action, Store};

struct ListenerGuard {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the wallet-provider handshake and the passive notification listener.
pub struct ConnectionManager {
    store: Store,
    clients: ClientCell,
    wallet: Arc<dyn WalletProvider>,
    read: Arc<dyn ReadClient>,
    write: Arc<dyn WriteClient>,
    listener: Mutex<Option<ListenerGuard>>,
}

impl ConnectionManager {
    pub fn new(
        store: Store,
        clients: ClientCell,
        wallet: Arc<dyn WalletProvider>,
        read: Arc<dyn ReadClient>,
        write: Arc<dyn WriteClient>,
    ) -> Self {
        Self {
            store,
            clients,
            wallet,
            read,
            write,
            listener: Mutex::new(None),
        }
    }

    /// Request account access and establish the signed session.
    ///
    /// A missing wallet provider is a silent no-op; every other failure is
    /// normalized into the store's error field.
    pub async fn connect(&self) -> Result<()> {
        let accounts = match self.wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(ChainError::NoWallet) => {
                debug!("no wallet provider injected; connect is a no-op");
                return Ok(());
            }
            Err(err) => {
                self.store.dispatch(Action::Error(err.user_message())).await;
                return Err(err);
            }
        };
        let Some(account) = accounts.into_iter().next() else {
            let err = ChainError::Provider(RpcFault::with_message(
                "wallet returned no accounts",
            ));
            self.store.dispatch(Action::Error(err.user_message())).await;
            return Err(err);
        };
        let chain_id = match self.wallet.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                self.store.dispatch(Action::Error(err.user_message())).await;
                return Err(err);
            }
        };

        self.clients.set_read(Some(self.read.clone())).await;
        self.clients.set_write(Some(self.write.clone())).await;
        self.store
            .dispatch(Action::SetClients {
                account: Some(account.clone()),
                chain_id: Some(chain_id),
                has_signer: true,
            })
            .await;
        self.store
            .dispatch(Action::Notice(format!(
                "Wallet connected: {}",
                account.truncated()
            )))
            .await;

        self.install_listener().await?;
        Ok(())
    }

    /// Revoke wallet grants and clear the local session.
    ///
    /// If revocation is unsupported or fails, local state is deliberately
    /// left intact: the wallet still considers itself connected and clearing
    /// here would desync the two sides.
    pub async fn disconnect(&self) -> Result<()> {
        let outcome = match self.wallet.revoke_permissions().await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.store.dispatch(Action::Error(err.user_message())).await;
                return Err(err);
            }
        };
        match outcome {
            RevokeOutcome::Revoked => {
                self.clear_session().await;
                Ok(())
            }
            RevokeOutcome::Unsupported => {
                let err = ChainError::Provider(RpcFault::with_message(
                    "wallet does not support permission revocation",
                ));
                self.store.dispatch(Action::Error(err.user_message())).await;
                Err(err)
            }
            RevokeOutcome::Failed(fault) => {
                let err = ChainError::Provider(fault);
                self.store.dispatch(Action::Error(err.user_message())).await;
                Err(err)
            }
        }
    }

    /// Tear down the notification listener; nothing fires after this returns.
    pub async fn shutdown(&self) {
        let guard = self.listener.lock().await.take();
        if let Some(guard) = guard {
            guard.token.cancel();
            let _ = guard.handle.await;
        }
    }

    async fn clear_session(&self) {
        self.clients.clear().await;
        self.store
            .dispatch(Action::SetClients {
                account: None,
                chain_id: None,
                has_signer: false,
            })
            .await;
        self.shutdown().await;
    }

    /// Install the wallet notification listener, exactly once per session.
    async fn install_listener(&self) -> Result<()> {
        let mut listener = self.listener.lock().await;
        if listener.is_some() {
            return Ok(());
        }

        let mut rx = self.wallet.subscribe_notifications().await?;
        let token = CancellationToken::new();
        let task_token = token.clone();
        let store = self.store.clone();
        let clients = self.clients.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    notification = rx.recv() => {
                        let Some(notification) = notification else { break };
                        route_notification(&store, &clients, notification).await;
                    }
                }
            }
        });

        *listener = Some(ListenerGuard { token, handle });
        Ok(())
    }
}

async fn route_notification(store: &Store, clients: &ClientCell, notification: WalletNotification) {
    match notification {
        WalletNotification::AccountsChanged(accounts) => match accounts.into_iter().next() {
            Some(account) => {
                debug!(account = %account, "wallet account changed");
                store.dispatch(Action::SetAccount(Some(account))).await;
            }
            None => {
                // Empty account list is a wallet-side disconnect.
                warn!("wallet reported empty account list; clearing session");
                clients.clear().await;
                store
                    .dispatch(Action::SetClients {
                        account: None,
                        chain_id: None,
                        has_signer: false,
                    })
                    .await;
            }
        },
        WalletNotification::ChainChanged(chain_id) => {
            debug!(chain_id, "wallet chain changed");
            store.dispatch(Action::SetChainId(Some(chain_id))).await;
        }
    }
}
