/*
[INPUT]:  Scripted tasks, balances, faults, and event batches
[OUTPUT]: In-memory ledger and wallet implementing the provider traits
[POS]:    Provider layer - test doubles shared with the engine crate
[UPDATE]: When provider traits gain operations or scripting hooks are needed
*/

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use crate::error::{ChainError, Result, RpcFault};
use crate::provider::{EventSource, EventSubscription, ReadClient, WalletProvider, WriteClient};
use crate::types::{
    Address,
    ContractCall,
    RawEvent,
    Receipt,
    ReceiptStatus,
    RevokeOutcome,
    Task,
    TxHash,
    WalletNotification,
};

/// Fixed amount credited per `mint(to)` call
pub const MINT_AMOUNT: u128 = 1_000;

const EVENT_CHANNEL_CAPACITY: usize = 32;
const NOTIFICATION_CHANNEL_CAPACITY: usize = 16;

struct LedgerInner {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicU64,
    balances: Mutex<HashMap<Address, u128>>,
    read_fault: Mutex<Option<RpcFault>>,
    write_error: Mutex<Option<ChainError>>,
    receipt_failure: Mutex<bool>,
    read_delays: Mutex<VecDeque<Duration>>,
    read_calls: AtomicUsize,
    write_calls: AtomicUsize,
    past_events: Mutex<Vec<RawEvent>>,
    event_tx: Mutex<Option<mpsc::Sender<Vec<RawEvent>>>>,
    unsubscribe_count: AtomicUsize,
    next_hash: AtomicU64,
}

impl Default for LedgerInner {
    fn default() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            // Ledger-assigned ids start at 1.
            next_id: AtomicU64::new(1),
            balances: Mutex::new(HashMap::new()),
            read_fault: Mutex::new(None),
            write_error: Mutex::new(None),
            receipt_failure: Mutex::new(false),
            read_delays: Mutex::new(VecDeque::new()),
            read_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            past_events: Mutex::new(Vec::new()),
            event_tx: Mutex::new(None),
            unsubscribe_count: AtomicUsize::new(0),
            next_hash: AtomicU64::new(0),
        }
    }
}

/// Scriptable in-memory ledger implementing the read, write, and event
/// provider traits. Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct MockLedger {
    inner: Arc<LedgerInner>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the on-ledger task list wholesale
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        let next = tasks.iter().map(|t| t.id + 1).max().unwrap_or(1);
        self.inner.next_id.store(next, Ordering::SeqCst);
        *lock(&self.inner.tasks) = tasks;
    }

    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.inner.tasks).clone()
    }

    pub fn set_balance(&self, owner: Address, amount: u128) {
        lock(&self.inner.balances).insert(owner, amount);
    }

    /// Make every subsequent read call fail with `fault` until cleared
    pub fn fail_reads(&self, fault: RpcFault) {
        *lock(&self.inner.read_fault) = Some(fault);
    }

    pub fn clear_read_fault(&self) {
        *lock(&self.inner.read_fault) = None;
    }

    /// Make every subsequent write submission fail with `error` until cleared
    pub fn fail_writes(&self, error: ChainError) {
        *lock(&self.inner.write_error) = Some(error);
    }

    pub fn clear_write_error(&self) {
        *lock(&self.inner.write_error) = None;
    }

    /// Make receipts report on-chain failure instead of success
    pub fn set_receipt_failure(&self, failure: bool) {
        *lock(&self.inner.receipt_failure) = failure;
    }

    /// Queue per-call artificial read latencies, consumed in FIFO order
    pub fn push_read_delay(&self, delay: Duration) {
        lock(&self.inner.read_delays).push_back(delay);
    }

    pub fn read_calls(&self) -> usize {
        self.inner.read_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.inner.write_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.inner.unsubscribe_count.load(Ordering::SeqCst)
    }

    pub fn set_past_events(&self, events: Vec<RawEvent>) {
        *lock(&self.inner.past_events) = events;
    }

    /// Deliver a live event batch to the active subscriber, if any
    pub async fn push_events(&self, batch: Vec<RawEvent>) {
        let sender = lock(&self.inner.event_tx).clone();
        if let Some(sender) = sender {
            let _ = sender.send(batch).await;
        }
    }

    fn next_tx_hash(&self) -> TxHash {
        let serial = self.inner.next_hash.fetch_add(1, Ordering::SeqCst) + 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&serial.to_be_bytes());
        TxHash(bytes)
    }

    fn apply_call(&self, call: &ContractCall, account: &Address) {
        match call {
            ContractCall::CreateTask { description } => {
                let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
                lock(&self.inner.tasks).push(Task {
                    id,
                    description: description.clone(),
                    completed: false,
                });
            }
            ContractCall::UpdateTask { id, description } => {
                if let Some(task) = lock(&self.inner.tasks).iter_mut().find(|t| t.id == *id) {
                    task.description = description.clone();
                }
            }
            ContractCall::CompleteTask { id } => {
                if let Some(task) = lock(&self.inner.tasks).iter_mut().find(|t| t.id == *id) {
                    task.completed = true;
                }
            }
            ContractCall::Mint { to } => {
                *lock(&self.inner.balances).entry(to.clone()).or_insert(0) += MINT_AMOUNT;
            }
            ContractCall::Transfer { to, amount } => {
                let mut balances = lock(&self.inner.balances);
                let from = balances.entry(account.clone()).or_insert(0);
                *from = from.saturating_sub(*amount);
                *balances.entry(to.clone()).or_insert(0) += amount;
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // Mock state is never poisoned intentionally; recover the guard anyway.
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl ReadClient for MockLedger {
    async fn get_tasks(&self, _contract: &Address) -> Result<Vec<Task>> {
        self.inner.read_calls.fetch_add(1, Ordering::SeqCst);
        // Snapshot at call start so delayed reads return stale data,
        // matching a real node answering as of the call's block.
        let snapshot = lock(&self.inner.tasks).clone();
        let delay = lock(&self.inner.read_delays).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(fault) = lock(&self.inner.read_fault).clone() {
            return Err(ChainError::Read(fault));
        }
        Ok(snapshot)
    }

    async fn balance_of(&self, _contract: &Address, owner: &Address) -> Result<u128> {
        if let Some(fault) = lock(&self.inner.read_fault).clone() {
            return Err(ChainError::Read(fault));
        }
        Ok(lock(&self.inner.balances).get(owner).copied().unwrap_or(0))
    }
}

#[async_trait]
impl WriteClient for MockLedger {
    async fn write_contract(
        &self,
        _contract: &Address,
        call: &ContractCall,
        account: &Address,
    ) -> Result<TxHash> {
        self.inner.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.inner.write_error).clone() {
            return Err(error);
        }
        if !*lock(&self.inner.receipt_failure) {
            self.apply_call(call, account);
        }
        Ok(self.next_tx_hash())
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt> {
        let status = if *lock(&self.inner.receipt_failure) {
            ReceiptStatus::Failure
        } else {
            ReceiptStatus::Success
        };
        Ok(Receipt {
            status,
            transaction_hash: *hash,
        })
    }
}

#[async_trait]
impl EventSource for MockLedger {
    async fn subscribe(
        &self,
        _contract: &Address,
    ) -> Result<(EventSubscription, mpsc::Receiver<Vec<RawEvent>>)> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        *lock(&self.inner.event_tx) = Some(tx);

        let inner = Arc::clone(&self.inner);
        let subscription = EventSubscription::new(move || {
            *lock(&inner.event_tx) = None;
            inner.unsubscribe_count.fetch_add(1, Ordering::SeqCst);
        });
        Ok((subscription, rx))
    }

    async fn fetch_past(&self, _contract: &Address) -> Result<Vec<RawEvent>> {
        if let Some(fault) = lock(&self.inner.read_fault).clone() {
            return Err(ChainError::Read(fault));
        }
        Ok(lock(&self.inner.past_events).clone())
    }
}

struct WalletInner {
    accounts: Mutex<Vec<Address>>,
    chain_id: AtomicU64,
    request_error: Mutex<Option<ChainError>>,
    revoke_outcome: Mutex<RevokeOutcome>,
    notification_tx: Mutex<Option<mpsc::Sender<WalletNotification>>>,
}

/// Scriptable in-memory wallet provider. Cloning shares the underlying state.
#[derive(Clone)]
pub struct MockWallet {
    inner: Arc<WalletInner>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self {
            inner: Arc::new(WalletInner {
                accounts: Mutex::new(Vec::new()),
                chain_id: AtomicU64::new(1),
                request_error: Mutex::new(None),
                revoke_outcome: Mutex::new(RevokeOutcome::Revoked),
                notification_tx: Mutex::new(None),
            }),
        }
    }
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(account: Address, chain_id: u64) -> Self {
        let wallet = Self::new();
        wallet.set_accounts(vec![account]);
        wallet.set_chain_id(chain_id);
        wallet
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *lock(&self.inner.accounts) = accounts;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.inner.chain_id.store(chain_id, Ordering::SeqCst);
    }

    /// Make `request_accounts` fail with `error` until cleared with `None`
    pub fn set_request_error(&self, error: Option<ChainError>) {
        *lock(&self.inner.request_error) = error;
    }

    pub fn set_revoke_outcome(&self, outcome: RevokeOutcome) {
        *lock(&self.inner.revoke_outcome) = outcome;
    }

    /// Emit a wallet-level notification to the active subscriber, if any
    pub async fn notify(&self, notification: WalletNotification) {
        let sender = lock(&self.inner.notification_tx).clone();
        if let Some(sender) = sender {
            let _ = sender.send(notification).await;
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if let Some(error) = lock(&self.inner.request_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.inner.accounts).clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.inner.chain_id.load(Ordering::SeqCst))
    }

    async fn revoke_permissions(&self) -> Result<RevokeOutcome> {
        Ok(lock(&self.inner.revoke_outcome).clone())
    }

    async fn subscribe_notifications(&self) -> Result<mpsc::Receiver<WalletNotification>> {
        let (tx, rx) = mpsc::channel(NOTIFICATION_CHANNEL_CAPACITY);
        *lock(&self.inner.notification_tx) = Some(tx);
        Ok(rx)
    }
}

/// Build a `TaskCreated` raw event for tests and demos
pub fn created_event(id: u64, description: &str, hash: Option<TxHash>) -> RawEvent {
    RawEvent {
        event_name: "TaskCreated".to_string(),
        args: json!({ "id": id, "description": description }),
        transaction_hash: hash,
    }
}

/// Build a `TaskUpdated` raw event for tests and demos
pub fn updated_event(id: u64, description: Option<&str>, hash: Option<TxHash>) -> RawEvent {
    let args = match description {
        Some(description) => json!({ "id": id, "description": description }),
        None => json!({ "id": id }),
    };
    RawEvent {
        event_name: "TaskUpdated".to_string(),
        args,
        transaction_hash: hash,
    }
}

/// Build a `TaskCompleted` raw event for tests and demos
pub fn completed_event(id: u64, hash: Option<TxHash>) -> RawEvent {
    RawEvent {
        event_name: "TaskCompleted".to_string(),
        args: json!({ "id": id }),
        transaction_hash: hash,
    }
}
