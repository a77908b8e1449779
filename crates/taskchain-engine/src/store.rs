/*
[INPUT]:  Named transitions issued by the connection, sync, watcher, and writer
[OUTPUT]: Process-wide application state snapshot for the view layer
[POS]:    State store - single shared mutable state, reducer-only mutation
[UPDATE]: When the state shape or the transition set changes
*/

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use taskchain_adapter::{Address, Task, TxHash};

/// Capacity of the user-visible notice ring buffer
pub const NOTICE_CAPACITY: usize = 5;

/// Capacity of the durable activity-log ring buffer
pub const LOG_CAPACITY: usize = 25;

/// Transient user-visible notice (presentation-layer expiry is a UI concern)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeEntry {
    pub text: String,
}

/// Durable activity-log line, optionally linking a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub text: String,
    pub hash: Option<TxHash>,
}

/// Full application state as exposed to the view layer.
///
/// `generation` increments whenever the connection identity is replaced;
/// in-flight reads stamped with an older generation discard their results.
#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub has_signer: bool,
    pub contract_address: Address,
    pub tasks: Vec<Task>,
    pub is_loading: bool,
    pub tx_pending: bool,
    pub notices: VecDeque<NoticeEntry>,
    pub logs: VecDeque<LogEntry>,
    pub error: String,
    pub generation: u64,
}

impl AppState {
    fn new(contract_address: Address) -> Self {
        Self {
            account: None,
            chain_id: None,
            has_signer: false,
            contract_address,
            tasks: Vec::new(),
            is_loading: false,
            tx_pending: false,
            notices: VecDeque::new(),
            logs: VecDeque::new(),
            error: String::new(),
            generation: 0,
        }
    }
}

/// Closed set of state transitions; the only way state is mutated
#[derive(Debug, Clone)]
pub enum Action {
    SetClients {
        account: Option<Address>,
        chain_id: Option<u64>,
        has_signer: bool,
    },
    SetAccount(Option<Address>),
    SetChainId(Option<u64>),
    SetTasks(Vec<Task>),
    SetLoading(bool),
    SetTxPending(bool),
    Notice(String),
    Log { text: String, hash: Option<TxHash> },
    Error(String),
    ClearError,
}

fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::SetClients {
            account,
            chain_id,
            has_signer,
        } => {
            state.account = account;
            state.chain_id = chain_id;
            state.has_signer = has_signer;
            state.generation += 1;
        }
        Action::SetAccount(account) => {
            state.account = account;
        }
        Action::SetChainId(chain_id) => {
            state.chain_id = chain_id;
        }
        Action::SetTasks(tasks) => {
            state.tasks = tasks;
        }
        Action::SetLoading(is_loading) => {
            state.is_loading = is_loading;
        }
        Action::SetTxPending(tx_pending) => {
            state.tx_pending = tx_pending;
        }
        Action::Notice(text) => {
            state.notices.push_front(NoticeEntry { text });
            state.notices.truncate(NOTICE_CAPACITY);
        }
        Action::Log { text, hash } => {
            state.logs.push_front(LogEntry { text, hash });
            state.logs.truncate(LOG_CAPACITY);
        }
        Action::Error(error) => {
            state.error = error;
        }
        Action::ClearError => {
            state.error.clear();
        }
    }
}

/// Shared handle to the application state.
///
/// Transitions are applied atomically in issue order under a single lock;
/// direct field writes are impossible from outside this module.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<AppState>>,
}

impl Store {
    pub fn new(contract_address: Address) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppState::new(contract_address))),
        }
    }

    pub async fn dispatch(&self, action: Action) {
        let mut state = self.inner.lock().await;
        reduce(&mut state, action);
    }

    pub async fn snapshot(&self) -> AppState {
        self.inner.lock().await.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.inner.lock().await.generation
    }
}
