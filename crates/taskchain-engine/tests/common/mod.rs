/*
[INPUT]:  Test configuration and mock provider requirements
[OUTPUT]: Shared test harness, fixtures, and scheduling helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for taskchain-engine tests
#![allow(dead_code)]

use std::sync::Arc;

use taskchain_adapter::{Address, MockLedger, MockWallet, Task};
use taskchain_engine::TaskchainApp;

pub const TEST_CHAIN_ID: u64 = 1;

pub struct Harness {
    pub app: TaskchainApp,
    pub ledger: MockLedger,
    pub wallet: MockWallet,
}

pub fn account() -> Address {
    Address::parse("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
}

#[allow(dead_code)]
pub fn other_account() -> Address {
    Address::parse("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap()
}

#[allow(dead_code)]
pub fn task(id: u64, description: &str) -> Task {
    Task {
        id,
        description: description.to_string(),
        completed: false,
    }
}

/// App wired against shared mock providers, with tracing initialized
pub fn harness() -> Harness {
    init_tracing();
    let ledger = MockLedger::new();
    let wallet = MockWallet::with_account(account(), TEST_CHAIN_ID);
    let app = TaskchainApp::new(
        None,
        Arc::new(wallet.clone()),
        Arc::new(ledger.clone()),
        Arc::new(ledger.clone()),
        Arc::new(ledger.clone()),
    );
    Harness {
        app,
        ledger,
        wallet,
    }
}

/// Let spawned engine tasks run without advancing the paused clock
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
