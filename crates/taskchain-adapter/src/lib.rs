/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public taskchain adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod chain;
pub mod config;
pub mod error;
pub mod provider;
pub mod types;

// Re-export commonly used types from error
pub use error::{
    ChainError,
    Result,
    RpcFault,
    FALLBACK_ERROR_MESSAGE,
};

// Re-export commonly used types from chain
pub use chain::{
    ChainIdentity,
    identify,
};

// Re-export configuration helpers
pub use config::{
    contract_address,
    DEFAULT_CONTRACT_ADDRESS,
};

// Re-export all types
pub use types::*;

// Re-export provider traits and mocks
pub use provider::{
    EventSource,
    EventSubscription,
    MockLedger,
    MockWallet,
    ReadClient,
    WalletProvider,
    WriteClient,
};
