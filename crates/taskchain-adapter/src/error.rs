/*
[INPUT]:  Failure payloads from wallet and ledger providers
[OUTPUT]: Unified error type and user-facing message normalization
[POS]:    Error handling layer - shared by adapter and engine crates
[UPDATE]: When adding new failure sources or changing message precedence
*/

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed fallback when a provider failure carries no usable text
pub const FALLBACK_ERROR_MESSAGE: &str = "Unexpected error occurred";

/// Raw failure payload as reported by a wallet or RPC provider.
///
/// Providers disagree on where the human-readable text lives: some populate
/// a short summary field, some only a general message, some neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFault {
    pub short_message: Option<String>,
    pub message: Option<String>,
    pub code: Option<i64>,
}

impl RpcFault {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_short_message(short_message: impl Into<String>) -> Self {
        Self {
            short_message: Some(short_message.into()),
            ..Self::default()
        }
    }

    /// Normalize to a short human-readable message.
    ///
    /// Precedence: short summary field, then the general message field,
    /// then [`FALLBACK_ERROR_MESSAGE`]. Never fails.
    pub fn user_message(&self) -> String {
        if let Some(short) = &self.short_message {
            return short.clone();
        }
        if let Some(message) = &self.message {
            return message.clone();
        }
        FALLBACK_ERROR_MESSAGE.to_string()
    }
}

/// Main error type for taskchain operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    /// No wallet provider is injected; connect treats this as a silent no-op
    #[error("no wallet provider available")]
    NoWallet,

    /// The user declined the wallet request
    #[error("user rejected request: {}", .0.user_message())]
    UserRejected(RpcFault),

    /// Wallet or RPC provider failure
    #[error("provider error: {}", .0.user_message())]
    Provider(RpcFault),

    /// Write attempted without an authenticated account
    #[error("wallet not connected")]
    NotConnected,

    /// Receipt reported a failure status for an included transaction
    #[error("transaction failed on chain")]
    TransactionFailed,

    /// Event payload could not be decoded
    #[error("event decode failed: {0}")]
    Decode(String),

    /// Ledger read call failed
    #[error("read call failed: {}", .0.user_message())]
    Read(RpcFault),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

impl ChainError {
    /// User-facing message written to the store's error field.
    ///
    /// Fault-carrying variants go through the normalizer; the fixed-text
    /// variants keep the wording the view layer renders verbatim.
    pub fn user_message(&self) -> String {
        match self {
            ChainError::NoWallet => "No wallet detected".to_string(),
            ChainError::NotConnected => "Wallet not connected".to_string(),
            ChainError::TransactionFailed => "Transaction failed".to_string(),
            ChainError::UserRejected(fault)
            | ChainError::Provider(fault)
            | ChainError::Read(fault) => fault.user_message(),
            ChainError::Decode(message) | ChainError::Config(message) => message.clone(),
        }
    }
}

/// Result type alias for taskchain operations
pub type Result<T> = std::result::Result<T, ChainError>;
