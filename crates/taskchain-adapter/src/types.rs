/*
[INPUT]:  Raw values from wallet and ledger providers
[OUTPUT]: Typed Rust structs for tasks, events, receipts, and identities
[POS]:    Data layer - type definitions shared across the workspace
[UPDATE]: When the contract surface or provider payload shapes change
*/

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{ChainError, Result, RpcFault};

/// A checked `0x`-prefixed 40-hex-character account or contract address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self> {
        if is_hex_address(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ChainError::Config(format!("invalid address: {raw}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 6 and last 4 characters, e.g. `0x5f4e…9E4b`
    pub fn truncated(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

fn is_hex_address(raw: &str) -> bool {
    raw.len() == 42
        && raw.starts_with("0x")
        && raw[2..].chars().all(|c| c.is_ascii_hexdigit())
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = ChainError;

    fn try_from(raw: String) -> Result<Self> {
        Address::parse(&raw)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// 32-byte transaction identifier, rendered as `0x`-prefixed hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn from_hex(raw: &str) -> Result<Self> {
        let stripped = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(stripped)
            .map_err(|e| ChainError::Decode(format!("invalid transaction hash: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ChainError::Decode("transaction hash must be 32 bytes".to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TxHash::from_hex(&raw).map_err(D::Error::custom)
    }
}

/// A single on-chain task as returned by `getTasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    pub completed: bool,
}

/// Settlement status carried by a transaction receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Failure,
}

/// Confirmation record returned once a write is included in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: ReceiptStatus,
    pub transaction_hash: TxHash,
}

/// State-changing contract calls the client can submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    CreateTask { description: String },
    UpdateTask { id: u64, description: String },
    CompleteTask { id: u64 },
    Mint { to: Address },
    Transfer { to: Address, amount: u128 },
}

impl ContractCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            ContractCall::CreateTask { .. } => "createTask",
            ContractCall::UpdateTask { .. } => "updateTask",
            ContractCall::CompleteTask { .. } => "completeTask",
            ContractCall::Mint { .. } => "mint",
            ContractCall::Transfer { .. } => "transfer",
        }
    }
}

/// Decoded event record as delivered by an event subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event_name: String,
    pub args: Value,
    pub transaction_hash: Option<TxHash>,
}

/// Task lifecycle events emitted by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Created { id: u64, description: String },
    Updated { id: u64, description: Option<String> },
    Completed { id: u64 },
}

impl TaskEvent {
    /// Decode a raw provider event record.
    ///
    /// Unknown event names and missing required fields are decode errors;
    /// callers are expected to warn and skip, never to tear down the
    /// subscription.
    pub fn decode(raw: &RawEvent) -> Result<Self> {
        let id = raw
            .args
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                ChainError::Decode(format!("{}: missing or invalid id", raw.event_name))
            })?;
        let description = raw
            .args
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        match raw.event_name.as_str() {
            "TaskCreated" => {
                let description = description.ok_or_else(|| {
                    ChainError::Decode("TaskCreated: missing description".to_string())
                })?;
                Ok(TaskEvent::Created { id, description })
            }
            "TaskUpdated" => Ok(TaskEvent::Updated { id, description }),
            "TaskCompleted" => Ok(TaskEvent::Completed { id }),
            other => Err(ChainError::Decode(format!("unknown event: {other}"))),
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            TaskEvent::Created { id, .. }
            | TaskEvent::Updated { id, .. }
            | TaskEvent::Completed { id } => *id,
        }
    }
}

/// Capability-probe result of a wallet permission revocation.
///
/// Revocation support varies by wallet; absence of support is a distinct
/// outcome, not a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,
    Unsupported,
    Failed(RpcFault),
}

/// Asynchronous wallet-level notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletNotification {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}
