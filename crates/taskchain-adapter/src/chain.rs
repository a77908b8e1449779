/*
[INPUT]:  Numeric chain id and optional provider network descriptor name
[OUTPUT]: Human-readable chain label and block-explorer base URL
[POS]:    Chain identity resolver - pure lookup, no I/O
[UPDATE]: When supported networks or explorer endpoints change
*/

/// Human-facing identity of a chain: display label plus explorer base URL.
///
/// An empty `explorer_base` means "no link available"; callers must not
/// join paths onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainIdentity {
    pub label: String,
    pub explorer_base: String,
}

/// Resolve a chain id to its identity.
///
/// Unknown ids fall back to the provider-supplied descriptor name (or
/// `"Unknown"`) with an empty explorer base.
pub fn identify(chain_id: Option<u64>, descriptor_name: Option<&str>) -> ChainIdentity {
    let (label, explorer_base) = match chain_id {
        Some(1) => ("Ethereum", "https://etherscan.io"),
        Some(11155111) => ("Sepolia", "https://sepolia.etherscan.io"),
        Some(17000) => ("Holesky", "https://holesky.etherscan.io"),
        Some(4202) => ("Lisk Sepolia", "https://sepolia-blockscout.lisk.com"),
        _ => (descriptor_name.unwrap_or("Unknown"), ""),
    };
    ChainIdentity {
        label: label.to_string(),
        explorer_base: explorer_base.to_string(),
    }
}
