/*
[INPUT]:  Externally supplied contract address (env var or explicit value)
[OUTPUT]: Checked contract address with a baked-in fallback
[POS]:    Configuration layer - single configurable value
[UPDATE]: When the fallback deployment or env var name changes
*/

use tracing::debug;

use crate::types::Address;

/// Fallback deployment used when no valid address is configured
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5f4e91138f7557227fD80c7417c3ecED2A4f9E4b";

/// Environment variable consulted by [`contract_address_from_env`]
pub const CONTRACT_ADDRESS_ENV: &str = "TASKCHAIN_CONTRACT_ADDRESS";

/// Resolve the target contract address.
///
/// The configured value is accepted only when it is a well-formed
/// `0x`-prefixed hex address; anything else silently falls back to
/// [`DEFAULT_CONTRACT_ADDRESS`].
pub fn contract_address(configured: Option<&str>) -> Address {
    if let Some(raw) = configured {
        match Address::parse(raw) {
            Ok(address) => return address,
            Err(_) => {
                debug!(configured = raw, "configured contract address malformed, using fallback");
            }
        }
    }
    fallback_address()
}

/// Resolve the contract address from the process environment
pub fn contract_address_from_env() -> Address {
    let configured = std::env::var(CONTRACT_ADDRESS_ENV).ok();
    contract_address(configured.as_deref())
}

fn fallback_address() -> Address {
    // The fallback constant is a known-good literal; parse cannot fail.
    Address::parse(DEFAULT_CONTRACT_ADDRESS)
        .unwrap_or_else(|_| unreachable!("fallback contract address is well-formed"))
}
