//! Known network configurations and reference stable asset deployments.
//!
//! Currency-denominated prices (e.g. `"$0.01"`) resolve against the network's
//! reference stable asset, and the default client-side selection policy
//! prefers it. USDC is the reference asset on every network listed here.

use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// Canonical description of a fungible asset accepted for payment.
///
/// The `name` and `version` fields are the token's EIP-712 domain parameters,
/// required to reconstruct the typed-data structure a client signed.
/// A descriptor is immutable once referenced by a payment requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    /// Token contract address.
    pub address: Address,
    /// Decimal precision of the token (e.g. 6 for USDC).
    pub decimals: u8,
    /// EIP-712 domain name (e.g. "USD Coin").
    pub name: String,
    /// EIP-712 domain version (e.g. "2").
    pub version: String,
}

/// A known network with its chain ID and reference stable asset deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name used on the wire (e.g. "base-sepolia").
    pub name: &'static str,
    /// EIP-155 chain ID.
    pub chain_id: u64,
    /// Reference stable asset contract address on this network.
    pub stable_address: Address,
    /// Decimal precision of the reference stable asset.
    pub stable_decimals: u8,
}

/// Default EIP-712 domain name for USDC deployments.
pub const USDC_NAME: &str = "USD Coin";

/// Default EIP-712 domain version for USDC deployments.
pub const USDC_VERSION: &str = "2";

/// Networks this crate ships deployment data for.
pub const KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base",
        chain_id: 8453,
        stable_address: address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        stable_decimals: 6,
    },
    NetworkInfo {
        name: "base-sepolia",
        chain_id: 84532,
        stable_address: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
        stable_decimals: 6,
    },
    NetworkInfo {
        name: "ethereum",
        chain_id: 1,
        stable_address: address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        stable_decimals: 6,
    },
    NetworkInfo {
        name: "polygon",
        chain_id: 137,
        stable_address: address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
        stable_decimals: 6,
    },
    NetworkInfo {
        name: "polygon-amoy",
        chain_id: 80002,
        stable_address: address!("41E94Eb71Ef8C9fAE0235d1e472b21E21B5a4dbF"),
        stable_decimals: 6,
    },
    NetworkInfo {
        name: "avalanche",
        chain_id: 43114,
        stable_address: address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
        stable_decimals: 6,
    },
    NetworkInfo {
        name: "avalanche-fuji",
        chain_id: 43113,
        stable_address: address!("5425890298aed601595a70AB815c96711a31Bc65"),
        stable_decimals: 6,
    },
];

/// Looks up a known network by its wire name.
#[must_use]
pub fn by_name(name: &str) -> Option<&'static NetworkInfo> {
    KNOWN_NETWORKS.iter().find(|n| n.name == name)
}

/// Returns the EIP-155 chain ID for a known network name.
#[must_use]
pub fn chain_id(name: &str) -> Option<u64> {
    by_name(name).map(|n| n.chain_id)
}

/// Returns the reference stable asset descriptor for a known network.
#[must_use]
pub fn reference_asset(network: &str) -> Option<AssetDescriptor> {
    by_name(network).map(|n| AssetDescriptor {
        address: n.stable_address,
        decimals: n.stable_decimals,
        name: USDC_NAME.to_owned(),
        version: USDC_VERSION.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_sepolia_is_known() {
        let net = by_name("base-sepolia").unwrap();
        assert_eq!(net.chain_id, 84532);
        assert_eq!(net.stable_decimals, 6);
    }

    #[test]
    fn unknown_network_is_none() {
        assert!(by_name("testnet-of-nowhere").is_none());
        assert!(reference_asset("testnet-of-nowhere").is_none());
    }

    #[test]
    fn reference_asset_carries_domain_params() {
        let asset = reference_asset("base").unwrap();
        assert_eq!(asset.name, "USD Coin");
        assert_eq!(asset.version, "2");
        assert_eq!(asset.decimals, 6);
    }
}
