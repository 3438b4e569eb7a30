//! On-chain submission boundary for settlement and cashback transfers.
//!
//! [`SettlementProvider`] is the only interface in this crate that talks to a
//! ledger. Settlement and cashback depend on the trait, not on a concrete
//! chain client, so they can be exercised against in-process fakes.

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::sol;
use url::Url;

use crate::types::{Eip3009Authorization, SignatureParts};

sol!(
    #[sol(rpc)]
    interface IEIP3009 {
        function transferWithAuthorization(
            address from,
            address to,
            uint256 value,
            uint256 validAfter,
            uint256 validBefore,
            bytes32 nonce,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
        function balanceOf(address account) external view returns (uint256);
    }

    #[sol(rpc)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
    }
);

/// Errors surfaced by a settlement provider.
///
/// The split matters for replay accounting: a [`Rejected`] transfer
/// definitively never took effect, while [`Unreachable`] leaves the outcome
/// unknown (the transaction may have been broadcast).
///
/// [`Rejected`]: ProviderError::Rejected
/// [`Unreachable`]: ProviderError::Unreachable
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The ledger definitively rejected the transfer (revert, insufficient
    /// balance, authorization already used on-chain).
    #[error("transfer rejected by the ledger: {0}")]
    Rejected(String),
    /// The ledger could not be reached or gave no definitive answer.
    #[error("ledger unreachable: {0}")]
    Unreachable(String),
}

/// Submits transfers to an underlying ledger and awaits one confirmation.
#[async_trait::async_trait]
pub trait SettlementProvider: Send + Sync {
    /// Submits an ERC-3009 `transferWithAuthorization` call on the asset
    /// contract and returns the transaction hash once included.
    async fn submit_transfer_with_authorization(
        &self,
        asset: Address,
        authorization: &Eip3009Authorization,
        signature: SignatureParts,
    ) -> Result<String, ProviderError>;

    /// Submits a plain ERC-20 `transfer` from the facilitator's own wallet
    /// and returns the transaction hash once included.
    async fn submit_transfer(
        &self,
        asset: Address,
        to: Address,
        amount: U256,
    ) -> Result<String, ProviderError>;

    /// Reads the decimal precision of a token contract.
    async fn decimals(&self, asset: Address) -> Result<u8, ProviderError>;
}

/// [`SettlementProvider`] backed by an HTTP JSON-RPC endpoint.
///
/// Transactions are signed with the facilitator's wallet and awaited to one
/// confirmation.
#[derive(Debug, Clone)]
pub struct HttpSettlementProvider {
    provider: DynProvider,
    signer_address: Address,
}

impl HttpSettlementProvider {
    /// Connects to the given RPC endpoint with the facilitator's signer.
    #[must_use]
    pub fn connect(rpc_url: Url, signer: PrivateKeySigner) -> Self {
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(rpc_url)
            .erased();
        Self {
            provider,
            signer_address,
        }
    }

    /// The facilitator wallet address transactions are sent from.
    #[must_use]
    pub const fn signer_address(&self) -> Address {
        self.signer_address
    }
}

/// Errors from `.send()` are definitive rejections (the node refused the
/// transaction, typically a simulated revert); errors while awaiting the
/// receipt are not.
#[async_trait::async_trait]
impl SettlementProvider for HttpSettlementProvider {
    async fn submit_transfer_with_authorization(
        &self,
        asset: Address,
        authorization: &Eip3009Authorization,
        signature: SignatureParts,
    ) -> Result<String, ProviderError> {
        let contract = IEIP3009::new(asset, &self.provider);
        let pending = contract
            .transferWithAuthorization(
                authorization.from,
                authorization.to,
                authorization.value.into(),
                U256::from(authorization.valid_after.as_secs()),
                U256::from(authorization.valid_before.as_secs()),
                authorization.nonce,
                signature.v,
                signature.r,
                signature.s,
            )
            .send()
            .await
            .map_err(|e| ProviderError::Rejected(e.to_string()))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        if receipt.status() {
            Ok(format!("{:#x}", receipt.transaction_hash))
        } else {
            Err(ProviderError::Rejected(format!(
                "transaction {:#x} reverted",
                receipt.transaction_hash
            )))
        }
    }

    async fn submit_transfer(
        &self,
        asset: Address,
        to: Address,
        amount: U256,
    ) -> Result<String, ProviderError> {
        let contract = IERC20::new(asset, &self.provider);
        let pending = contract
            .transfer(to, amount)
            .send()
            .await
            .map_err(|e| ProviderError::Rejected(e.to_string()))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;
        if receipt.status() {
            Ok(format!("{:#x}", receipt.transaction_hash))
        } else {
            Err(ProviderError::Rejected(format!(
                "transaction {:#x} reverted",
                receipt.transaction_hash
            )))
        }
    }

    async fn decimals(&self, asset: Address) -> Result<u8, ProviderError> {
        let contract = IERC20::new(asset, &self.provider);
        contract
            .decimals()
            .call()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))
    }
}
