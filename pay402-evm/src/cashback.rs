//! Best-effort post-settlement rebates.
//!
//! Cashback is advisory: it runs only after a settlement has succeeded and
//! its failure never rolls back or re-flags that settlement. A failed
//! dispatch produces a [`CashbackRecord`] with a `null` transaction hash and
//! a logged reason.

use alloy_primitives::{Address, U256};
use pay402::proto::CashbackRecord;
use std::sync::Arc;

use crate::provider::SettlementProvider;

/// Basis points in one whole unit.
const BPS_DENOMINATOR: u64 = 10_000;

/// Configurable rebate policy.
///
/// The rebate is `rate_bps` basis points of the settled amount, paid in
/// `reward_asset` (the settled asset itself when unset). When the reward
/// asset differs from the settled one, the amount is rescaled across the two
/// tokens' on-chain decimals; no exchange-rate conversion is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashbackPolicy {
    /// Rebate rate in basis points of the settled amount (100 = 1%).
    pub rate_bps: u32,
    /// Reward token override; `None` pays back in the settled asset.
    pub reward_asset: Option<Address>,
}

impl CashbackPolicy {
    /// A policy paying `rate_bps` of the settled amount in the settled asset.
    #[must_use]
    pub const fn rate(rate_bps: u32) -> Self {
        Self {
            rate_bps,
            reward_asset: None,
        }
    }
}

/// Dispatches rebates from the facilitator's wallet.
pub struct CashbackEngine {
    provider: Arc<dyn SettlementProvider>,
    policy: CashbackPolicy,
}

impl std::fmt::Debug for CashbackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashbackEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CashbackEngine {
    /// Creates an engine over the given provider and policy.
    #[must_use]
    pub fn new(provider: Arc<dyn SettlementProvider>, policy: CashbackPolicy) -> Self {
        Self { provider, policy }
    }

    /// Computes and dispatches the rebate for one settled payment.
    ///
    /// Always returns a record; dispatch failures are captured in it rather
    /// than propagated. Holds no lock shared with verification or settlement.
    pub async fn dispatch(
        &self,
        settled_asset: Address,
        settled_amount: U256,
        beneficiary: Address,
    ) -> CashbackRecord {
        let record = |amount: U256, tx_hash: Option<String>, error: Option<String>| {
            CashbackRecord {
                beneficiary,
                amount: amount.to_string(),
                percent_bps: self.policy.rate_bps,
                tx_hash,
                error,
            }
        };

        let base = settled_amount * U256::from(self.policy.rate_bps) / U256::from(BPS_DENOMINATOR);
        let reward_asset = self.policy.reward_asset.unwrap_or(settled_asset);

        let amount = if reward_asset == settled_asset {
            base
        } else {
            match self.rescale(settled_asset, reward_asset, base).await {
                Ok(amount) => amount,
                Err(message) => {
                    tracing::warn!(
                        beneficiary = %beneficiary,
                        reward_asset = %reward_asset,
                        error = %message,
                        "cashback decimals lookup failed; skipping rebate"
                    );
                    return record(base, None, Some(message));
                }
            }
        };

        if amount.is_zero() {
            return record(amount, None, None);
        }

        match self
            .provider
            .submit_transfer(reward_asset, beneficiary, amount)
            .await
        {
            Ok(tx_hash) => {
                tracing::info!(
                    beneficiary = %beneficiary,
                    amount = %amount,
                    tx = %tx_hash,
                    "cashback dispatched"
                );
                record(amount, Some(tx_hash), None)
            }
            Err(e) => {
                tracing::warn!(
                    beneficiary = %beneficiary,
                    amount = %amount,
                    error = %e,
                    "cashback dispatch failed; settlement unaffected"
                );
                record(amount, None, Some(e.to_string()))
            }
        }
    }

    async fn rescale(&self, from: Address, to: Address, amount: U256) -> Result<U256, String> {
        let from_decimals = self
            .provider
            .decimals(from)
            .await
            .map_err(|e| e.to_string())?;
        let to_decimals = self.provider.decimals(to).await.map_err(|e| e.to_string())?;
        let rescaled = if to_decimals >= from_decimals {
            amount * U256::from(10u64).pow(U256::from(to_decimals - from_decimals))
        } else {
            amount / U256::from(10u64).pow(U256::from(from_decimals - to_decimals))
        };
        Ok(rescaled)
    }
}
