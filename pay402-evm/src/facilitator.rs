//! Facilitator glue for the EVM exact scheme.
//!
//! [`ExactEvmFacilitator`] composes the verifier, settler, and optional
//! cashback engine into the two operations a facilitator HTTP boundary
//! exposes: a dry-run verification and a verify-and-settle.

use alloy_primitives::Address;
use pay402::proto::{
    EXACT_SCHEME, SettleRequest, SettleResponse, SettlementResult, SupportedPaymentKind,
    SupportedResponse, VerifyRequest, VerifyResponse, X402_VERSION,
};
use pay402::replay::ReplayLedger;
use std::sync::Arc;
use std::time::Duration;

use crate::cashback::{CashbackEngine, CashbackPolicy};
use crate::provider::SettlementProvider;
use crate::settle::Settler;
use crate::types::ExactPayload;
use crate::verify::{Verifier, VerifyMode};

/// Verify-and-settle engine for exact-scheme payments on EVM networks.
pub struct ExactEvmFacilitator {
    verifier: Verifier,
    settler: Settler,
    cashback: Option<CashbackEngine>,
}

impl std::fmt::Debug for ExactEvmFacilitator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactEvmFacilitator")
            .field("cashback", &self.cashback.is_some())
            .finish_non_exhaustive()
    }
}

impl ExactEvmFacilitator {
    /// Creates a facilitator over the given provider and replay ledger.
    #[must_use]
    pub fn new(provider: Arc<dyn SettlementProvider>, ledger: Arc<dyn ReplayLedger>) -> Self {
        Self {
            verifier: Verifier::new(Arc::clone(&ledger)),
            settler: Settler::new(provider, ledger),
            cashback: None,
        }
    }

    /// Enables post-settlement rebates under the given policy.
    #[must_use]
    pub fn with_cashback(mut self, provider: Arc<dyn SettlementProvider>, policy: CashbackPolicy) -> Self {
        self.cashback = Some(CashbackEngine::new(provider, policy));
        self
    }

    /// Overrides the settlement timeout.
    #[must_use]
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settler = self.settler.with_timeout(timeout);
        self
    }

    /// Dry-run verification: reports whether the payload would settle,
    /// without consuming its nonce slot.
    pub async fn verify(&self, request: &VerifyRequest<ExactPayload>) -> VerifyResponse {
        match self
            .verifier
            .verify(
                &request.payment_payload,
                &request.payment_requirements,
                VerifyMode::CheckOnly,
            )
            .await
        {
            Ok(payer) => VerifyResponse::valid(payer),
            Err(e) => {
                tracing::debug!(reason = %e.reason(), error = %e, "verification failed");
                VerifyResponse::invalid(e.reason(), e.to_string())
            }
        }
    }

    /// Verifies with a replay reservation, settles on-chain, and dispatches
    /// cashback after a successful settlement.
    pub async fn settle(&self, request: &SettleRequest<ExactPayload>) -> SettleResponse {
        let payload = &request.payment_payload;
        let requirements = &request.payment_requirements;

        let payer = match self
            .verifier
            .verify(payload, requirements, VerifyMode::Reserve)
            .await
        {
            Ok(payer) => payer,
            Err(e) => {
                tracing::debug!(reason = %e.reason(), error = %e, "settlement refused at verification");
                return SettleResponse::from_settlement(SettlementResult {
                    success: false,
                    transaction: None,
                    payer: None,
                    network: requirements.network.clone(),
                    error_reason: Some(e.reason()),
                    error_message: Some(e.to_string()),
                });
            }
        };

        let settlement = self.settler.settle(payload, requirements, payer).await;
        let mut response = SettleResponse::from_settlement(settlement);

        if response.success
            && let Some(cashback) = &self.cashback
        {
            let record = cashback
                .dispatch(
                    requirements.asset,
                    payload.payload.authorization.value.into(),
                    payer,
                )
                .await;
            response = response.with_cashback(record);
        }
        response
    }
}

/// Builds the `/supported` advertisement from the networks a facilitator has
/// signing identities for.
#[must_use]
pub fn supported_kinds(signers: &[(String, Address)]) -> SupportedResponse {
    let mut response = SupportedResponse::default();
    for (network, signer) in signers {
        response.kinds.push(SupportedPaymentKind {
            x402_version: X402_VERSION,
            scheme: EXACT_SCHEME.to_owned(),
            network: network.clone(),
            extra: None,
        });
        response
            .signers
            .entry(network.clone())
            .or_default()
            .push(format!("{signer:#x}"));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn supported_kinds_lists_one_kind_per_network() {
        let signer = address!("209693Bc6afc0C5328bA36FaF03C514EF312287C");
        let response = supported_kinds(&[
            ("base-sepolia".to_owned(), signer),
            ("polygon".to_owned(), signer),
        ]);
        assert_eq!(response.kinds.len(), 2);
        assert_eq!(response.kinds[0].scheme, "exact");
        assert_eq!(response.kinds[0].x402_version, 1);
        assert_eq!(response.signers["polygon"].len(), 1);
    }
}
