//! Settlement of verified payment payloads.
//!
//! A verified payload holds a replay-ledger reservation made by the verifier.
//! The settler submits the authorization on-chain and resolves that
//! reservation according to the outcome:
//!
//! - **success** - the reservation stands; the nonce is spent.
//! - **definitive failure** (revert, insufficient balance) - the reservation
//!   is released so the client may retry with a fresh nonce; a failed
//!   settlement must not permanently consume a nonce slot.
//! - **indeterminate** (timeout, no definitive answer) - the reservation is
//!   retained: the transaction may still land, and releasing it would open a
//!   double-settlement window.

use alloy_primitives::{Address, Signature};
use pay402::error::ErrorReason;
use pay402::proto::{PaymentPayload, PaymentRequirements, SettlementResult};
use pay402::replay::ReplayLedger;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::{ProviderError, SettlementProvider};
use crate::types::{ExactPayload, SignatureParts};
use crate::verify::replay_key;

/// Default bound on one settlement round trip.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Submits verified authorizations on-chain.
pub struct Settler {
    provider: Arc<dyn SettlementProvider>,
    ledger: Arc<dyn ReplayLedger>,
    timeout: Duration,
}

impl std::fmt::Debug for Settler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settler")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Settler {
    /// Creates a settler with the default timeout.
    #[must_use]
    pub fn new(provider: Arc<dyn SettlementProvider>, ledger: Arc<dyn ReplayLedger>) -> Self {
        Self {
            provider,
            ledger,
            timeout: DEFAULT_SETTLE_TIMEOUT,
        }
    }

    /// Overrides the settlement timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Settles a verified, ledger-reserved payload.
    ///
    /// Never returns an error: every outcome, including indeterminate ones,
    /// is encoded in the [`SettlementResult`].
    pub async fn settle(
        &self,
        payload: &PaymentPayload<ExactPayload>,
        requirements: &PaymentRequirements,
        payer: Address,
    ) -> SettlementResult {
        let exact = &payload.payload;
        let key = replay_key(exact, requirements.asset, &requirements.network);

        let signature = match Signature::from_raw(&exact.signature) {
            Ok(signature) => signature,
            Err(e) => {
                // Verification accepted this payload, so a malformed
                // signature here indicates caller misuse; the authorization
                // never reached the chain and the slot can be freed.
                self.release_quietly(&key).await;
                return self.failed(
                    requirements,
                    payer,
                    ErrorReason::InvalidSignature,
                    e.to_string(),
                );
            }
        };
        let parts = SignatureParts::from(&signature);

        let submit = self.provider.submit_transfer_with_authorization(
            requirements.asset,
            &exact.authorization,
            parts,
        );
        match tokio::time::timeout(self.timeout, submit).await {
            Ok(Ok(tx_hash)) => {
                tracing::info!(
                    tx = %tx_hash,
                    payer = %payer,
                    network = %requirements.network,
                    "settlement confirmed"
                );
                SettlementResult {
                    success: true,
                    transaction: Some(tx_hash),
                    payer: Some(payer),
                    network: requirements.network.clone(),
                    error_reason: None,
                    error_message: None,
                }
            }
            Ok(Err(ProviderError::Rejected(message))) => {
                tracing::warn!(
                    payer = %payer,
                    network = %requirements.network,
                    error = %message,
                    "settlement rejected; releasing nonce reservation"
                );
                self.release_quietly(&key).await;
                let reason = if message.to_ascii_lowercase().contains("insufficient") {
                    ErrorReason::InsufficientFunds
                } else {
                    ErrorReason::SettlementFailed
                };
                self.failed(requirements, payer, reason, message)
            }
            Ok(Err(ProviderError::Unreachable(message))) => {
                // No definitive answer: the transaction may have been
                // broadcast. The reservation is retained.
                tracing::warn!(
                    payer = %payer,
                    network = %requirements.network,
                    error = %message,
                    "settlement outcome indeterminate; retaining nonce reservation"
                );
                self.indeterminate(requirements, payer, message)
            }
            Err(_) => {
                tracing::warn!(
                    payer = %payer,
                    network = %requirements.network,
                    timeout_secs = self.timeout.as_secs(),
                    "settlement timed out; retaining nonce reservation"
                );
                self.indeterminate(
                    requirements,
                    payer,
                    format!("no confirmation within {}s", self.timeout.as_secs()),
                )
            }
        }
    }

    async fn release_quietly(&self, key: &pay402::replay::ReplayKey) {
        if let Err(e) = self.ledger.release(key).await {
            tracing::error!(error = %e, "failed to release replay reservation");
        }
    }

    fn failed(
        &self,
        requirements: &PaymentRequirements,
        payer: Address,
        reason: ErrorReason,
        message: String,
    ) -> SettlementResult {
        SettlementResult {
            success: false,
            transaction: None,
            payer: Some(payer),
            network: requirements.network.clone(),
            error_reason: Some(reason),
            error_message: Some(message),
        }
    }

    fn indeterminate(
        &self,
        requirements: &PaymentRequirements,
        payer: Address,
        message: String,
    ) -> SettlementResult {
        SettlementResult {
            success: false,
            transaction: None,
            payer: Some(payer),
            network: requirements.network.clone(),
            error_reason: Some(ErrorReason::SettlementIndeterminate),
            error_message: Some(message),
        }
    }
}
