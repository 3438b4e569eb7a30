//! Facilitator-side verification of signed payment payloads.
//!
//! Verification runs a fixed sequence of checks and short-circuits on the
//! first failure:
//!
//! 1. structural / requirement match (scheme, network, protocol version)
//! 2. amount equality (exact, no overpayment leniency)
//! 3. recipient match
//! 4. time window (`validAfter` inclusive, `validBefore` exclusive)
//! 5. signature recovery against the reconstructed typed data
//! 6. replay reservation (skipped in check-only mode)
//!
//! Checks 1-5 are read-only and idempotent. Check 6 consumes the nonce slot,
//! so a dry-run `POST /verify` uses [`VerifyMode::CheckOnly`] and only the
//! path that proceeds to settlement uses [`VerifyMode::Reserve`].

use alloy_primitives::{Address, Signature, U256};
use alloy_sol_types::eip712_domain;
use alloy_sol_types::SolStruct;
use pay402::error::PaymentVerificationError;
use pay402::networks;
use pay402::proto::{PaymentPayload, PaymentRequirements, X402_VERSION};
use pay402::replay::{ReplayKey, ReplayLedger, Reservation};
use pay402::timestamp::UnixTimestamp;
use std::sync::Arc;

use crate::types::{ExactPayload, TransferWithAuthorization};

/// Whether verification consumes the replay nonce slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Dry run: report whether the payload would pass, without reserving.
    CheckOnly,
    /// Atomically reserve the nonce slot; the caller proceeds to settlement.
    Reserve,
}

/// Verifies exact-scheme payment payloads against their claimed requirements.
pub struct Verifier {
    ledger: Arc<dyn ReplayLedger>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier").finish_non_exhaustive()
    }
}

/// Builds the replay ledger key for a payload on a given network.
#[must_use]
pub fn replay_key(payload: &ExactPayload, asset: Address, network: &str) -> ReplayKey {
    ReplayKey {
        signer: payload.authorization.from,
        asset,
        network: network.to_owned(),
        nonce: payload.authorization.nonce,
    }
}

impl Verifier {
    /// Creates a verifier over the given replay ledger.
    #[must_use]
    pub fn new(ledger: Arc<dyn ReplayLedger>) -> Self {
        Self { ledger }
    }

    /// Runs the verification pipeline and returns the recovered payer.
    ///
    /// # Errors
    ///
    /// Returns the [`PaymentVerificationError`] of the first failing check.
    pub async fn verify(
        &self,
        payload: &PaymentPayload<ExactPayload>,
        requirements: &PaymentRequirements,
        mode: VerifyMode,
    ) -> Result<Address, PaymentVerificationError> {
        check_structure(payload, requirements)?;
        let authorization = &payload.payload.authorization;
        check_amount(authorization.value.into(), requirements)?;
        if authorization.to != requirements.pay_to {
            return Err(PaymentVerificationError::RecipientMismatch);
        }
        check_time_window(
            UnixTimestamp::now(),
            authorization.valid_after,
            authorization.valid_before,
        )?;
        let payer = recover_payer(&payload.payload, requirements)?;

        let key = replay_key(&payload.payload, requirements.asset, &requirements.network);
        match mode {
            VerifyMode::CheckOnly => {
                if self.ledger.is_consumed(&key).await? {
                    return Err(PaymentVerificationError::ReplayedNonce);
                }
            }
            VerifyMode::Reserve => {
                if self.ledger.reserve(&key).await? == Reservation::AlreadyConsumed {
                    return Err(PaymentVerificationError::ReplayedNonce);
                }
            }
        }
        Ok(payer)
    }
}

fn check_structure(
    payload: &PaymentPayload<ExactPayload>,
    requirements: &PaymentRequirements,
) -> Result<(), PaymentVerificationError> {
    if payload.x402_version != X402_VERSION {
        return Err(PaymentVerificationError::InvalidFormat(format!(
            "unsupported protocol version {}",
            payload.x402_version
        )));
    }
    if payload.scheme != requirements.scheme || payload.network != requirements.network {
        return Err(PaymentVerificationError::RequirementMismatch);
    }
    Ok(())
}

fn check_amount(
    value: U256,
    requirements: &PaymentRequirements,
) -> Result<(), PaymentVerificationError> {
    let required = U256::from_str_radix(&requirements.max_amount_required, 10).map_err(|_| {
        PaymentVerificationError::InvalidFormat(format!(
            "required amount {:?} is not a decimal integer",
            requirements.max_amount_required
        ))
    })?;
    if value != required {
        return Err(PaymentVerificationError::AmountMismatch);
    }
    Ok(())
}

/// Checks `now` against the half-open validity window `[validAfter,
/// validBefore)`. No grace buffer on either bound.
fn check_time_window(
    now: UnixTimestamp,
    valid_after: UnixTimestamp,
    valid_before: UnixTimestamp,
) -> Result<(), PaymentVerificationError> {
    if now < valid_after {
        return Err(PaymentVerificationError::NotYetValid);
    }
    if now >= valid_before {
        return Err(PaymentVerificationError::Expired);
    }
    Ok(())
}

/// Rebuilds the typed data the client signed and recovers the signer.
fn recover_payer(
    payload: &ExactPayload,
    requirements: &PaymentRequirements,
) -> Result<Address, PaymentVerificationError> {
    let chain_id = networks::chain_id(&requirements.network).ok_or_else(|| {
        PaymentVerificationError::InvalidFormat(format!(
            "unknown network {:?}",
            requirements.network
        ))
    })?;
    let extra = requirements.extra.as_ref().ok_or_else(|| {
        PaymentVerificationError::InvalidFormat(
            "requirements carry no EIP-712 domain name/version".to_owned(),
        )
    })?;
    let domain = eip712_domain! {
        name: extra.name.clone(),
        version: extra.version.clone(),
        chain_id: chain_id,
        verifying_contract: requirements.asset,
    };
    let message = TransferWithAuthorization::from(&payload.authorization);
    let eip712_hash = message.eip712_signing_hash(&domain);

    let signature = Signature::from_raw(&payload.signature)
        .map_err(|e| PaymentVerificationError::InvalidSignature(e.to_string()))?;
    let recovered = signature
        .recover_address_from_prehash(&eip712_hash)
        .map_err(|e| PaymentVerificationError::InvalidSignature(e.to_string()))?;
    if recovered != payload.authorization.from {
        return Err(PaymentVerificationError::InvalidSignature(
            "recovered signer does not match the authorization sender".to_owned(),
        ));
    }
    Ok(recovered)
}
