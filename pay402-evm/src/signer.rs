//! Client-side construction and signing of transfer authorizations.
//!
//! Signing is a local cryptographic operation except for the call into the
//! signing identity itself, which may suspend (hardware wallets, remote
//! approval flows). Cancelling a pending signature has no side effects; no
//! state is created until the signed payload is submitted.

use alloy_primitives::{Address, B256, FixedBytes, Signature, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolStruct, eip712_domain};
use pay402::networks;
use pay402::proto::{EXACT_SCHEME, PaymentPayload, PaymentRequirements, X402_VERSION};
use pay402::timestamp::UnixTimestamp;
use rand::RngExt;
use rand::rng;
use std::future::Future;
use std::sync::Arc;

use crate::types::{Eip3009Authorization, ExactPayload, TransferWithAuthorization};

/// Signing identity capable of producing typed-data signatures.
///
/// Alloy's `Signer` trait is not implemented for `Arc<T>`, so this local
/// abstraction lets callers share one identity across tasks.
pub trait TypedDataSigner: Send + Sync {
    /// Returns the signer's account address.
    fn address(&self) -> Address;

    /// Signs a 32-byte EIP-712 digest.
    fn sign_hash(
        &self,
        hash: &FixedBytes<32>,
    ) -> impl Future<Output = Result<Signature, alloy_signer::Error>> + Send;
}

impl TypedDataSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        Self::address(self)
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

impl<T: TypedDataSigner + Send + Sync> TypedDataSigner for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }
}

/// Errors producing a signed transfer authorization.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SigningError {
    /// The signing identity cannot produce typed-data signatures.
    #[error("signer does not support typed-data signing: {0}")]
    UnsupportedSigner(String),
    /// The target network is not in the known-network registry.
    #[error("unknown network {0:?}: cannot derive a chain id for signing")]
    UnknownNetwork(String),
    /// The requirements carry a non-integer amount.
    #[error("invalid amount in payment requirements: {0:?}")]
    InvalidAmount(String),
    /// The requirements are missing the asset's EIP-712 domain parameters.
    #[error("payment requirements carry no EIP-712 domain name/version for the asset")]
    MissingDomainParameters,
}

/// Produces a fresh 32-byte authorization nonce from the thread-local CSPRNG.
///
/// Nonces are never derived from counters or timestamps; predictability would
/// let an observer front-run or collide authorizations.
#[must_use]
pub fn generate_nonce() -> B256 {
    let nonce: [u8; 32] = rng().random();
    FixedBytes(nonce)
}

/// How far in the past `validAfter` is set, so a freshly signed authorization
/// is immediately valid despite clock skew between client and facilitator.
const VALID_AFTER_SKEW_SECS: u64 = 10 * 60;

/// Signs a transfer authorization satisfying `requirements`.
///
/// The validity window opens ten minutes in the past and closes
/// `max_timeout_seconds` from now. The EIP-712 domain is derived from the
/// requirements: chain id from the network name, verifying contract from the
/// asset address, name/version from the `extra` metadata.
///
/// # Errors
///
/// Returns [`SigningError`] if the network is unknown, the domain parameters
/// are missing, or the signing identity fails.
pub async fn sign_transfer_authorization<S: TypedDataSigner>(
    signer: &S,
    requirements: &PaymentRequirements,
) -> Result<ExactPayload, SigningError> {
    let chain_id = networks::chain_id(&requirements.network)
        .ok_or_else(|| SigningError::UnknownNetwork(requirements.network.clone()))?;
    let extra = requirements
        .extra
        .as_ref()
        .ok_or(SigningError::MissingDomainParameters)?;
    let value: U256 = U256::from_str_radix(&requirements.max_amount_required, 10)
        .map_err(|_| SigningError::InvalidAmount(requirements.max_amount_required.clone()))?;

    let domain = eip712_domain! {
        name: extra.name.clone(),
        version: extra.version.clone(),
        chain_id: chain_id,
        verifying_contract: requirements.asset,
    };

    let now = UnixTimestamp::now();
    let authorization = Eip3009Authorization {
        from: signer.address(),
        to: requirements.pay_to,
        value: value.into(),
        valid_after: now.saturating_sub(VALID_AFTER_SKEW_SECS),
        valid_before: now + requirements.max_timeout_seconds,
        nonce: generate_nonce(),
    };

    let message = TransferWithAuthorization::from(&authorization);
    let eip712_hash = message.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash(&eip712_hash)
        .await
        .map_err(|e| SigningError::UnsupportedSigner(format!("{e:?}")))?;

    Ok(ExactPayload {
        signature: signature.as_bytes().into(),
        authorization,
    })
}

/// Signs an authorization and wraps it in a protocol payment payload ready
/// for header encoding.
///
/// # Errors
///
/// Propagates any [`SigningError`] from signing.
pub async fn build_payment_payload<S: TypedDataSigner>(
    signer: &S,
    requirements: &PaymentRequirements,
) -> Result<PaymentPayload<ExactPayload>, SigningError> {
    let payload = sign_transfer_authorization(signer, requirements).await?;
    Ok(PaymentPayload {
        x402_version: X402_VERSION,
        scheme: EXACT_SCHEME.to_owned(),
        network: requirements.network.clone(),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignatureParts;
    use alloy_primitives::address;
    use pay402::proto::RequirementsExtra;

    fn requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: EXACT_SCHEME.to_owned(),
            network: "base-sepolia".to_owned(),
            max_amount_required: "10000".to_owned(),
            resource: "https://api.example.com/weather".to_owned(),
            description: String::new(),
            mime_type: "application/json".to_owned(),
            pay_to: address!("209693Bc6afc0C5328bA36FaF03C514EF312287C"),
            max_timeout_seconds: 60,
            asset: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            extra: Some(RequirementsExtra {
                name: "USD Coin".to_owned(),
                version: "2".to_owned(),
            }),
        }
    }

    #[test]
    fn nonces_are_unique_per_call() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn signed_payload_matches_requirements() {
        let signer = PrivateKeySigner::random();
        let requirements = requirements();
        let payload = sign_transfer_authorization(&signer, &requirements)
            .await
            .unwrap();
        assert_eq!(payload.authorization.from, signer.address());
        assert_eq!(payload.authorization.to, requirements.pay_to);
        assert_eq!(payload.authorization.value.0, U256::from(10_000u64));
        assert!(payload.authorization.valid_after < payload.authorization.valid_before);
        assert_eq!(payload.signature.len(), 65);
    }

    #[tokio::test]
    async fn signature_decomposes_with_normalized_v() {
        let signer = PrivateKeySigner::random();
        let payload = sign_transfer_authorization(&signer, &requirements())
            .await
            .unwrap();
        let signature = Signature::from_raw(&payload.signature).unwrap();
        let parts = SignatureParts::from(&signature);
        assert!(parts.v == 27 || parts.v == 28);
        assert_eq!(parts.r, B256::from(signature.r()));
    }

    #[tokio::test]
    async fn unknown_network_is_rejected() {
        let signer = PrivateKeySigner::random();
        let mut requirements = requirements();
        requirements.network = "testnet-of-nowhere".to_owned();
        assert!(matches!(
            sign_transfer_authorization(&signer, &requirements).await,
            Err(SigningError::UnknownNetwork(_))
        ));
    }

    #[tokio::test]
    async fn missing_domain_parameters_are_rejected() {
        let signer = PrivateKeySigner::random();
        let mut requirements = requirements();
        requirements.extra = None;
        assert!(matches!(
            sign_transfer_authorization(&signer, &requirements).await,
            Err(SigningError::MissingDomainParameters)
        ));
    }
}
