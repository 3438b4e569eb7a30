//! Protocol error taxonomy and machine-readable wire reason codes.
//!
//! Verification failures are structured verdicts, never unhandled faults:
//! each variant maps to a snake_case [`ErrorReason`] that travels in the
//! `invalidReason` / `errorReason` fields of the wire responses.

use serde::{Deserialize, Serialize};

/// Errors rejecting a price specification before any requirement is offered.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// The price specification contained no options.
    #[error("price specification must contain at least one option")]
    EmptyPriceSpec,
    /// An explicit amount was not a non-negative integer literal.
    #[error("invalid atomic amount {0:?}: must be a non-negative integer literal")]
    InvalidAtomicAmount(String),
    /// A currency string could not be parsed as a decimal money value.
    #[error("invalid money amount {0:?}")]
    InvalidMoneyAmount(String),
    /// Currency resolution needs a reference asset the network does not declare.
    #[error("no reference stable asset known for network {0:?}")]
    UnknownReferenceAsset(String),
}

/// Error returned by client-side selection when no offered requirement
/// survives the configured filters.
#[derive(Debug, thiserror::Error)]
#[error("no payment requirements match: {0}")]
pub struct NoMatchingRequirementsError(String);

impl NoMatchingRequirementsError {
    /// Creates a new selection error with the given detail.
    pub fn new<S: Into<String>>(detail: S) -> Self {
        Self(detail.into())
    }
}

/// Errors that can occur while verifying a payment payload against its
/// claimed requirements.
///
/// The verifier runs its checks in a fixed order and short-circuits on the
/// first failure, so exactly one of these is ever reported per attempt.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PaymentVerificationError {
    /// The payload was malformed or missing required fields.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// The payload's scheme or network does not match the requirements.
    #[error("payload scheme/network does not match the payment requirements")]
    RequirementMismatch,
    /// The authorized value does not equal the required amount exactly.
    #[error("authorization value does not equal the required amount")]
    AmountMismatch,
    /// The authorization recipient does not match the payee.
    #[error("authorization recipient does not match the payment requirements")]
    RecipientMismatch,
    /// The authorization's `validAfter` timestamp is still in the future.
    #[error("payment authorization is not yet valid")]
    NotYetValid,
    /// The authorization's `validBefore` timestamp has passed.
    #[error("payment authorization is expired")]
    Expired,
    /// Signature recovery failed or recovered a different signer.
    #[error("{0}")]
    InvalidSignature(String),
    /// The (signer, asset, network, nonce) combination was already consumed.
    #[error("authorization nonce has already been used")]
    ReplayedNonce,
    /// The replay ledger storage failed.
    #[error("replay ledger error: {0}")]
    ReplayLedger(String),
}

impl PaymentVerificationError {
    /// Returns the wire reason code for this error.
    #[must_use]
    pub const fn reason(&self) -> ErrorReason {
        match self {
            Self::InvalidFormat(_) => ErrorReason::InvalidFormat,
            Self::RequirementMismatch => ErrorReason::RequirementMismatch,
            Self::AmountMismatch => ErrorReason::AmountMismatch,
            Self::RecipientMismatch => ErrorReason::RecipientMismatch,
            Self::NotYetValid => ErrorReason::NotYetValid,
            Self::Expired => ErrorReason::Expired,
            Self::InvalidSignature(_) => ErrorReason::InvalidSignature,
            Self::ReplayedNonce => ErrorReason::ReplayedNonce,
            Self::ReplayLedger(_) => ErrorReason::UnexpectedError,
        }
    }
}

impl From<serde_json::Error> for PaymentVerificationError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidFormat(value.to_string())
    }
}

impl From<crate::replay::ReplayLedgerError> for PaymentVerificationError {
    fn from(value: crate::replay::ReplayLedgerError) -> Self {
        Self::ReplayLedger(value.to_string())
    }
}

/// Errors reported by settlement.
///
/// `Failed` means the authorization never took effect on-chain: the replay
/// reservation is released and the client may retry with a fresh nonce.
/// `Indeterminate` means no definitive on-chain answer arrived in time: the
/// reservation is retained, and the client must not retry blindly.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SettlementError {
    /// The ledger rejected the transfer (revert, insufficient balance,
    /// authorization already used on-chain).
    #[error("settlement failed: {0}")]
    Failed(String),
    /// No definitive on-chain answer within the settlement timeout.
    #[error("settlement outcome is indeterminate; transaction may still land")]
    Indeterminate,
}

/// Machine-readable reason codes used in wire error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorReason {
    /// The payload format is invalid.
    InvalidFormat,
    /// The payload scheme/network does not match the requirements.
    RequirementMismatch,
    /// The authorized amount is incorrect.
    AmountMismatch,
    /// The recipient address does not match.
    RecipientMismatch,
    /// The authorization is not yet valid.
    NotYetValid,
    /// The authorization has expired.
    Expired,
    /// The signature is invalid.
    InvalidSignature,
    /// The authorization nonce has already been used.
    ReplayedNonce,
    /// The payer's on-chain balance was insufficient at settlement.
    InsufficientFunds,
    /// Settlement failed and the reservation was released.
    SettlementFailed,
    /// Settlement outcome is unknown; the reservation is retained.
    SettlementIndeterminate,
    /// An unexpected internal error occurred.
    UnexpectedError,
}

impl ErrorReason {
    /// Returns the snake_case string matching the wire format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::RequirementMismatch => "requirement_mismatch",
            Self::AmountMismatch => "amount_mismatch",
            Self::RecipientMismatch => "recipient_mismatch",
            Self::NotYetValid => "not_yet_valid",
            Self::Expired => "expired",
            Self::InvalidSignature => "invalid_signature",
            Self::ReplayedNonce => "replayed_nonce",
            Self::InsufficientFunds => "insufficient_funds",
            Self::SettlementFailed => "settlement_failed",
            Self::SettlementIndeterminate => "settlement_indeterminate",
            Self::UnexpectedError => "unexpected_error",
        }
    }
}

impl core::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_snake_case_on_the_wire() {
        let json = serde_json::to_string(&ErrorReason::ReplayedNonce).unwrap();
        assert_eq!(json, "\"replayed_nonce\"");
        let back: ErrorReason = serde_json::from_str("\"amount_mismatch\"").unwrap();
        assert_eq!(back, ErrorReason::AmountMismatch);
    }

    #[test]
    fn every_verification_error_has_a_reason() {
        assert_eq!(
            PaymentVerificationError::Expired.reason().as_str(),
            "expired"
        );
        assert_eq!(
            PaymentVerificationError::NotYetValid.reason().as_str(),
            "not_yet_valid"
        );
        assert_eq!(
            PaymentVerificationError::ReplayedNonce.reason().as_str(),
            "replayed_nonce"
        );
    }
}
