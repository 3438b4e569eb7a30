//! Wire format types for pay402 protocol messages.
//!
//! All types serialize to JSON with camelCase field names. The protocol
//! version is carried in the `x402Version` field of payment payloads and 402
//! response bodies.
//!
//! # Key Types
//!
//! - [`PaymentRequirements`] - one acceptable way to pay for a resource
//! - [`PaymentRequired`] - HTTP 402 response body
//! - [`PaymentPayload`] - signed payment authorization from the buyer
//! - [`VerifyRequest`] / [`VerifyResponse`] - verification messages
//! - [`SettleRequest`] / [`SettleResponse`] - settlement messages
//! - [`SupportedResponse`] - facilitator capability advertisement

use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

use crate::error::ErrorReason;

/// The protocol version this crate speaks.
pub const X402_VERSION: u8 = 1;

/// The fixed tag identifying the exact-amount authorization scheme.
pub const EXACT_SCHEME: &str = "exact";

/// Payment terms set by the seller for one acceptable asset.
///
/// All requirements generated from a single price specification share
/// `scheme`, `network`, `pay_to`, and `resource`; only `asset` and
/// `max_amount_required` vary. List order is significant: the first entry is
/// the seller's preferred default.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g. "exact").
    pub scheme: String,
    /// The network name (e.g. "base-sepolia").
    pub network: String,
    /// The required amount in the asset's smallest unit, string-encoded to
    /// avoid precision loss.
    pub max_amount_required: String,
    /// The protected resource URL being paid for.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the resource.
    pub mime_type: String,
    /// The recipient (payee) address.
    pub pay_to: Address,
    /// Maximum client think-time in seconds before the offer lapses.
    pub max_timeout_seconds: u64,
    /// The token asset contract address.
    pub asset: Address,
    /// Scheme-specific extra metadata (asset display name and version).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<RequirementsExtra>,
}

/// EIP-712 domain parameters of the asset, carried so the facilitator can
/// reconstruct the signed typed-data structure without a chain read.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsExtra {
    /// Token name as used in the EIP-712 domain.
    pub name: String,
    /// Token version as used in the EIP-712 domain.
    pub version: String,
}

/// HTTP 402 Payment Required response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 1).
    pub x402_version: u8,
    /// Why payment is required (or what was wrong with a submitted payment).
    pub error: String,
    /// Acceptable payment methods, in seller preference order.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
}

impl PaymentRequired {
    /// Builds a 402 body from an error message and an offer list.
    #[must_use]
    pub fn new<S: Into<String>>(error: S, accepts: Vec<PaymentRequirements>) -> Self {
        Self {
            x402_version: X402_VERSION,
            error: error.into(),
            accepts,
        }
    }
}

/// A signed payment authorization from the buyer.
///
/// Produced once per payment attempt and consumed successfully at most once
/// by the facilitator. `TPayload` is the scheme-specific signed payload; the
/// default keeps it as raw JSON for routing before scheme dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload<TPayload = serde_json::Value> {
    /// Protocol version (always 1).
    pub x402_version: u8,
    /// The payment scheme (e.g. "exact").
    pub scheme: String,
    /// The network name the payment targets.
    pub network: String,
    /// The scheme-specific signed payload.
    pub payload: TPayload,
}

/// Request body for `POST /verify`: the payload and the requirements it
/// claims to satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest<TPayload = serde_json::Value> {
    /// The signed payment payload.
    pub payment_payload: PaymentPayload<TPayload>,
    /// The requirements the payload claims to satisfy.
    pub payment_requirements: PaymentRequirements,
}

/// Request body for `POST /settle`. Structurally identical to
/// [`VerifyRequest`] on the wire.
pub type SettleRequest<TPayload = serde_json::Value> = VerifyRequest<TPayload>;

/// Verdict returned by payment verification.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum VerifyResponse {
    /// The payload matches the requirements and passes all checks.
    Valid {
        /// The recovered payer address.
        payer: Address,
    },
    /// The payload was well-formed but failed a check.
    Invalid {
        /// Machine-readable reason verification failed.
        reason: ErrorReason,
        /// Human-readable description of the failure.
        message: String,
    },
}

impl VerifyResponse {
    /// Constructs a successful verdict.
    #[must_use]
    pub const fn valid(payer: Address) -> Self {
        Self::Valid { payer }
    }

    /// Constructs a failed verdict.
    #[must_use]
    pub fn invalid(reason: ErrorReason, message: impl Into<String>) -> Self {
        Self::Invalid {
            reason,
            message: message.into(),
        }
    }

    /// Returns `true` if verification succeeded.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponseWire {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid_reason: Option<ErrorReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid_message: Option<String>,
}

impl Serialize for VerifyResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            Self::Valid { payer } => VerifyResponseWire {
                is_valid: true,
                payer: Some(*payer),
                invalid_reason: None,
                invalid_message: None,
            },
            Self::Invalid { reason, message } => VerifyResponseWire {
                is_valid: false,
                payer: None,
                invalid_reason: Some(*reason),
                invalid_message: Some(message.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerifyResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = VerifyResponseWire::deserialize(deserializer)?;
        if wire.is_valid {
            let payer = wire
                .payer
                .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
            Ok(Self::Valid { payer })
        } else {
            let reason = wire
                .invalid_reason
                .ok_or_else(|| serde::de::Error::missing_field("invalidReason"))?;
            Ok(Self::Invalid {
                reason,
                message: wire.invalid_message.unwrap_or_default(),
            })
        }
    }
}

/// Outcome of submitting a verified authorization to the ledger.
///
/// An indeterminate outcome (timeout without a definitive on-chain answer)
/// reports `success = false` with [`ErrorReason::SettlementIndeterminate`];
/// it is distinct from a failure in that the replay reservation stays held.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    /// Whether the transfer took effect on-chain.
    pub success: bool,
    /// The on-chain transaction identifier, if one was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    /// The payer address recovered at verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
    /// The network settlement was attempted on.
    pub network: String,
    /// Failure reason, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<ErrorReason>,
    /// Human-readable failure detail, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Record of a best-effort post-settlement rebate.
///
/// Not part of the payment's consistency domain: a `tx_hash` of `None` with
/// a populated `error` means dispatch failed, and the settlement it followed
/// remains successful.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashbackRecord {
    /// The rebate recipient (the original payer).
    pub beneficiary: Address,
    /// Rebate amount in the reward asset's smallest unit.
    pub amount: String,
    /// Rebate rate applied, in basis points of the settled amount.
    pub percent_bps: u32,
    /// Transaction identifier of the rebate transfer, or `null` on failure.
    pub tx_hash: Option<String>,
    /// Dispatch failure detail, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for `POST /settle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Mirrors `settlement.success` for quick dispatch.
    pub success: bool,
    /// The detailed settlement outcome.
    pub settlement: SettlementResult,
    /// Rebate record, present only after a successful settlement with an
    /// active cashback policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cashback: Option<CashbackRecord>,
}

impl SettleResponse {
    /// Wraps a settlement result, without cashback.
    #[must_use]
    pub const fn from_settlement(settlement: SettlementResult) -> Self {
        Self {
            success: settlement.success,
            settlement,
            cashback: None,
        }
    }

    /// Attaches a cashback record to this response.
    #[must_use]
    pub fn with_cashback(mut self, cashback: CashbackRecord) -> Self {
        self.cashback = Some(cashback);
        self
    }
}

/// One payment method a facilitator can service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedPaymentKind {
    /// The protocol version.
    pub x402_version: u8,
    /// The payment scheme identifier.
    pub scheme: String,
    /// The network name.
    pub network: String,
    /// Scheme-specific extra data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// Response from a facilitator's `GET /supported` endpoint, derived from
/// which signing identities are configured per network.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedResponse {
    /// Supported payment kinds.
    pub kinds: Vec<SupportedPaymentKind>,
    /// Facilitator signer addresses keyed by network name.
    #[serde(default)]
    pub signers: HashMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: EXACT_SCHEME.to_owned(),
            network: "base-sepolia".to_owned(),
            max_amount_required: "10000".to_owned(),
            resource: "https://api.example.com/weather".to_owned(),
            description: "Weather data".to_owned(),
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
    fn requirements_use_camel_case_fields() {
        let json = serde_json::to_value(requirements()).unwrap();
        assert_eq!(json["maxAmountRequired"], "10000");
        assert_eq!(json["payTo"], "0x209693bc6afc0c5328ba36faf03c514ef312287c");
        assert_eq!(json["extra"]["name"], "USD Coin");
    }

    #[test]
    fn payment_required_carries_version_and_accepts() {
        let body = PaymentRequired::new("payment required", vec![requirements()]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["x402Version"], 1);
        assert_eq!(json["accepts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn verify_response_wire_shape() {
        let valid = VerifyResponse::valid(address!("209693Bc6afc0C5328bA36FaF03C514EF312287C"));
        let json = serde_json::to_value(&valid).unwrap();
        assert_eq!(json["isValid"], true);
        assert!(json.get("invalidReason").is_none());

        let invalid = VerifyResponse::invalid(ErrorReason::AmountMismatch, "value too low");
        let json = serde_json::to_value(&invalid).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["invalidReason"], "amount_mismatch");
    }

    #[test]
    fn verify_response_roundtrips() {
        let invalid = VerifyResponse::invalid(ErrorReason::Expired, "too late");
        let json = serde_json::to_string(&invalid).unwrap();
        let back: VerifyResponse = serde_json::from_str(&json).unwrap();
        assert!(!back.is_valid());
    }

    #[test]
    fn settle_response_omits_absent_cashback() {
        let settlement = SettlementResult {
            success: true,
            transaction: Some("0xabc".to_owned()),
            payer: Some(address!("209693Bc6afc0C5328bA36FaF03C514EF312287C")),
            network: "base-sepolia".to_owned(),
            error_reason: None,
            error_message: None,
        };
        let json = serde_json::to_value(SettleResponse::from_settlement(settlement)).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("cashback").is_none());
        assert!(json["settlement"].get("errorReason").is_none());
    }
}
